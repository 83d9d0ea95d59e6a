use vantage_level::{BlockPalette, SECTION_SIZE};
use vantage_section::SectionBuf;

/// One of the six axis-aligned section faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Face {
    NegX = 0,
    PosX = 1,
    NegY = 2,
    PosY = 3,
    NegZ = 4,
    PosZ = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::NegX,
        Face::PosX,
        Face::NegY,
        Face::PosY,
        Face::NegZ,
        Face::PosZ,
    ];

    #[inline]
    pub fn opposite(self) -> Face {
        match self {
            Face::NegX => Face::PosX,
            Face::PosX => Face::NegX,
            Face::NegY => Face::PosY,
            Face::PosY => Face::NegY,
            Face::NegZ => Face::PosZ,
            Face::PosZ => Face::NegZ,
        }
    }

    #[inline]
    pub fn offset(self) -> (i32, i32, i32) {
        match self {
            Face::NegX => (-1, 0, 0),
            Face::PosX => (1, 0, 0),
            Face::NegY => (0, -1, 0),
            Face::PosY => (0, 1, 0),
            Face::NegZ => (0, 0, -1),
            Face::PosZ => (0, 0, 1),
        }
    }

    /// Face crossed when stepping by one section in the given direction.
    #[inline]
    pub fn from_step(dx: i32, dy: i32, dz: i32) -> Option<Face> {
        match (dx, dy, dz) {
            (-1, 0, 0) => Some(Face::NegX),
            (1, 0, 0) => Some(Face::PosX),
            (0, -1, 0) => Some(Face::NegY),
            (0, 1, 0) => Some(Face::PosY),
            (0, 0, -1) => Some(Face::NegZ),
            (0, 0, 1) => Some(Face::PosZ),
            _ => None,
        }
    }
}

/// Symmetric 6×6 face reachability matrix packed into a u64. Bit `a*6+b`
/// means light can enter through face `a` and leave through face `b`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisibilitySet(u64);

impl VisibilitySet {
    pub const fn closed() -> Self {
        Self(0)
    }

    pub fn fully_open() -> Self {
        let mut v = Self(0);
        for a in Face::ALL {
            for b in Face::ALL {
                v.connect(a, b);
            }
        }
        v
    }

    #[inline]
    pub fn connect(&mut self, a: Face, b: Face) {
        self.0 |= 1u64 << (a as u64 * 6 + b as u64);
        self.0 |= 1u64 << (b as u64 * 6 + a as u64);
    }

    #[inline]
    pub fn visible_between(self, a: Face, b: Face) -> bool {
        self.0 & (1u64 << (a as u64 * 6 + b as u64)) != 0
    }

    #[inline]
    pub fn is_closed(self) -> bool {
        self.0 == 0
    }

    /// True when every connection in `other` is also present here.
    #[inline]
    pub fn is_superset_of(self, other: VisibilitySet) -> bool {
        self.0 & other.0 == other.0
    }
}

const N: usize = SECTION_SIZE;
const VOL: usize = N * N * N;

#[inline]
fn cell(x: usize, y: usize, z: usize) -> usize {
    (y * N + z) * N + x
}

/// Flood fill the non-opaque cells of a section and record which pairs of
/// faces each connected component touches. This is the "edge not fully
/// occluded" test the occlusion graph consults between neighbors.
pub fn compute_visibility(buf: &SectionBuf, palette: &BlockPalette) -> VisibilitySet {
    let mut passable = [false; VOL];
    let mut any_passable = false;
    for (i, b) in buf.blocks.iter().enumerate() {
        let p = !palette.is_opaque(*b);
        passable[i] = p;
        any_passable |= p;
    }
    if !any_passable {
        return VisibilitySet::closed();
    }

    let mut vis = VisibilitySet::closed();
    let mut seen = [false; VOL];
    let mut stack: Vec<(usize, usize, usize)> = Vec::new();

    for start in 0..VOL {
        if !passable[start] || seen[start] {
            continue;
        }
        let sx = start % N;
        let sz = (start / N) % N;
        let sy = start / (N * N);
        stack.push((sx, sy, sz));
        seen[start] = true;
        let mut touched = [false; 6];
        while let Some((x, y, z)) = stack.pop() {
            if x == 0 {
                touched[Face::NegX as usize] = true;
            }
            if x == N - 1 {
                touched[Face::PosX as usize] = true;
            }
            if y == 0 {
                touched[Face::NegY as usize] = true;
            }
            if y == N - 1 {
                touched[Face::PosY as usize] = true;
            }
            if z == 0 {
                touched[Face::NegZ as usize] = true;
            }
            if z == N - 1 {
                touched[Face::PosZ as usize] = true;
            }
            let mut push = |nx: usize, ny: usize, nz: usize, stack: &mut Vec<(usize, usize, usize)>| {
                let i = cell(nx, ny, nz);
                if passable[i] && !seen[i] {
                    seen[i] = true;
                    stack.push((nx, ny, nz));
                }
            };
            if x > 0 {
                push(x - 1, y, z, &mut stack);
            }
            if x < N - 1 {
                push(x + 1, y, z, &mut stack);
            }
            if y > 0 {
                push(x, y - 1, z, &mut stack);
            }
            if y < N - 1 {
                push(x, y + 1, z, &mut stack);
            }
            if z > 0 {
                push(x, y, z - 1, &mut stack);
            }
            if z < N - 1 {
                push(x, y, z + 1, &mut stack);
            }
        }
        for (ai, a) in Face::ALL.iter().enumerate() {
            if !touched[ai] {
                continue;
            }
            for (bi, b) in Face::ALL.iter().enumerate() {
                if touched[bi] {
                    vis.connect(*a, *b);
                }
            }
        }
    }
    vis
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_level::{Block, BlockPalette, SectionCoord};

    fn palette() -> BlockPalette {
        BlockPalette::default()
    }

    fn stone(p: &BlockPalette) -> Block {
        Block::new(p.id_by_name("stone").unwrap())
    }

    #[test]
    fn empty_section_is_fully_open() {
        let p = palette();
        let buf = SectionBuf::empty(SectionCoord::new(0, 0, 0));
        let vis = compute_visibility(&buf, &p);
        for a in Face::ALL {
            for b in Face::ALL {
                assert!(vis.visible_between(a, b));
            }
        }
    }

    #[test]
    fn full_section_is_closed() {
        let p = palette();
        let s = stone(&p);
        let buf = SectionBuf::from_blocks(SectionCoord::new(0, 0, 0), vec![s; VOL]);
        assert!(compute_visibility(&buf, &p).is_closed());
    }

    #[test]
    fn solid_x_wall_splits_neg_and_pos_x() {
        let p = palette();
        let s = stone(&p);
        let mut buf = SectionBuf::empty(SectionCoord::new(0, 0, 0));
        for y in 0..N {
            for z in 0..N {
                buf.set_local(8, y, z, s);
            }
        }
        let vis = compute_visibility(&buf, &p);
        assert!(!vis.visible_between(Face::NegX, Face::PosX));
        assert!(vis.visible_between(Face::NegX, Face::PosY));
        assert!(vis.visible_between(Face::PosX, Face::PosY));
    }

    #[test]
    fn glass_wall_does_not_occlude() {
        let p = palette();
        let glass = Block::new(p.id_by_name("glass").unwrap());
        let mut buf = SectionBuf::empty(SectionCoord::new(0, 0, 0));
        for y in 0..N {
            for z in 0..N {
                buf.set_local(8, y, z, glass);
            }
        }
        let vis = compute_visibility(&buf, &p);
        assert!(vis.visible_between(Face::NegX, Face::PosX));
    }
}
