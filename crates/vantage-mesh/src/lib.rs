//! CPU section compilation: face visibility, quad extraction, resort data.
#![forbid(unsafe_code)]

mod visibility;

pub use visibility::{Face, VisibilitySet, compute_visibility};

use vantage_geom::Vec3;
use vantage_level::{Block, BlockPalette, SECTION_SIZE, SECTION_SIZE_I, SectionCoord};
use vantage_section::SectionBuf;

/// Which of the six face neighbors have resident section data. Compilation
/// is gated on all six so border faces never seam against stale guesses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NeighborsLoaded {
    pub neg_x: bool,
    pub pos_x: bool,
    pub neg_y: bool,
    pub pos_y: bool,
    pub neg_z: bool,
    pub pos_z: bool,
}

impl NeighborsLoaded {
    pub const ALL: NeighborsLoaded = NeighborsLoaded {
        neg_x: true,
        pos_x: true,
        neg_y: true,
        pos_y: true,
        neg_z: true,
        pos_z: true,
    };

    #[inline]
    pub fn all_loaded(self) -> bool {
        self.neg_x && self.pos_x && self.neg_y && self.pos_y && self.neg_z && self.pos_z
    }

    #[inline]
    pub fn mask(self) -> u8 {
        (self.neg_x as u8)
            | ((self.pos_x as u8) << 1)
            | ((self.neg_y as u8) << 2)
            | ((self.pos_y as u8) << 3)
            | ((self.neg_z as u8) << 4)
            | ((self.pos_z as u8) << 5)
    }
}

/// The immutable product of compiling one section. Replaced wholesale on
/// recompilation; never mutated after construction.
#[derive(Clone, Debug)]
pub struct CompiledSection {
    pub coord: SectionCoord,
    pub visibility: VisibilitySet,
    pub opaque_quads: u32,
    pub translucent_quads: u32,
    /// World-space centers of translucent cells, in compile order. The
    /// renderer owns the draw ordering over these and resorts it by camera
    /// distance.
    pub translucent_cells: Vec<Vec3>,
    /// World coordinates of cells whose block is rendered as a block entity.
    pub block_entities: Vec<(i32, i32, i32)>,
}

impl CompiledSection {
    /// Compiled section for an all-air buffer: nothing to draw, every face
    /// sees every other face.
    pub fn empty(coord: SectionCoord) -> Self {
        Self {
            coord,
            visibility: VisibilitySet::fully_open(),
            opaque_quads: 0,
            translucent_quads: 0,
            translucent_cells: Vec::new(),
            block_entities: Vec::new(),
        }
    }

    #[inline]
    pub fn has_renderable(&self) -> bool {
        self.opaque_quads > 0 || self.translucent_quads > 0 || !self.block_entities.is_empty()
    }

    #[inline]
    pub fn has_translucent(&self) -> bool {
        !self.translucent_cells.is_empty()
    }
}

/// Compile one section. `outside` answers block queries for the one-cell
/// border ring in world coordinates; the dispatcher only calls this once
/// all six neighbors are resident, so the closure never guesses.
pub fn compile_section(
    buf: &SectionBuf,
    palette: &BlockPalette,
    outside: impl Fn(i32, i32, i32) -> Block,
) -> CompiledSection {
    if !buf.has_non_air() {
        return CompiledSection::empty(buf.coord);
    }

    let visibility = compute_visibility(buf, palette);
    let (bx, by, bz) = buf.coord.base();
    let mut opaque_quads = 0u32;
    let mut translucent_quads = 0u32;
    let mut translucent_cells: Vec<Vec3> = Vec::new();
    let mut block_entities: Vec<(i32, i32, i32)> = Vec::new();

    let n = SECTION_SIZE_I;
    let sample = |lx: i32, ly: i32, lz: i32| -> Block {
        if (0..n).contains(&lx) && (0..n).contains(&ly) && (0..n).contains(&lz) {
            buf.get_local(lx as usize, ly as usize, lz as usize)
        } else {
            outside(bx + lx, by + ly, bz + lz)
        }
    };

    for y in 0..n {
        for z in 0..n {
            for x in 0..n {
                let b = buf.get_local(x as usize, y as usize, z as usize);
                if b == Block::AIR {
                    continue;
                }
                if palette.is_block_entity(b) {
                    block_entities.push((bx + x, by + y, bz + z));
                }
                let translucent = palette.is_translucent(b);
                let mut visible_faces = 0u32;
                for face in Face::ALL {
                    let (dx, dy, dz) = face.offset();
                    let nb = sample(x + dx, y + dy, z + dz);
                    if palette.is_opaque(nb) {
                        continue;
                    }
                    // Merge faces between identical blocks (water against
                    // water draws no internal quads).
                    if nb == b {
                        continue;
                    }
                    visible_faces += 1;
                }
                if visible_faces == 0 {
                    continue;
                }
                if translucent {
                    translucent_quads += visible_faces;
                    translucent_cells.push(Vec3::new(
                        (bx + x) as f32 + 0.5,
                        (by + y) as f32 + 0.5,
                        (bz + z) as f32 + 0.5,
                    ));
                } else {
                    opaque_quads += visible_faces;
                }
            }
        }
    }

    log::trace!(
        "compiled section ({},{},{}): {} opaque / {} translucent quads",
        buf.coord.sx,
        buf.coord.sy,
        buf.coord.sz,
        opaque_quads,
        translucent_quads
    );

    CompiledSection {
        coord: buf.coord,
        visibility,
        opaque_quads,
        translucent_quads,
        translucent_cells,
        block_entities,
    }
}
