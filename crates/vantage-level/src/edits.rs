use std::collections::HashMap;

use crate::{Block, SECTION_SIZE_I, SectionCoord};

#[derive(Default, Debug, Clone, Copy)]
pub struct EditStoreStats {
    pub section_entries: usize,
    pub block_edits: usize,
    pub rev_entries: usize,
}

/// Block edits layered over terrain, with per-section revision stamps the
/// scheduler uses to detect stale build results.
#[derive(Default)]
pub struct EditStore {
    // key = section coord -> map of world coords -> Block
    inner: HashMap<SectionCoord, HashMap<(i32, i32, i32), Block>>,
    rev: HashMap<SectionCoord, u64>,
    counter: u64,
}

impl EditStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> EditStoreStats {
        EditStoreStats {
            section_entries: self.inner.len(),
            block_edits: self.inner.values().map(|m| m.len()).sum(),
            rev_entries: self.rev.len(),
        }
    }

    pub fn get(&self, wx: i32, wy: i32, wz: i32) -> Option<Block> {
        let k = SectionCoord::of_world(wx, wy, wz);
        self.inner
            .get(&k)
            .and_then(|m| m.get(&(wx, wy, wz)).copied())
    }

    pub fn set(&mut self, wx: i32, wy: i32, wz: i32, b: Block) {
        let k = SectionCoord::of_world(wx, wy, wz);
        self.inner.entry(k).or_default().insert((wx, wy, wz), b);
    }

    /// All edits inside one section, as world-coord pairs.
    pub fn snapshot_for_section(&self, coord: SectionCoord) -> Vec<((i32, i32, i32), Block)> {
        self.inner
            .get(&coord)
            .map(|m| m.iter().map(|(k, v)| (*k, *v)).collect())
            .unwrap_or_default()
    }

    /// Bump the revision of the edited section, and of any face neighbor
    /// the edit borders on (their compiled border faces depend on it).
    /// Returns the new monotonically increasing stamp.
    pub fn bump_around(&mut self, wx: i32, wy: i32, wz: i32) -> u64 {
        self.counter = self.counter.wrapping_add(1).max(1);
        let stamp = self.counter;
        let coord = SectionCoord::of_world(wx, wy, wz);
        self.rev.insert(coord, stamp);
        let (bx, by, bz) = coord.base();
        let lx = wx - bx;
        let ly = wy - by;
        let lz = wz - bz;
        let mut bump = |c: SectionCoord| {
            self.rev.insert(c, stamp);
        };
        if lx == 0 {
            bump(coord.offset(-1, 0, 0));
        }
        if lx == SECTION_SIZE_I - 1 {
            bump(coord.offset(1, 0, 0));
        }
        if ly == 0 {
            bump(coord.offset(0, -1, 0));
        }
        if ly == SECTION_SIZE_I - 1 {
            bump(coord.offset(0, 1, 0));
        }
        if lz == 0 {
            bump(coord.offset(0, 0, -1));
        }
        if lz == SECTION_SIZE_I - 1 {
            bump(coord.offset(0, 0, 1));
        }
        stamp
    }

    /// Latest revision stamp affecting a section (0 = never edited).
    #[inline]
    pub fn get_rev(&self, coord: SectionCoord) -> u64 {
        self.rev.get(&coord).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_edit_bumps_neighbor() {
        let mut e = EditStore::new();
        let stamp = e.bump_around(0, 5, 5);
        assert_eq!(e.get_rev(SectionCoord::new(0, 0, 0)), stamp);
        assert_eq!(e.get_rev(SectionCoord::new(-1, 0, 0)), stamp);
        assert_eq!(e.get_rev(SectionCoord::new(1, 0, 0)), 0);
    }

    #[test]
    fn interior_edit_bumps_only_owner() {
        let mut e = EditStore::new();
        let stamp = e.bump_around(8, 8, 8);
        assert_eq!(e.get_rev(SectionCoord::new(0, 0, 0)), stamp);
        for (dx, dy, dz) in [
            (-1, 0, 0),
            (1, 0, 0),
            (0, -1, 0),
            (0, 1, 0),
            (0, 0, -1),
            (0, 0, 1),
        ] {
            assert_eq!(e.get_rev(SectionCoord::new(dx, dy, dz)), 0);
        }
    }

    #[test]
    fn stamps_strictly_increase() {
        let mut e = EditStore::new();
        let a = e.bump_around(1, 1, 1);
        let b = e.bump_around(2, 2, 2);
        assert!(b > a);
    }
}
