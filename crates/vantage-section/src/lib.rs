//! Section block buffers: the 16³ unit the mesher and occlusion graph work on.
#![forbid(unsafe_code)]

use vantage_level::{Block, Level, SECTION_SIZE, SECTION_SIZE_I, SectionCoord};

pub const SECTION_VOLUME: usize = SECTION_SIZE * SECTION_SIZE * SECTION_SIZE;

#[derive(Clone, Debug)]
pub struct SectionBuf {
    pub coord: SectionCoord,
    pub blocks: Vec<Block>,
}

impl SectionBuf {
    #[inline]
    pub fn idx(x: usize, y: usize, z: usize) -> usize {
        (y * SECTION_SIZE + z) * SECTION_SIZE + x
    }

    #[inline]
    pub fn get_local(&self, x: usize, y: usize, z: usize) -> Block {
        self.blocks[Self::idx(x, y, z)]
    }

    #[inline]
    pub fn set_local(&mut self, x: usize, y: usize, z: usize, b: Block) {
        self.blocks[Self::idx(x, y, z)] = b;
    }

    #[inline]
    pub fn contains_world(&self, wx: i32, wy: i32, wz: i32) -> bool {
        let (bx, by, bz) = self.coord.base();
        wx >= bx
            && wx < bx + SECTION_SIZE_I
            && wy >= by
            && wy < by + SECTION_SIZE_I
            && wz >= bz
            && wz < bz + SECTION_SIZE_I
    }

    #[inline]
    pub fn get_world(&self, wx: i32, wy: i32, wz: i32) -> Option<Block> {
        if !self.contains_world(wx, wy, wz) {
            return None;
        }
        let (bx, by, bz) = self.coord.base();
        Some(self.get_local(
            (wx - bx) as usize,
            (wy - by) as usize,
            (wz - bz) as usize,
        ))
    }

    pub fn from_blocks(coord: SectionCoord, mut blocks: Vec<Block>) -> Self {
        if blocks.len() != SECTION_VOLUME {
            blocks.resize(SECTION_VOLUME, Block::AIR);
        }
        Self { coord, blocks }
    }

    pub fn empty(coord: SectionCoord) -> Self {
        Self {
            coord,
            blocks: vec![Block::AIR; SECTION_VOLUME],
        }
    }

    #[inline]
    pub fn has_non_air(&self) -> bool {
        self.blocks.iter().any(|b| *b != Block::AIR)
    }

    #[inline]
    pub fn occupancy(&self) -> SectionOccupancy {
        if self.has_non_air() {
            SectionOccupancy::Populated
        } else {
            SectionOccupancy::Empty
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SectionOccupancy {
    Empty,
    Populated,
}

impl SectionOccupancy {
    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, SectionOccupancy::Empty)
    }

    #[inline]
    pub fn has_blocks(self) -> bool {
        matches!(self, SectionOccupancy::Populated)
    }
}

/// Sample a section out of the level (terrain plus edit overlay).
pub fn generate_section_buf(level: &Level, coord: SectionCoord) -> SectionBuf {
    let (bx, by, bz) = coord.base();
    let mut blocks = Vec::with_capacity(SECTION_VOLUME);
    for y in 0..SECTION_SIZE_I {
        for z in 0..SECTION_SIZE_I {
            for x in 0..SECTION_SIZE_I {
                blocks.push(level.block_at(bx + x, by + y, bz + z));
            }
        }
    }
    SectionBuf { coord, blocks }
}
