//! Level data access: block palette, terrain sampling, edits, entities.
#![forbid(unsafe_code)]

mod edits;
mod palette;

pub use edits::{EditStore, EditStoreStats};
pub use palette::{BlockPalette, BlockType};

use fastnoise_lite::{FastNoiseLite, NoiseType};
use std::sync::Arc;
use vantage_geom::{Aabb, Vec3};

/// Side length of a section in blocks (the unit of mesh compilation).
pub const SECTION_SIZE: usize = 16;
pub const SECTION_SIZE_I: i32 = SECTION_SIZE as i32;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Block {
    pub id: u16,
}

impl Block {
    pub const AIR: Block = Block { id: 0 };

    #[inline]
    pub const fn new(id: u16) -> Self {
        Self { id }
    }
}

/// Grid coordinates in section units.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct SectionCoord {
    pub sx: i32,
    pub sy: i32,
    pub sz: i32,
}

impl SectionCoord {
    #[inline]
    pub const fn new(sx: i32, sy: i32, sz: i32) -> Self {
        Self { sx, sy, sz }
    }

    /// Section containing the given world block position.
    #[inline]
    pub fn of_world(wx: i32, wy: i32, wz: i32) -> Self {
        Self {
            sx: wx.div_euclid(SECTION_SIZE_I),
            sy: wy.div_euclid(SECTION_SIZE_I),
            sz: wz.div_euclid(SECTION_SIZE_I),
        }
    }

    #[inline]
    pub fn of_position(p: Vec3) -> Self {
        let (wx, wy, wz) = p.floor_i32();
        Self::of_world(wx, wy, wz)
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            sx: self.sx + dx,
            sy: self.sy + dy,
            sz: self.sz + dz,
        }
    }

    /// World-space block position of the section's minimum corner.
    #[inline]
    pub fn base(self) -> (i32, i32, i32) {
        (
            self.sx * SECTION_SIZE_I,
            self.sy * SECTION_SIZE_I,
            self.sz * SECTION_SIZE_I,
        )
    }

    #[inline]
    pub fn aabb(self) -> Aabb {
        let (bx, by, bz) = self.base();
        let min = Vec3::new(bx as f32, by as f32, bz as f32);
        Aabb::new(min, min + Vec3::splat(SECTION_SIZE as f32))
    }

    #[inline]
    pub fn center(self) -> Vec3 {
        self.aabb().center()
    }

    #[inline]
    pub fn distance_sq(self, other: SectionCoord) -> i64 {
        let dx = i64::from(self.sx - other.sx);
        let dy = i64::from(self.sy - other.sy);
        let dz = i64::from(self.sz - other.sz);
        dx * dx + dy * dy + dz * dz
    }
}

impl From<(i32, i32, i32)> for SectionCoord {
    fn from(v: (i32, i32, i32)) -> Self {
        Self::new(v.0, v.1, v.2)
    }
}

/// Something the renderer draws as a free-standing object; only its bounds
/// matter here.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entity {
    pub id: u32,
    pub aabb: Aabb,
}

#[derive(Clone, Copy, Debug)]
pub struct TerrainParams {
    pub seed: i32,
    pub ground_level: i32,
    pub amplitude: f32,
    pub height_frequency: f32,
    pub water_level: i32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 1337,
            ground_level: 24,
            amplitude: 20.0,
            height_frequency: 0.008,
            water_level: 18,
        }
    }
}

/// Immutable world accessor shared with worker threads: palette plus
/// procedural terrain sampling. Edits live in [`EditStore`] on the render
/// thread and are snapshotted into build jobs.
pub struct Level {
    palette: Arc<BlockPalette>,
    terrain: TerrainParams,
    height_noise: FastNoiseLite,
    id_stone: u16,
    id_dirt: u16,
    id_grass: u16,
    id_water: u16,
}

impl Level {
    pub fn new(palette: Arc<BlockPalette>, terrain: TerrainParams) -> Self {
        let mut height_noise = FastNoiseLite::with_seed(terrain.seed);
        height_noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        height_noise.set_frequency(Some(terrain.height_frequency));
        let id_of = |name: &str| palette.id_by_name(name).unwrap_or(0);
        Self {
            id_stone: id_of("stone"),
            id_dirt: id_of("dirt"),
            id_grass: id_of("grass"),
            id_water: id_of("water"),
            palette,
            terrain,
            height_noise,
        }
    }

    #[inline]
    pub fn palette(&self) -> &Arc<BlockPalette> {
        &self.palette
    }

    /// Terrain surface height at a column, before edits.
    pub fn surface_height(&self, wx: i32, wz: i32) -> i32 {
        let n = self.height_noise.get_noise_2d(wx as f32, wz as f32);
        self.terrain.ground_level + (n * self.terrain.amplitude) as i32
    }

    /// Terrain block at a world position; callers layer edits on top.
    pub fn block_at(&self, wx: i32, wy: i32, wz: i32) -> Block {
        let h = self.surface_height(wx, wz);
        if wy > h {
            if wy <= self.terrain.water_level {
                Block::new(self.id_water)
            } else {
                Block::AIR
            }
        } else if wy == h {
            Block::new(self.id_grass)
        } else if wy >= h - 3 {
            Block::new(self.id_dirt)
        } else {
            Block::new(self.id_stone)
        }
    }

    #[inline]
    pub fn is_opaque(&self, b: Block) -> bool {
        self.palette.is_opaque(b)
    }

    #[inline]
    pub fn is_solid(&self, b: Block) -> bool {
        self.palette.is_solid(b)
    }

    /// Cheap occupancy classification for a whole section from column
    /// heights, without sampling all 4096 cells. Edits are layered by the
    /// caller (any edit in range forces Populated).
    pub fn section_has_terrain(&self, coord: SectionCoord) -> bool {
        let (bx, by, bz) = coord.base();
        if by <= self.terrain.water_level {
            return true;
        }
        for z in 0..SECTION_SIZE_I {
            for x in 0..SECTION_SIZE_I {
                if self.surface_height(bx + x, bz + z) >= by {
                    return true;
                }
            }
        }
        false
    }

    /// True when the block containing the camera is a solid, fully opaque
    /// cube, which forces plain frustum culling for the frame.
    pub fn camera_in_solid(&self, position: Vec3, edits: &EditStore) -> bool {
        let (wx, wy, wz) = position.floor_i32();
        let b = edits
            .get(wx, wy, wz)
            .unwrap_or_else(|| self.block_at(wx, wy, wz));
        self.palette.is_solid(b) && self.palette.is_opaque(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level() -> Level {
        Level::new(Arc::new(BlockPalette::default()), TerrainParams::default())
    }

    #[test]
    fn section_coord_of_world_rounds_down() {
        assert_eq!(SectionCoord::of_world(0, 0, 0), SectionCoord::new(0, 0, 0));
        assert_eq!(SectionCoord::of_world(15, 15, 15), SectionCoord::new(0, 0, 0));
        assert_eq!(SectionCoord::of_world(16, 0, 0), SectionCoord::new(1, 0, 0));
        assert_eq!(
            SectionCoord::of_world(-1, -16, -17),
            SectionCoord::new(-1, -1, -2)
        );
    }

    #[test]
    fn deep_column_is_stone_surface_is_grass() {
        let lv = level();
        let h = lv.surface_height(10, 10);
        let grass = lv.palette().id_by_name("grass").unwrap();
        let stone = lv.palette().id_by_name("stone").unwrap();
        assert_eq!(lv.block_at(10, h, 10).id, grass);
        assert_eq!(lv.block_at(10, h - 10, 10).id, stone);
    }

    #[test]
    fn camera_in_solid_tracks_single_block() {
        let lv = level();
        let mut edits = EditStore::new();
        let pos = Vec3::new(8.5, 200.0, 8.5);
        assert!(!lv.camera_in_solid(pos, &edits));
        let stone = Block::new(lv.palette().id_by_name("stone").unwrap());
        edits.set(8, 200, 8, stone);
        assert!(lv.camera_in_solid(pos, &edits));
    }
}
