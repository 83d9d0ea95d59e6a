use std::sync::Arc;

use vantage_level::SectionCoord;
use vantage_mesh::CompiledSection;
use vantage_section::SectionOccupancy;

/// Renderer-side state for one section slot. The compiled mesh is held as
/// an `Arc` and replaced wholesale; a pass holding the old `Arc` keeps
/// drawing a consistent mesh while a replacement lands.
#[derive(Clone, Debug, Default)]
pub struct RenderSection {
    pub coord: SectionCoord,
    /// None until the level data for this section has been sampled.
    pub occupancy: Option<SectionOccupancy>,
    pub dirty: bool,
    pub dirty_from_player: bool,
    pub built_rev: u64,
    pub compiled: Option<Arc<CompiledSection>>,
    /// Camera block position at the last translucency sort.
    pub resort_pov: Option<(i32, i32, i32)>,
    /// Draw order over `compiled.translucent_cells`, farthest first.
    pub translucent_order: Vec<u16>,
}

impl RenderSection {
    fn reset(&mut self, coord: SectionCoord) {
        self.coord = coord;
        self.occupancy = None;
        self.dirty = true;
        self.dirty_from_player = false;
        self.built_rev = 0;
        self.compiled = None;
        self.resort_pov = None;
        self.translucent_order.clear();
    }

    #[inline]
    pub fn known_empty(&self) -> bool {
        matches!(self.occupancy, Some(SectionOccupancy::Empty))
    }

    /// Level data has been sampled for this slot; neighbors may compile
    /// against it.
    #[inline]
    pub fn data_ready(&self) -> bool {
        self.occupancy.is_some()
    }
}

/// Cube of section slots around the camera, side `2r+1`, indexed by
/// Euclidean-mod wrapping so a recenter only resets the slots whose world
/// coordinate actually changed.
pub struct ViewArea {
    radius: i32,
    side: i32,
    center: SectionCoord,
    slots: Vec<RenderSection>,
}

impl ViewArea {
    pub fn new(radius: i32, center: SectionCoord) -> Self {
        let radius = radius.max(1);
        let side = radius * 2 + 1;
        let mut area = Self {
            radius,
            side,
            center,
            slots: vec![RenderSection::default(); (side * side * side) as usize],
        };
        for coord in area.coords() {
            let i = area.slot_index(coord);
            area.slots[i].reset(coord);
        }
        area
    }

    #[inline]
    pub fn radius(&self) -> i32 {
        self.radius
    }

    #[inline]
    pub fn center(&self) -> SectionCoord {
        self.center
    }

    #[inline]
    fn slot_index(&self, coord: SectionCoord) -> usize {
        let s = self.side;
        let x = coord.sx.rem_euclid(s);
        let y = coord.sy.rem_euclid(s);
        let z = coord.sz.rem_euclid(s);
        ((y * s + z) * s + x) as usize
    }

    /// Whether a coordinate falls inside the current view cube.
    #[inline]
    pub fn in_bounds(&self, coord: SectionCoord) -> bool {
        (coord.sx - self.center.sx).abs() <= self.radius
            && (coord.sy - self.center.sy).abs() <= self.radius
            && (coord.sz - self.center.sz).abs() <= self.radius
    }

    pub fn get(&self, coord: SectionCoord) -> Option<&RenderSection> {
        if !self.in_bounds(coord) {
            return None;
        }
        let rs = &self.slots[self.slot_index(coord)];
        (rs.coord == coord).then_some(rs)
    }

    pub fn get_mut(&mut self, coord: SectionCoord) -> Option<&mut RenderSection> {
        if !self.in_bounds(coord) {
            return None;
        }
        let i = self.slot_index(coord);
        let rs = &mut self.slots[i];
        (rs.coord == coord).then_some(rs)
    }

    /// Move the cube so it is centered on `new_center`. Slots that now map
    /// to a different world coordinate are reset (old mesh released).
    /// Returns the coordinates that entered the area.
    pub fn recenter(&mut self, new_center: SectionCoord) -> Vec<SectionCoord> {
        if new_center == self.center {
            return Vec::new();
        }
        self.center = new_center;
        let mut fresh = Vec::new();
        for coord in self.coords() {
            let i = self.slot_index(coord);
            if self.slots[i].coord != coord {
                self.slots[i].reset(coord);
                fresh.push(coord);
            }
        }
        log::debug!(
            "view area recentered to ({},{},{}); {} sections entered",
            new_center.sx,
            new_center.sy,
            new_center.sz,
            fresh.len()
        );
        fresh
    }

    /// All coordinates currently covered by the cube.
    pub fn coords(&self) -> impl Iterator<Item = SectionCoord> + use<> {
        let c = self.center;
        let r = self.radius;
        (-r..=r).flat_map(move |dy| {
            (-r..=r).flat_map(move |dz| (-r..=r).map(move |dx| c.offset(dx, dy, dz)))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderSection> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RenderSection> {
        self.slots.iter_mut()
    }

    pub fn section_count(&self) -> usize {
        self.slots.len()
    }
}
