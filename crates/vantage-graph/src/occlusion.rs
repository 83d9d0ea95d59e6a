use std::collections::VecDeque;
use std::thread::{self, ThreadId};

use hashbrown::HashMap;

use vantage_geom::{Frustum, Vec3};
use vantage_level::SectionCoord;
use vantage_mesh::Face;

use crate::ViewArea;

const STEPS: [(i32, i32, i32); 6] = [
    (-1, 0, 0),
    (1, 0, 0),
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
];

/// Incremental visibility over the view area.
///
/// A section is visible iff an unobstructed traversal from the camera's
/// section reaches it inside the frustum. A full recompute runs whenever
/// the frustum or the camera's section changed; otherwise the set is only
/// repaired locally around sections queued via
/// [`schedule_propagation_from`](Self::schedule_propagation_from).
///
/// Not safe for concurrent mutation: the graph records its owning thread
/// and panics if touched from any other, since a racing update would
/// corrupt the traversal state mid-frame.
pub struct SectionOcclusionGraph {
    owner: ThreadId,
    nearby_radius: f32,
    visible: Vec<SectionCoord>,
    nearby: Vec<SectionCoord>,
    /// Entry-face masks for every section reached this frame. Bit `f` set
    /// means traversal has entered through face `f`.
    entered: HashMap<SectionCoord, u8>,
    pending: VecDeque<SectionCoord>,
    invalidated: bool,
    last_camera_section: Option<SectionCoord>,
    last_frustum: Option<Frustum>,
    last_smart_cull: bool,
}

impl SectionOcclusionGraph {
    pub fn new(nearby_radius_blocks: f32) -> Self {
        Self {
            owner: thread::current().id(),
            nearby_radius: nearby_radius_blocks,
            visible: Vec::new(),
            nearby: Vec::new(),
            entered: HashMap::new(),
            pending: VecDeque::new(),
            invalidated: true,
            last_camera_section: None,
            last_frustum: None,
            last_smart_cull: true,
        }
    }

    #[inline]
    fn assert_owner(&self) {
        let current = thread::current().id();
        if current != self.owner {
            panic!(
                "section occlusion graph mutated from {:?}, owned by {:?}",
                current, self.owner
            );
        }
    }

    /// Force a full recompute on the next `update`.
    pub fn invalidate(&mut self) {
        self.assert_owner();
        self.invalidated = true;
    }

    /// Queue a local repair around a section whose compiled state changed
    /// (typically uncompiled -> compiled, which can reveal sections beyond
    /// it).
    pub fn schedule_propagation_from(&mut self, coord: SectionCoord) {
        self.assert_owner();
        self.pending.push_back(coord);
    }

    /// Visible sections in discovery order (approximately near to far).
    #[inline]
    pub fn visible(&self) -> &[SectionCoord] {
        &self.visible
    }

    /// Visible sections within the nearby radius of the camera, used for
    /// unconditional translucency resorting and synchronous compiles.
    #[inline]
    pub fn nearby(&self) -> &[SectionCoord] {
        &self.nearby
    }

    #[inline]
    pub fn is_visible(&self, coord: SectionCoord) -> bool {
        self.entered.contains_key(&coord)
    }

    /// Recompute or repair the visible set and copy it into `out_visible`.
    pub fn update(
        &mut self,
        smart_cull: bool,
        camera_pos: Vec3,
        frustum: &Frustum,
        area: &ViewArea,
        out_visible: &mut Vec<SectionCoord>,
    ) {
        self.assert_owner();
        let cam_section = clamp_to_area(SectionCoord::of_position(camera_pos), area);
        let full = self.invalidated
            || self.last_camera_section != Some(cam_section)
            || self.last_frustum.as_ref() != Some(frustum)
            || self.last_smart_cull != smart_cull;

        if full {
            self.visible.clear();
            self.entered.clear();
            self.pending.clear();
            let mut queue = VecDeque::new();
            // The camera's own section is always admitted, frustum or not:
            // the traversal has to start somewhere even when looking away.
            self.entered.insert(cam_section, 0);
            self.visible.push(cam_section);
            queue.push_back(cam_section);
            self.propagate(smart_cull, cam_section, frustum, area, &mut queue);
            log::trace!(
                "occlusion recompute: cam={:?} visible={} smart_cull={}",
                cam_section,
                self.visible.len(),
                smart_cull
            );
        } else if !self.pending.is_empty() {
            let seeds: Vec<SectionCoord> = self.pending.drain(..).collect();
            let mut queue = VecDeque::new();
            for seed in seeds {
                if !area.in_bounds(seed) {
                    continue;
                }
                // Re-attempt every step out of the seed's visible
                // neighborhood; newly compiled data may open paths.
                for (dx, dy, dz) in STEPS {
                    let n = seed.offset(dx, dy, dz);
                    if self.entered.contains_key(&n) {
                        queue.push_back(n);
                    }
                }
                if self.entered.contains_key(&seed) {
                    queue.push_back(seed);
                }
            }
            if !queue.is_empty() {
                self.propagate(smart_cull, cam_section, frustum, area, &mut queue);
            }
        }

        self.last_camera_section = Some(cam_section);
        self.last_frustum = Some(*frustum);
        self.last_smart_cull = smart_cull;
        self.invalidated = false;

        self.rebuild_nearby(camera_pos);
        out_visible.clear();
        out_visible.extend_from_slice(&self.visible);
    }

    /// BFS worker shared by full recompute and local repair. Entry masks
    /// only ever grow, so re-running over already-visited sections is
    /// idempotent.
    fn propagate(
        &mut self,
        smart_cull: bool,
        cam_section: SectionCoord,
        frustum: &Frustum,
        area: &ViewArea,
        queue: &mut VecDeque<SectionCoord>,
    ) {
        while let Some(from) = queue.pop_front() {
            let from_mask = self.entered.get(&from).copied().unwrap_or(0);
            for (dx, dy, dz) in STEPS {
                let next = from.offset(dx, dy, dz);
                if !area.in_bounds(next) {
                    continue;
                }
                let step_face = Face::from_step(dx, dy, dz).expect("unit step");
                if smart_cull && !can_exit(area, from, from_mask, cam_section, step_face) {
                    continue;
                }
                if !frustum.intersects_aabb(&next.aabb()) {
                    continue;
                }
                let entry_bit = 1u8 << (step_face.opposite() as u8);
                match self.entered.get_mut(&next) {
                    Some(mask) => {
                        if *mask & entry_bit == 0 {
                            *mask |= entry_bit;
                            queue.push_back(next);
                        }
                    }
                    None => {
                        self.entered.insert(next, entry_bit);
                        self.visible.push(next);
                        queue.push_back(next);
                    }
                }
            }
        }
    }

    fn rebuild_nearby(&mut self, camera_pos: Vec3) {
        let r_sq = self.nearby_radius * self.nearby_radius;
        self.nearby.clear();
        self.nearby.extend(
            self.visible
                .iter()
                .copied()
                .filter(|c| c.center().distance_sq(camera_pos) <= r_sq),
        );
    }
}

/// Whether traversal can leave `from` through `exit`. The camera's section
/// never blocks (the camera is inside it); an empty section passes through
/// every face; a compiled section passes iff some already-used entry face
/// connects to the exit; an uncompiled populated section is opaque until
/// its mesh lands.
fn can_exit(
    area: &ViewArea,
    from: SectionCoord,
    entry_mask: u8,
    cam_section: SectionCoord,
    exit: Face,
) -> bool {
    if from == cam_section {
        return true;
    }
    let Some(rs) = area.get(from) else {
        return false;
    };
    if rs.known_empty() {
        return true;
    }
    let Some(compiled) = rs.compiled.as_ref() else {
        return false;
    };
    Face::ALL
        .iter()
        .any(|&entry| entry_mask & (1 << entry as u8) != 0 && compiled.visibility.visible_between(entry, exit))
}

fn clamp_to_area(coord: SectionCoord, area: &ViewArea) -> SectionCoord {
    let c = area.center();
    let r = area.radius();
    SectionCoord::new(
        coord.sx.clamp(c.sx - r, c.sx + r),
        coord.sy.clamp(c.sy - r, c.sy + r),
        coord.sz.clamp(c.sz - r, c.sz + r),
    )
}
