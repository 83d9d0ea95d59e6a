use hashbrown::HashMap;

use vantage_level::{Block, SectionCoord};
use vantage_mesh::{NeighborsLoaded, VisibilitySet};
use vantage_runtime::{BuildJob, JobOut};
use vantage_section::SectionOccupancy;

use super::App;
use super::state::IntentCause;
use crate::event::{Event, EventEnvelope, RebuildCause};

impl App {
    pub(super) fn handle_event(&mut self, env: EventEnvelope) {
        match env.kind {
            Event::ViewCenterChanged { scx, scy, scz } => {
                self.handle_view_center_changed(SectionCoord::new(scx, scy, scz));
            }
            Event::BlockEdited { wx, wy, wz, block } => {
                self.handle_block_edited(wx, wy, wz, block);
            }
            Event::SectionRebuildRequested { coord, cause } => {
                self.handle_section_rebuild_requested(coord, cause);
            }
            Event::BuildSectionJobRequested {
                coord,
                rev,
                neighbors,
                job_id,
                cause,
            } => {
                self.handle_build_section_job_requested(coord, rev, neighbors, job_id, cause);
            }
            Event::BuildSectionJobCompleted { out } => {
                self.handle_build_section_job_completed(out);
            }
            Event::SmartCullToggled => {
                self.options.smart_cull = !self.options.smart_cull;
                self.renderer.invalidate_occlusion();
            }
        }
    }

    pub(super) fn handle_view_center_changed(&mut self, center: SectionCoord) {
        self.area.recenter(center);
        // Intents and in-flight work for sections that left the area are
        // dead; results for them will miss their slot and be dropped.
        self.intents.retain(|c, _| self.area.in_bounds(*c));
        self.inflight_rev.retain(|c, _| self.area.in_bounds(*c));

        // Recenter clears occupancy on every slot it reset; on the very
        // first call nothing has been sampled yet, so this also seeds the
        // initial area.
        let fresh: Vec<SectionCoord> = self
            .area
            .coords()
            .filter(|c| {
                self.area
                    .get(*c)
                    .map(|rs| rs.occupancy.is_none())
                    .unwrap_or(true)
            })
            .collect();
        for coord in fresh {
            self.sample_occupancy(coord);
            let known_empty = self
                .area
                .get(coord)
                .map(|rs| rs.known_empty())
                .unwrap_or(false);
            if known_empty {
                continue;
            }
            if let Some(rs) = self.area.get_mut(coord) {
                rs.dirty = true;
            }
            self.record_intent(coord, self.edits.get_rev(coord), IntentCause::StreamLoad);
        }
        self.renderer.invalidate_occlusion();
        log::debug!(
            "view center -> {:?}, {} intents pending",
            center,
            self.intents.len()
        );
    }

    /// Cheap occupancy estimate from column heights and the edit overlay,
    /// so neighbor gating can pass before any compile has run. The compile
    /// result replaces it with the exact classification.
    fn sample_occupancy(&mut self, coord: SectionCoord) {
        let populated = self.level.section_has_terrain(coord)
            || self
                .edits
                .snapshot_for_section(coord)
                .iter()
                .any(|(_, b)| *b != Block::AIR);
        if let Some(rs) = self.area.get_mut(coord) {
            rs.occupancy = Some(if populated {
                SectionOccupancy::Populated
            } else {
                SectionOccupancy::Empty
            });
        }
    }

    pub(super) fn handle_block_edited(&mut self, wx: i32, wy: i32, wz: i32, block: Block) {
        self.edits.set(wx, wy, wz, block);
        self.edits.bump_around(wx, wy, wz);
        let coord = SectionCoord::of_world(wx, wy, wz);
        // The edited section plus every face neighbor whose rev the bump
        // touched gets a player-priority rebuild.
        let mut touched = vec![coord];
        for (dx, dy, dz) in [(-1, 0, 0), (1, 0, 0), (0, -1, 0), (0, 1, 0), (0, 0, -1), (0, 0, 1)] {
            let n = coord.offset(dx, dy, dz);
            if self.edits.get_rev(n) == self.edits.get_rev(coord) {
                touched.push(n);
            }
        }
        for c in touched {
            if !self.area.in_bounds(c) {
                continue;
            }
            if let Some(rs) = self.area.get_mut(c) {
                rs.dirty = true;
                rs.dirty_from_player = true;
                // An edit can populate a section the sampler called empty.
                if c == coord && block != Block::AIR {
                    rs.occupancy = Some(SectionOccupancy::Populated);
                }
            }
            self.record_intent(c, self.edits.get_rev(c), IntentCause::PlayerEdit);
        }
    }

    pub(super) fn handle_section_rebuild_requested(
        &mut self,
        coord: SectionCoord,
        cause: RebuildCause,
    ) {
        if !self.area.in_bounds(coord) {
            return;
        }
        let intent_cause = match cause {
            RebuildCause::PlayerEdit => IntentCause::PlayerEdit,
            RebuildCause::StreamLoad => IntentCause::StreamLoad,
        };
        if let Some(rs) = self.area.get_mut(coord) {
            rs.dirty = true;
            if intent_cause == IntentCause::PlayerEdit {
                rs.dirty_from_player = true;
            }
        }
        self.record_intent(coord, self.edits.get_rev(coord), intent_cause);
    }

    pub(super) fn handle_build_section_job_requested(
        &mut self,
        coord: SectionCoord,
        rev: u64,
        neighbors: NeighborsLoaded,
        job_id: u64,
        cause: RebuildCause,
    ) {
        if !self.area.in_bounds(coord) {
            self.inflight_rev.remove(&coord);
            return;
        }
        if !self.neighbors_data_ready(coord) {
            // Missing neighbor data: stay dirty, retry next tick.
            self.inflight_rev.remove(&coord);
            self.queue
                .emit_after(1, Event::SectionRebuildRequested { coord, cause });
            return;
        }

        let job = BuildJob {
            coord,
            rev,
            job_id,
            neighbors,
            section_edits: self.edits.snapshot_for_section(coord),
            border_edits: self.border_edits_for(coord),
            level: self.level.clone(),
        };
        let player_dirty = self
            .area
            .get(coord)
            .map(|rs| rs.dirty_from_player)
            .unwrap_or(false);
        let near = {
            let r = self.cfg.nearby_radius_blocks;
            coord.center().distance_sq(self.cam.position) <= r * r
        };
        if player_dirty || near {
            self.dispatcher.compile_now(&job);
        } else {
            self.dispatcher.submit_stream(job);
        }
    }

    pub(super) fn handle_build_section_job_completed(&mut self, out: JobOut) {
        let current_rev = self.edits.get_rev(out.coord);
        if out.rev < current_rev {
            // A newer edit superseded this build; its intent is already
            // queued, so the stale mesh is just dropped.
            if self.inflight_rev.get(&out.coord) == Some(&out.rev) {
                self.inflight_rev.remove(&out.coord);
            }
            log::debug!(
                "dropping stale build for {:?} (rev {} < {})",
                out.coord,
                out.rev,
                current_rev
            );
            return;
        }
        let Some(rs) = self.area.get_mut(out.coord) else {
            // Section left the view area while the job was in flight.
            self.inflight_rev.remove(&out.coord);
            return;
        };

        // How the section passed light before this result, the way the
        // traversal sees it: compiled meshes by their face matrix, known
        // empties through every face, uncompiled populated not at all.
        let prev_passable = match (&rs.compiled, rs.occupancy) {
            (Some(c), _) => c.visibility,
            (None, Some(SectionOccupancy::Empty)) => VisibilitySet::fully_open(),
            _ => VisibilitySet::closed(),
        };
        let now_passable = if out.occupancy.is_empty() {
            VisibilitySet::fully_open()
        } else {
            out.compiled.visibility
        };
        rs.occupancy = Some(out.occupancy);
        rs.compiled = Some(out.compiled);
        rs.built_rev = out.rev;
        rs.dirty = false;
        rs.dirty_from_player = false;
        self.inflight_rev.remove(&out.coord);

        if !now_passable.is_superset_of(prev_passable) {
            // The mesh lost connections; sections that were only reachable
            // through them have to be trimmed, which local repair cannot do.
            self.renderer.invalidate_occlusion();
        } else if now_passable != prev_passable {
            // Purely opened up; re-propagate through it.
            self.renderer.on_section_compiled(out.coord);
        }
    }

    /// All six in-bounds face neighbors have a known occupancy. Neighbors
    /// outside the view area never gate.
    pub(super) fn neighbors_data_ready(&self, coord: SectionCoord) -> bool {
        for (dx, dy, dz) in [(-1, 0, 0), (1, 0, 0), (0, -1, 0), (0, 1, 0), (0, 0, -1), (0, 0, 1)] {
            let n = coord.offset(dx, dy, dz);
            if !self.area.in_bounds(n) {
                continue;
            }
            match self.area.get(n) {
                Some(rs) if rs.data_ready() => {}
                _ => return false,
            }
        }
        true
    }

    pub(super) fn neighbor_mask(&self, coord: SectionCoord) -> NeighborsLoaded {
        let ready = |dx: i32, dy: i32, dz: i32| {
            let n = coord.offset(dx, dy, dz);
            !self.area.in_bounds(n)
                || self.area.get(n).map(|rs| rs.data_ready()).unwrap_or(false)
        };
        NeighborsLoaded {
            neg_x: ready(-1, 0, 0),
            pos_x: ready(1, 0, 0),
            neg_y: ready(0, -1, 0),
            pos_y: ready(0, 1, 0),
            neg_z: ready(0, 0, -1),
            pos_z: ready(0, 0, 1),
        }
    }

    /// Edits in the one-cell ring around a section, pulled from the six
    /// face neighbors. Compile-time border queries only ever step one cell
    /// out along a single axis, so diagonal neighbors cannot contribute.
    fn border_edits_for(&self, coord: SectionCoord) -> HashMap<(i32, i32, i32), Block> {
        let mut out = HashMap::new();
        let (bx, by, bz) = coord.base();
        let s = vantage_level::SECTION_SIZE_I;
        for (dx, dy, dz) in [(-1, 0, 0), (1, 0, 0), (0, -1, 0), (0, 1, 0), (0, 0, -1), (0, 0, 1)] {
            let n = coord.offset(dx, dy, dz);
            for ((wx, wy, wz), b) in self.edits.snapshot_for_section(n) {
                let in_ring = (wx == bx - 1 || wx == bx + s)
                    && wy >= by
                    && wy < by + s
                    && wz >= bz
                    && wz < bz + s
                    || (wy == by - 1 || wy == by + s)
                        && wx >= bx
                        && wx < bx + s
                        && wz >= bz
                        && wz < bz + s
                    || (wz == bz - 1 || wz == bz + s)
                        && wx >= bx
                        && wx < bx + s
                        && wy >= by
                        && wy < by + s;
                if in_ring {
                    out.insert((wx, wy, wz), b);
                }
            }
        }
        out
    }
}
