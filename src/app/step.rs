use vantage_level::SectionCoord;
use vantage_render::RenderSink;
use vantage_runtime::JobOut;

use super::App;
use crate::event::Event;

impl App {
    /// One headless frame: advance the scripted camera, drain compile
    /// results, process this tick's events, flush intents, then build and
    /// execute the frame plan against the sink.
    pub fn step(&mut self, dt: f32, sink: &mut impl RenderSink) {
        let prev_section = SectionCoord::of_position(self.cam.position);
        self.script.advance(&mut self.cam, dt);
        let cam_section = SectionCoord::of_position(self.cam.position);
        if cam_section != prev_section {
            self.queue.emit_now(Event::ViewCenterChanged {
                scx: cam_section.sx,
                scy: cam_section.sy,
                scz: cam_section.sz,
            });
        }

        // Worker results, in deterministic order, re-entering as events so
        // application happens inside the same loop as everything else.
        let mut results: Vec<JobOut> = self.dispatcher.drain_results();
        results.sort_by_key(|r| r.job_id);
        for r in results {
            Self::perf_push(&mut self.perf_mesh_ms, r.t_mesh_ms);
            Self::perf_push(&mut self.perf_total_ms, r.t_total_ms);
            log::info!(
                target: "perf",
                "mesh_ms={} total_ms={} gen_ms={} apply_ms={} kind={:?} coord={:?} rev={} job_id={}",
                r.t_mesh_ms,
                r.t_total_ms,
                r.t_gen_ms,
                r.t_apply_ms,
                r.kind,
                r.coord,
                r.rev,
                r.job_id
            );
            self.queue.emit_now(Event::BuildSectionJobCompleted { out: r });
        }

        let mut processed = 0usize;
        while let Some(env) = self.queue.pop_ready() {
            self.handle_event(env);
            processed += 1;
            if processed >= self.cfg.max_events_per_tick {
                log::warn!(
                    target: "events",
                    "event budget exhausted at {} events on tick {}",
                    processed,
                    self.queue.now
                );
                break;
            }
        }

        self.flush_intents();

        let stale = self.queue.count_stale_events();
        if stale > 0 {
            log::warn!(
                target: "events",
                "{} events stranded in past ticks at tick {}",
                stale,
                self.queue.now
            );
        }

        let frustum = self.cam.frustum(self.cfg.aspect);
        let plan = self.renderer.prepare_frame(
            self.cam.position,
            &frustum,
            &mut self.area,
            &self.level,
            &self.edits,
            &self.entities,
            &self.options,
        );
        self.renderer.execute(&plan, &self.area, sink);

        self.update_debug_stats();
        self.queue.advance_tick();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use vantage_geom::Vec3;
    use vantage_level::{Block, SectionCoord};
    use vantage_mesh::{CompiledSection, NeighborsLoaded, VisibilitySet};
    use vantage_render::RecordingSink;
    use vantage_runtime::{JobKind, job_hash};
    use vantage_section::SectionOccupancy;

    use super::*;
    use crate::camera::{CameraScript, FlyCamera};
    use crate::config::RenderConfig;

    fn test_app(radius: i32) -> App {
        let mut cfg = RenderConfig::default();
        cfg.view_radius_sections = radius;
        // Flat terrain keeps the populated set predictable.
        cfg.terrain.amplitude = 0.0;
        cfg.terrain.ground_level = 24;
        cfg.terrain.water_level = 0;
        let cam = FlyCamera::new(Vec3::new(8.0, 36.0, 8.0));
        App::new(cfg, cam, CameraScript::new(Vec::new()))
    }

    fn step_until_settled(app: &mut App, max_frames: usize) -> usize {
        let mut sink = RecordingSink::new();
        for frame in 0..max_frames {
            app.step(1.0 / 60.0, &mut sink);
            if frame > 2 && app.pending_sections() == 0 {
                return frame;
            }
            thread::sleep(Duration::from_millis(2));
        }
        max_frames
    }

    #[test]
    fn every_dirty_section_eventually_compiles() {
        let mut app = test_app(2);
        let frames = step_until_settled(&mut app, 400);
        assert!(frames < 400, "pipeline never settled");
        for coord in app.area.coords().collect::<Vec<_>>() {
            let rs = app.area.get(coord).expect("slot resolves its own coord");
            assert!(rs.data_ready(), "{coord:?} never sampled");
            if !rs.known_empty() {
                assert!(!rs.dirty, "{coord:?} still dirty after settle");
                assert!(rs.compiled.is_some(), "{coord:?} never compiled");
            }
        }
        // The flat ground row is visible and drawn.
        assert!(app.debug_stats.sections_rendered > 0);
    }

    fn solid_result(coord: SectionCoord) -> JobOut {
        JobOut {
            coord,
            rev: 0,
            job_id: job_hash(coord, 0, NeighborsLoaded::ALL),
            occupancy: SectionOccupancy::Populated,
            compiled: Arc::new(CompiledSection {
                coord,
                visibility: VisibilitySet::closed(),
                opaque_quads: 6,
                translucent_quads: 0,
                translucent_cells: Vec::new(),
                block_entities: Vec::new(),
            }),
            kind: JobKind::Stream,
            t_total_ms: 0,
            t_gen_ms: 0,
            t_apply_ms: 0,
            t_mesh_ms: 0,
        }
    }

    #[test]
    fn sealing_wall_trims_sections_behind_it_with_idle_camera() {
        let mut app = test_app(2);
        // Look straight down +z so the far side of the wall is in view.
        app.cam.yaw = 90.0;
        app.cam.pitch = 0.0;
        step_until_settled(&mut app, 400);
        let behind = SectionCoord::new(0, 2, 2);
        assert!(app.renderer.visible().contains(&behind));

        // Solid meshes land across the whole above-ground z=1 plane while
        // the camera never moves; the visible set must still shrink.
        for sx in -2..=2 {
            for sy in 1..=4 {
                app.queue.emit_now(Event::BuildSectionJobCompleted {
                    out: solid_result(SectionCoord::new(sx, sy, 1)),
                });
            }
        }
        let mut sink = RecordingSink::new();
        app.step(1.0 / 60.0, &mut sink);

        assert!(!app.renderer.visible().contains(&behind));
        // The wall itself and the camera's side stay visible.
        assert!(app.renderer.visible().contains(&SectionCoord::new(0, 2, 1)));
        assert!(app.renderer.visible().contains(&SectionCoord::new(0, 2, 0)));
    }

    #[test]
    fn player_edit_recompiles_the_section_at_its_new_revision() {
        let mut app = test_app(1);
        step_until_settled(&mut app, 400);

        // Pillar block in an air section above the ground.
        let (wx, wy, wz) = (8, 40, 8);
        app.queue.emit_now(Event::BlockEdited {
            wx,
            wy,
            wz,
            block: Block::new(1),
        });
        let frames = step_until_settled(&mut app, 400);
        assert!(frames < 400, "edit never converged");

        let coord = SectionCoord::of_world(wx, wy, wz);
        let rs = app.area.get(coord).unwrap();
        assert!(!rs.dirty);
        assert_eq!(rs.built_rev, app.edits.get_rev(coord));
        let mesh = rs.compiled.as_ref().unwrap();
        assert_eq!(mesh.opaque_quads, 6, "edited block should mesh as a cube");
    }
}
