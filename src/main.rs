//! Headless driver: scripted camera flight over generated terrain, with the
//! whole visibility and compile pipeline running underneath.

mod app;
mod camera;
mod config;
mod event;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use vantage_geom::Vec3;
use vantage_level::{Entity, SectionCoord};
use vantage_mesh::CompiledSection;
use vantage_render::RenderSink;

use crate::app::App;
use crate::camera::{CameraScript, FlyCamera, Waypoint};
use crate::config::{RenderConfig, load_config_from_path};
use crate::event::Event;

#[derive(Parser, Debug)]
#[command(name = "vantage", about = "Section visibility and mesh-compile pipeline")]
struct Args {
    /// TOML render config; defaults apply when absent.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Frames to simulate before exiting.
    #[arg(long, default_value_t = 600)]
    frames: u64,
    /// Override view radius in sections.
    #[arg(long)]
    radius: Option<i32>,
    /// Start with smart occlusion culling disabled.
    #[arg(long)]
    no_smart_cull: bool,
    /// Place a stone block near spawn partway through, exercising the
    /// player-edit path.
    #[arg(long)]
    edit_demo: bool,
}

/// Draw calls go nowhere; the pipeline's observable output is its logs and
/// stats.
struct HeadlessSink;

impl RenderSink for HeadlessSink {
    fn sky(&mut self) {}
    fn section_opaque(&mut self, _mesh: &Arc<CompiledSection>) {}
    fn entity(&mut self, _entity: &Entity) {}
    fn block_entity(&mut self, _at: (i32, i32, i32)) {}
    fn debug_overlay(&mut self) {}
    fn section_translucent(&mut self, _mesh: &Arc<CompiledSection>, _order: &[u16]) {}
    fn clouds(&mut self) {}
    fn weather(&mut self) {}
}

fn flight_script(start: Vec3) -> CameraScript {
    CameraScript::new(vec![
        Waypoint { position: start + Vec3::new(48.0, 8.0, 0.0), yaw: 0.0, pitch: -20.0 },
        Waypoint { position: start + Vec3::new(48.0, 8.0, 48.0), yaw: 90.0, pitch: -10.0 },
        Waypoint { position: start + Vec3::new(0.0, 24.0, 48.0), yaw: 180.0, pitch: -35.0 },
        Waypoint { position: start, yaw: 270.0, pitch: -15.0 },
    ])
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut cfg: RenderConfig = match &args.config {
        Some(path) => load_config_from_path(path)?,
        None => RenderConfig::default(),
    };
    if let Some(r) = args.radius {
        cfg.view_radius_sections = r;
    }
    if args.no_smart_cull {
        cfg.smart_cull = false;
    }

    let spawn = Vec3::new(8.0, (cfg.terrain.ground_level + 12) as f32, 8.0);
    let cam = FlyCamera::new(spawn);
    let script = flight_script(spawn);
    let mut app = App::new(cfg, cam, script);
    let mut sink = HeadlessSink;

    let dt = 1.0 / 60.0;
    for frame in 0..args.frames {
        if args.edit_demo && frame == args.frames / 2 {
            let (wx, wy, wz) = (spawn + Vec3::new(2.0, -4.0, 2.0)).floor_i32();
            app.queue.emit_now(Event::BlockEdited {
                wx,
                wy,
                wz,
                block: vantage_level::Block::new(1),
            });
        }
        app.step(dt, &mut sink);
        if frame % 60 == 0 {
            let s = &app.debug_stats;
            log::info!(
                target: "perf",
                "frame={} cam={:?} visible={} rendered={} culled={} empty={} resident={} intents={} inflight={} q={} draws={}",
                frame,
                SectionCoord::of_position(app.cam.position),
                s.sections_visible,
                s.sections_rendered,
                s.sections_culled,
                s.sections_empty,
                s.sections_resident,
                s.intents_size,
                s.inflight_size,
                s.q_stream,
                s.draw_calls
            );
        }
    }

    let s = &app.debug_stats;
    log::info!(
        "done after {} frames: resident={} visible={} pending={}",
        args.frames,
        s.sections_resident,
        s.sections_visible,
        app.pending_sections()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("fatal: {}", e);
        std::process::exit(1);
    }
}
