use std::collections::VecDeque;
use std::sync::Arc;

use hashbrown::HashMap;

use vantage_geom::{Aabb, Vec3};
use vantage_graph::ViewArea;
use vantage_level::{BlockPalette, EditStore, Entity, Level, SectionCoord, TerrainParams};
use vantage_render::{LevelRenderer, RenderOptions};
use vantage_runtime::SectionDispatcher;

use super::App;
use crate::camera::{CameraScript, FlyCamera};
use crate::config::RenderConfig;
use crate::event::{Event, EventQueue};

impl App {
    pub fn new(cfg: RenderConfig, cam: FlyCamera, script: CameraScript) -> Self {
        let terrain = TerrainParams {
            seed: cfg.terrain.seed,
            ground_level: cfg.terrain.ground_level,
            amplitude: cfg.terrain.amplitude,
            height_frequency: cfg.terrain.height_frequency,
            water_level: cfg.terrain.water_level,
        };
        let level = Arc::new(Level::new(Arc::new(BlockPalette::default()), terrain));

        let center = SectionCoord::of_position(cam.position);
        let area = ViewArea::new(cfg.view_radius_sections, center);
        let renderer = LevelRenderer::new(cfg.nearby_radius_blocks, cfg.resort_min);
        let dispatcher = SectionDispatcher::new();
        let options = RenderOptions {
            smart_cull: cfg.smart_cull,
            debug_overlay: false,
            clouds: cfg.clouds,
            weather: cfg.weather,
        };
        let entities = spawn_entities(&level, cam.position);

        let mut queue = EventQueue::new();
        // Seed streaming over the whole initial area.
        queue.emit_now(Event::ViewCenterChanged {
            scx: center.sx,
            scy: center.sy,
            scz: center.sz,
        });

        log::info!(
            "level seed={} view_radius={} stream_workers={}",
            terrain.seed,
            cfg.view_radius_sections,
            dispatcher.w_stream
        );

        Self {
            level,
            edits: EditStore::new(),
            entities,
            area,
            renderer,
            dispatcher,
            queue,
            cam,
            script,
            options,
            cfg,
            debug_stats: Default::default(),
            intents: HashMap::new(),
            inflight_rev: HashMap::new(),
            perf_mesh_ms: VecDeque::new(),
            perf_total_ms: VecDeque::new(),
        }
    }
}

/// A handful of markers standing on the terrain near spawn, so the entity
/// pass has something deterministic to cull and draw.
fn spawn_entities(level: &Level, origin: Vec3) -> Vec<Entity> {
    let (ox, _, oz) = origin.floor_i32();
    let mut out = Vec::new();
    for (i, (dx, dz)) in [(4i32, 0i32), (-6, 3), (0, 9), (12, -5)].into_iter().enumerate() {
        let wx = ox + dx;
        let wz = oz + dz;
        let ground = level.surface_height(wx, wz) + 1;
        let min = Vec3::new(wx as f32, ground as f32, wz as f32);
        out.push(Entity {
            id: i as u32 + 1,
            aabb: Aabb::new(min, min + Vec3::new(1.0, 2.0, 1.0)),
        });
    }
    out
}
