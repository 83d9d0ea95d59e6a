use vantage_geom::{Frustum, Vec3};
use vantage_graph::{SectionOcclusionGraph, ViewArea};
use vantage_level::{EditStore, Entity, Level, SectionCoord};

use crate::plan::{FramePass, FramePlan};
use crate::sink::RenderSink;

/// Every visible section gets a resort look within this many frames.
const RESORT_SPREAD_FRAMES: usize = 8;

#[derive(Clone, Copy, Debug)]
pub struct RenderOptions {
    pub smart_cull: bool,
    pub debug_overlay: bool,
    pub clouds: bool,
    pub weather: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            smart_cull: true,
            debug_overlay: false,
            clouds: false,
            weather: false,
        }
    }
}

#[derive(Default, Clone, Debug)]
pub struct FrameStats {
    pub sections_visible: usize,
    pub sections_rendered: usize,
    pub sections_culled: usize,
    pub sections_empty: usize,
    pub translucent_sections: usize,
    pub block_entities: usize,
    pub entities_rendered: usize,
    pub draw_calls: usize,
    pub resorts: usize,
}

/// Per-frame orchestration over the view area: occlusion update, rotating
/// translucency resort, ordered pass construction, and execution against a
/// sink.
pub struct LevelRenderer {
    graph: SectionOcclusionGraph,
    visible: Vec<SectionCoord>,
    resort_cursor: usize,
    resort_min: usize,
    frame: u64,
    pub stats: FrameStats,
}

impl LevelRenderer {
    pub fn new(nearby_radius_blocks: f32, resort_min: usize) -> Self {
        Self {
            graph: SectionOcclusionGraph::new(nearby_radius_blocks),
            visible: Vec::new(),
            resort_cursor: 0,
            resort_min,
            frame: 0,
            stats: FrameStats::default(),
        }
    }

    #[inline]
    pub fn visible(&self) -> &[SectionCoord] {
        &self.visible
    }

    #[inline]
    pub fn nearby(&self) -> &[SectionCoord] {
        self.graph.nearby()
    }

    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    /// Force a full occlusion recompute next frame.
    pub fn invalidate_occlusion(&mut self) {
        self.graph.invalidate();
    }

    /// A section went uncompiled -> compiled; traversal may now continue
    /// past it.
    pub fn on_section_compiled(&mut self, coord: SectionCoord) {
        self.graph.schedule_propagation_from(coord);
    }

    /// Build this frame's plan. Mutates the view area only for translucent
    /// draw order; meshes themselves are never touched here.
    pub fn prepare_frame(
        &mut self,
        camera_pos: Vec3,
        frustum: &Frustum,
        area: &mut ViewArea,
        level: &Level,
        edits: &EditStore,
        entities: &[Entity],
        options: &RenderOptions,
    ) -> FramePlan {
        self.frame += 1;
        self.stats = FrameStats::default();

        // Standing inside an opaque solid block would occlude everything;
        // fall back to pure frustum culling for this frame.
        let smart_cull = options.smart_cull && !level.camera_in_solid(camera_pos, edits);
        self.graph
            .update(smart_cull, camera_pos, frustum, area, &mut self.visible);
        self.stats.sections_visible = self.visible.len();
        self.stats.sections_culled = area.section_count().saturating_sub(self.visible.len());

        self.resort_translucency(camera_pos, area);

        let mut opaque: Vec<SectionCoord> = Vec::new();
        let mut translucent: Vec<SectionCoord> = Vec::new();
        let mut block_entities: Vec<(i32, i32, i32)> = Vec::new();
        for &coord in &self.visible {
            let Some(rs) = area.get(coord) else { continue };
            if rs.known_empty() {
                self.stats.sections_empty += 1;
                continue;
            }
            let Some(mesh) = rs.compiled.as_ref() else { continue };
            if mesh.opaque_quads > 0 {
                opaque.push(coord);
            }
            if mesh.has_translucent() {
                translucent.push(coord);
            }
            block_entities.extend_from_slice(&mesh.block_entities);
        }
        // Opaque draws front to back (BFS discovery order); translucent
        // blends back to front.
        translucent.reverse();
        self.stats.sections_rendered = opaque.len();
        self.stats.translucent_sections = translucent.len();
        self.stats.block_entities = block_entities.len();

        let visible_entities: Vec<Entity> = entities
            .iter()
            .copied()
            .filter(|e| frustum.intersects_aabb(&e.aabb))
            .collect();
        self.stats.entities_rendered = visible_entities.len();

        let mut plan = FramePlan::default();
        plan.passes.push(FramePass::Sky);
        plan.passes.push(FramePass::TerrainOpaque(opaque));
        plan.passes.push(FramePass::Entities(visible_entities));
        plan.passes.push(FramePass::BlockEntities(block_entities));
        if options.debug_overlay {
            plan.passes.push(FramePass::Debug);
        }
        plan.passes.push(FramePass::TerrainTranslucent(translucent));
        if options.clouds {
            plan.passes.push(FramePass::Clouds);
        }
        if options.weather {
            plan.passes.push(FramePass::Weather);
        }

        log::trace!(
            target: "frame",
            "frame {}: visible={} rendered={} translucent={} resorts={}",
            self.frame,
            self.stats.sections_visible,
            self.stats.sections_rendered,
            self.stats.translucent_sections,
            self.stats.resorts
        );
        plan
    }

    /// Run the plan against a sink. Terrain coords resolve to whatever mesh
    /// the view area holds right now; a swap since `prepare_frame` just
    /// means the newer mesh draws.
    pub fn execute(&mut self, plan: &FramePlan, area: &ViewArea, sink: &mut impl RenderSink) {
        for pass in &plan.passes {
            match pass {
                FramePass::Sky => {
                    sink.sky();
                    self.stats.draw_calls += 1;
                }
                FramePass::TerrainOpaque(coords) => {
                    for &coord in coords {
                        let Some(rs) = area.get(coord) else { continue };
                        let Some(mesh) = rs.compiled.as_ref() else { continue };
                        if mesh.opaque_quads > 0 {
                            sink.section_opaque(mesh);
                            self.stats.draw_calls += 1;
                        }
                    }
                }
                FramePass::Entities(ents) => {
                    for e in ents {
                        sink.entity(e);
                        self.stats.draw_calls += 1;
                    }
                }
                FramePass::BlockEntities(cells) => {
                    for &at in cells {
                        sink.block_entity(at);
                        self.stats.draw_calls += 1;
                    }
                }
                FramePass::Debug => {
                    sink.debug_overlay();
                    self.stats.draw_calls += 1;
                }
                FramePass::TerrainTranslucent(coords) => {
                    for &coord in coords {
                        let Some(rs) = area.get(coord) else { continue };
                        let Some(mesh) = rs.compiled.as_ref() else { continue };
                        if mesh.has_translucent() {
                            sink.section_translucent(mesh, &rs.translucent_order);
                            self.stats.draw_calls += 1;
                        }
                    }
                }
                FramePass::Clouds => {
                    sink.clouds();
                    self.stats.draw_calls += 1;
                }
                FramePass::Weather => {
                    sink.weather();
                    self.stats.draw_calls += 1;
                }
            }
        }
    }

    /// Rotating translucency resort: a 1/8 slice of the visible list per
    /// frame (never fewer than `resort_min`), plus every nearby section
    /// unconditionally. A section is only re-sorted when the camera's block
    /// position moved relative to the point of view recorded at its last
    /// sort, or when its mesh was replaced since.
    fn resort_translucency(&mut self, camera_pos: Vec3, area: &mut ViewArea) {
        let (px, py, pz) = camera_pos.floor_i32();
        let pov = (px, py, pz);

        let mut candidates: Vec<SectionCoord> = self.graph.nearby().to_vec();
        let n = self.visible.len();
        if n > 0 {
            let budget = n.div_ceil(RESORT_SPREAD_FRAMES).max(self.resort_min).min(n);
            let start = self.resort_cursor % n;
            for i in 0..budget {
                candidates.push(self.visible[(start + i) % n]);
            }
            self.resort_cursor = (start + budget) % n;
        }

        for coord in candidates {
            let Some(rs) = area.get_mut(coord) else { continue };
            let Some(mesh) = rs.compiled.clone() else { continue };
            if !mesh.has_translucent() {
                continue;
            }
            let mesh_replaced = rs.translucent_order.len() != mesh.translucent_cells.len();
            if !mesh_replaced && rs.resort_pov == Some(pov) {
                continue;
            }
            let mut order: Vec<u16> = (0..mesh.translucent_cells.len() as u16).collect();
            order.sort_by(|&a, &b| {
                let da = mesh.translucent_cells[a as usize].distance_sq(camera_pos);
                let db = mesh.translucent_cells[b as usize].distance_sq(camera_pos);
                db.total_cmp(&da)
            });
            rs.translucent_order = order;
            rs.resort_pov = Some(pov);
            self.stats.resorts += 1;
        }
    }
}
