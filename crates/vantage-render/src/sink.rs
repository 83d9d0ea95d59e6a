use std::sync::Arc;

use vantage_level::{Entity, SectionCoord};
use vantage_mesh::CompiledSection;

/// Where draw calls land. The pipeline stops at this boundary; a real
/// backend would translate these into GPU work, the tests record them.
pub trait RenderSink {
    fn sky(&mut self);
    fn section_opaque(&mut self, mesh: &Arc<CompiledSection>);
    fn entity(&mut self, entity: &Entity);
    fn block_entity(&mut self, at: (i32, i32, i32));
    fn debug_overlay(&mut self);
    /// `order` indexes `mesh.translucent_cells`, far to near.
    fn section_translucent(&mut self, mesh: &Arc<CompiledSection>, order: &[u16]);
    fn clouds(&mut self);
    fn weather(&mut self);
}

#[derive(Clone, Debug, PartialEq)]
pub enum SinkCall {
    Sky,
    SectionOpaque(SectionCoord),
    Entity(u32),
    BlockEntity((i32, i32, i32)),
    DebugOverlay,
    SectionTranslucent(SectionCoord, Vec<u16>),
    Clouds,
    Weather,
}

/// Test sink: records the call sequence and keeps the mesh `Arc`s it was
/// handed, so a test can assert what a frame actually drew.
#[derive(Default)]
pub struct RecordingSink {
    pub calls: Vec<SinkCall>,
    pub meshes: Vec<Arc<CompiledSection>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opaque_sections(&self) -> Vec<SectionCoord> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SinkCall::SectionOpaque(coord) => Some(*coord),
                _ => None,
            })
            .collect()
    }

    pub fn translucent_sections(&self) -> Vec<SectionCoord> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SinkCall::SectionTranslucent(coord, _) => Some(*coord),
                _ => None,
            })
            .collect()
    }
}

impl RenderSink for RecordingSink {
    fn sky(&mut self) {
        self.calls.push(SinkCall::Sky);
    }

    fn section_opaque(&mut self, mesh: &Arc<CompiledSection>) {
        self.calls.push(SinkCall::SectionOpaque(mesh.coord));
        self.meshes.push(mesh.clone());
    }

    fn entity(&mut self, entity: &Entity) {
        self.calls.push(SinkCall::Entity(entity.id));
    }

    fn block_entity(&mut self, at: (i32, i32, i32)) {
        self.calls.push(SinkCall::BlockEntity(at));
    }

    fn debug_overlay(&mut self) {
        self.calls.push(SinkCall::DebugOverlay);
    }

    fn section_translucent(&mut self, mesh: &Arc<CompiledSection>, order: &[u16]) {
        self.calls
            .push(SinkCall::SectionTranslucent(mesh.coord, order.to_vec()));
        self.meshes.push(mesh.clone());
    }

    fn clouds(&mut self) {
        self.calls.push(SinkCall::Clouds);
    }

    fn weather(&mut self) {
        self.calls.push(SinkCall::Weather);
    }
}
