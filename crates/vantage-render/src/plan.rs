use vantage_level::{Entity, SectionCoord};

/// One ordered step of the frame. Terrain passes carry section coords, not
/// meshes; the executor resolves coords against the view area at draw time
/// so a mesh swapped in mid-frame never tears (the `Arc` it resolves is
/// whatever was current when the pass runs).
#[derive(Clone, Debug, PartialEq)]
pub enum FramePass {
    Sky,
    /// Near to far, BFS discovery order.
    TerrainOpaque(Vec<SectionCoord>),
    Entities(Vec<Entity>),
    /// World coords of block-entity cells in visible sections.
    BlockEntities(Vec<(i32, i32, i32)>),
    Debug,
    /// Far to near so blending composes back to front.
    TerrainTranslucent(Vec<SectionCoord>),
    Clouds,
    Weather,
}

impl FramePass {
    pub fn name(&self) -> &'static str {
        match self {
            FramePass::Sky => "sky",
            FramePass::TerrainOpaque(_) => "terrain_opaque",
            FramePass::Entities(_) => "entities",
            FramePass::BlockEntities(_) => "block_entities",
            FramePass::Debug => "debug",
            FramePass::TerrainTranslucent(_) => "terrain_translucent",
            FramePass::Clouds => "clouds",
            FramePass::Weather => "weather",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FramePlan {
    pub passes: Vec<FramePass>,
}

impl FramePlan {
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(FramePass::name).collect()
    }
}
