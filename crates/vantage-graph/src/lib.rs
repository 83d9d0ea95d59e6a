//! View area bookkeeping and the incremental section occlusion graph.
#![forbid(unsafe_code)]

mod occlusion;
mod view_area;

pub use occlusion::SectionOcclusionGraph;
pub use view_area::{RenderSection, ViewArea};
