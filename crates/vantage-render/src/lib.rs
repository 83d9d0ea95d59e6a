//! Frame orchestration: occlusion update, pass building, translucency resort.
#![forbid(unsafe_code)]

mod plan;
mod renderer;
mod sink;

pub use plan::{FramePass, FramePlan};
pub use renderer::{FrameStats, LevelRenderer, RenderOptions};
pub use sink::{RecordingSink, RenderSink, SinkCall};
