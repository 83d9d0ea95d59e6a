use std::collections::VecDeque;
use std::sync::Arc;

use hashbrown::HashMap;

use vantage_graph::ViewArea;
use vantage_level::{EditStore, Entity, Level, SectionCoord};
use vantage_render::{LevelRenderer, RenderOptions};
use vantage_runtime::SectionDispatcher;

use crate::camera::{CameraScript, FlyCamera};
use crate::config::RenderConfig;
use crate::event::EventQueue;

pub struct App {
    pub level: Arc<Level>,
    pub edits: EditStore,
    pub entities: Vec<Entity>,
    pub area: ViewArea,
    pub renderer: LevelRenderer,
    pub dispatcher: SectionDispatcher,
    pub queue: EventQueue,
    pub cam: FlyCamera,
    pub script: CameraScript,
    pub options: RenderOptions,
    pub cfg: RenderConfig,
    pub debug_stats: DebugStats,
    pub(crate) intents: HashMap<SectionCoord, IntentEntry>,
    pub(crate) inflight_rev: HashMap<SectionCoord, u64>,
    pub(crate) perf_mesh_ms: VecDeque<u32>,
    pub(crate) perf_total_ms: VecDeque<u32>,
}

#[derive(Default)]
pub struct DebugStats {
    pub sections_resident: usize,
    pub sections_visible: usize,
    pub sections_rendered: usize,
    pub sections_culled: usize,
    pub sections_empty: usize,
    pub draw_calls: usize,
    pub resorts: usize,
    pub queued_events_total: usize,
    pub queued_events_by: Vec<(&'static str, usize)>,
    pub intents_size: usize,
    pub inflight_size: usize,
    pub q_stream: usize,
    pub inflight_stream: usize,
    pub edit_block_edits: usize,
}

/// Lower discriminant wins when intents merge.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub(crate) enum IntentCause {
    PlayerEdit = 0,
    StreamLoad = 1,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct IntentEntry {
    pub(crate) rev: u64,
    pub(crate) cause: IntentCause,
    pub(crate) last_tick: u64,
}

const PERF_WINDOW: usize = 240;

impl App {
    pub(crate) fn perf_push(window: &mut VecDeque<u32>, sample: u32) {
        if window.len() == PERF_WINDOW {
            window.pop_front();
        }
        window.push_back(sample);
    }

    pub(crate) fn update_debug_stats(&mut self) {
        let fs = &self.renderer.stats;
        self.debug_stats.sections_visible = fs.sections_visible;
        self.debug_stats.sections_rendered = fs.sections_rendered;
        self.debug_stats.sections_culled = fs.sections_culled;
        self.debug_stats.sections_empty = fs.sections_empty;
        self.debug_stats.draw_calls = fs.draw_calls;
        self.debug_stats.resorts = fs.resorts;
        self.debug_stats.sections_resident = self
            .area
            .iter()
            .filter(|rs| rs.compiled.is_some())
            .count();
        self.debug_stats.queued_events_total = self.queue.queued_total();
        self.debug_stats.queued_events_by = self.queue.queued_by_label();
        self.debug_stats.intents_size = self.intents.len();
        self.debug_stats.inflight_size = self.inflight_rev.len();
        let (qs, is) = self.dispatcher.queue_debug_counts();
        self.debug_stats.q_stream = qs;
        self.debug_stats.inflight_stream = is;
        self.debug_stats.edit_block_edits = self.edits.stats().block_edits;
    }

    /// Sections still waiting on a compile, for convergence checks.
    pub fn pending_sections(&self) -> usize {
        self.intents.len() + self.inflight_rev.len()
    }
}
