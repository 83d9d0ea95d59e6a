use std::collections::{BTreeMap, VecDeque};

use vantage_level::{Block, SectionCoord};
use vantage_mesh::NeighborsLoaded;
use vantage_runtime::JobOut;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RebuildCause {
    PlayerEdit,
    StreamLoad,
}

pub enum Event {
    /// Camera crossed into a new section; restream the view area.
    ViewCenterChanged {
        scx: i32,
        scy: i32,
        scz: i32,
    },
    /// A block changed; layered into the edit store and fanned out as
    /// rebuild intents for the section and any bordering neighbors.
    BlockEdited {
        wx: i32,
        wy: i32,
        wz: i32,
        block: Block,
    },
    SectionRebuildRequested {
        coord: SectionCoord,
        cause: RebuildCause,
    },
    /// Intent flush decided this section gets a compile this tick.
    BuildSectionJobRequested {
        coord: SectionCoord,
        rev: u64,
        neighbors: NeighborsLoaded,
        job_id: u64,
        cause: RebuildCause,
    },
    /// A compile finished (sync or worker lane); swap the mesh in if still
    /// current.
    BuildSectionJobCompleted {
        out: JobOut,
    },
    SmartCullToggled,
}

impl Event {
    pub fn label(&self) -> &'static str {
        match self {
            Event::ViewCenterChanged { .. } => "view_center_changed",
            Event::BlockEdited { .. } => "block_edited",
            Event::SectionRebuildRequested { .. } => "section_rebuild_requested",
            Event::BuildSectionJobRequested { .. } => "build_section_job_requested",
            Event::BuildSectionJobCompleted { .. } => "build_section_job_completed",
            Event::SmartCullToggled => "smart_cull_toggled",
        }
    }
}

pub struct EventEnvelope {
    pub id: u64,
    pub tick: u64,
    pub kind: Event,
}

/// Tick-bucketed FIFO. Events emitted for a future tick sit in their bucket
/// until `now` reaches it; within a tick, delivery order is emission order.
pub struct EventQueue {
    by_tick: BTreeMap<u64, VecDeque<EventEnvelope>>,
    pub now: u64,
    next_id: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self {
            by_tick: BTreeMap::new(),
            now: 0,
            next_id: 1,
        }
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    pub fn emit_now(&mut self, kind: Event) -> u64 {
        self.emit_at(self.now, kind)
    }

    pub fn emit_at(&mut self, tick: u64, kind: Event) -> u64 {
        let id = self.alloc_id();
        let env = EventEnvelope { id, tick, kind };
        self.by_tick.entry(tick).or_default().push_back(env);
        id
    }

    pub fn emit_after(&mut self, delta: u64, kind: Event) -> u64 {
        self.emit_at(self.now + delta, kind)
    }

    pub fn pop_ready(&mut self) -> Option<EventEnvelope> {
        self.by_tick.get_mut(&self.now).and_then(|q| q.pop_front())
    }

    pub fn advance_tick(&mut self) {
        if let Some(q) = self.by_tick.get(&self.now) {
            if q.is_empty() {
                self.by_tick.remove(&self.now);
            }
        }
        self.now = self.now.wrapping_add(1);
    }

    /// Events stranded in past ticks. Always a bug in emission logic; the
    /// step loop warns when it sees any.
    pub fn count_stale_events(&self) -> usize {
        self.by_tick
            .range(..self.now)
            .map(|(_, q)| q.len())
            .sum()
    }

    pub fn queued_total(&self) -> usize {
        self.by_tick.values().map(|q| q.len()).sum()
    }

    pub fn queued_by_label(&self) -> Vec<(&'static str, usize)> {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for q in self.by_tick.values() {
            for env in q {
                *counts.entry(env.kind.label()).or_default() += 1;
            }
        }
        counts.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_is_fifo_within_a_tick() {
        let mut q = EventQueue::new();
        q.emit_now(Event::SmartCullToggled);
        q.emit_now(Event::ViewCenterChanged { scx: 1, scy: 2, scz: 3 });
        let a = q.pop_ready().unwrap();
        let b = q.pop_ready().unwrap();
        assert!(a.id < b.id);
        assert!(matches!(a.kind, Event::SmartCullToggled));
        assert!(q.pop_ready().is_none());
    }

    #[test]
    fn future_events_wait_for_their_tick() {
        let mut q = EventQueue::new();
        q.emit_after(2, Event::SmartCullToggled);
        assert!(q.pop_ready().is_none());
        q.advance_tick();
        assert!(q.pop_ready().is_none());
        q.advance_tick();
        assert!(q.pop_ready().is_some());
    }

    #[test]
    fn unprocessed_past_events_count_as_stale() {
        let mut q = EventQueue::new();
        q.emit_now(Event::SmartCullToggled);
        q.advance_tick();
        assert_eq!(q.count_stale_events(), 1);
        assert_eq!(q.queued_total(), 1);
        assert_eq!(q.queued_by_label(), vec![("smart_cull_toggled", 1)]);
    }
}
