use vantage_level::SectionCoord;
use vantage_runtime::job_hash;

use super::App;
use super::state::{IntentCause, IntentEntry};
use crate::event::{Event, RebuildCause};

impl App {
    /// Merge a rebuild wish into the intent map. Priority never downgrades
    /// and the revision never goes backwards.
    pub(super) fn record_intent(&mut self, coord: SectionCoord, rev: u64, cause: IntentCause) {
        let now = self.queue.now;
        self.intents
            .entry(coord)
            .and_modify(|e| {
                e.rev = e.rev.max(rev);
                e.cause = e.cause.min(cause);
                e.last_tick = now;
            })
            .or_insert(IntentEntry {
                rev,
                cause,
                last_tick: now,
            });
    }

    /// Turn queued intents into build jobs, highest priority and nearest
    /// first, holding the stream pool at its inflight target so the queue
    /// never runs deep.
    pub(super) fn flush_intents(&mut self) {
        if self.intents.is_empty() {
            return;
        }
        let center = SectionCoord::of_position(self.cam.position);
        let mut items: Vec<(SectionCoord, IntentEntry, i64)> = self
            .intents
            .iter()
            .map(|(c, e)| (*c, *e, center.distance_sq(*c)))
            .collect();
        items.sort_by_key(|(_, e, d)| (e.cause, *d));

        let (q_s, if_s) = self.dispatcher.queue_debug_counts();
        let target_stream = self.dispatcher.w_stream * self.cfg.inflight_per_worker;
        // Player compiles run on the frame thread; cap the per-frame burst.
        let mut budget_player = self.cfg.inflight_per_worker.max(1);
        let mut budget_stream = target_stream.saturating_sub(q_s + if_s);
        let r = self.cfg.view_radius_sections.max(0);
        let gate_stream_sq = i64::from(r) * i64::from(r) * 3;

        let mut submitted: Vec<SectionCoord> = Vec::new();
        for (coord, ent, dist_sq) in items {
            if self
                .inflight_rev
                .get(&coord)
                .map(|v| *v >= ent.rev)
                .unwrap_or(false)
            {
                continue;
            }
            match ent.cause {
                IntentCause::PlayerEdit => {
                    if budget_player == 0 {
                        continue;
                    }
                }
                IntentCause::StreamLoad => {
                    if dist_sq > gate_stream_sq {
                        continue;
                    }
                    if budget_stream == 0 {
                        continue;
                    }
                }
            }
            let neighbors = self.neighbor_mask(coord);
            let job_id = job_hash(coord, ent.rev, neighbors);
            let cause = match ent.cause {
                IntentCause::PlayerEdit => RebuildCause::PlayerEdit,
                IntentCause::StreamLoad => RebuildCause::StreamLoad,
            };
            self.queue.emit_after(
                1,
                Event::BuildSectionJobRequested {
                    coord,
                    rev: ent.rev,
                    neighbors,
                    job_id,
                    cause,
                },
            );
            self.inflight_rev.insert(coord, ent.rev);
            submitted.push(coord);
            match ent.cause {
                IntentCause::PlayerEdit => budget_player -= 1,
                IntentCause::StreamLoad => budget_stream -= 1,
            }
        }
        for c in submitted {
            self.intents.remove(&c);
        }
    }
}
