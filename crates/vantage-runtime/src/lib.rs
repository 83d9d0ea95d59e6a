//! Section compile dispatcher: stream worker pool, queues, and the sync path.
#![forbid(unsafe_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, unbounded};
use hashbrown::HashMap;
use rayon::{ThreadPool, ThreadPoolBuilder};
use vantage_level::{Block, Level, SectionCoord};
use vantage_mesh::{CompiledSection, NeighborsLoaded, compile_section};
use vantage_section::{SectionOccupancy, generate_section_buf};

/// Everything a worker needs to compile one section without touching
/// shared mutable state. Edits are snapshotted at submit time; the level
/// itself is immutable.
#[derive(Clone)]
pub struct BuildJob {
    pub coord: SectionCoord,
    pub rev: u64,
    pub job_id: u64,
    pub neighbors: NeighborsLoaded,
    /// Edits whose target cell lies inside this section, world coords.
    pub section_edits: Vec<((i32, i32, i32), Block)>,
    /// Edits in the one-cell border ring around the section, consulted for
    /// face culling against neighbors.
    pub border_edits: HashMap<(i32, i32, i32), Block>,
    pub level: Arc<Level>,
}

pub struct JobOut {
    pub coord: SectionCoord,
    pub rev: u64,
    pub job_id: u64,
    pub occupancy: SectionOccupancy,
    pub compiled: Arc<CompiledSection>,
    pub kind: JobKind,
    pub t_total_ms: u32,
    pub t_gen_ms: u32,
    pub t_apply_ms: u32,
    pub t_mesh_ms: u32,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum JobKind {
    /// Player-caused rebuild, compiled on the render thread.
    Player,
    /// Streaming rebuild, compiled on a worker lane.
    Stream,
}

#[inline]
fn ms(from: Instant) -> u32 {
    from.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

/// Stable id for one (section, rev, neighbor-mask) submission. FNV-1a over
/// the fields; collisions only risk a duplicate log line, never a wrong
/// mesh swap, since results are matched on coord and rev.
pub fn job_hash(coord: SectionCoord, rev: u64, n: NeighborsLoaded) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    let mut write = |v: u64| {
        h ^= v;
        h = h.wrapping_mul(0x100000001b3);
    };
    write(coord.sx as u64);
    write(coord.sy as u64);
    write(coord.sz as u64);
    write(rev);
    write(u64::from(n.mask()));
    h
}

/// Compile one section end to end. Used by both worker lanes and the
/// synchronous path for player-dirty sections.
pub fn run_build_job(job: &BuildJob, kind: JobKind) -> JobOut {
    let t_job_start = Instant::now();

    let t0 = Instant::now();
    let mut buf = generate_section_buf(&job.level, job.coord);
    let t_gen_ms = ms(t0);

    let t0 = Instant::now();
    let (bx, by, bz) = job.coord.base();
    for ((wx, wy, wz), b) in job.section_edits.iter().copied() {
        if buf.contains_world(wx, wy, wz) {
            buf.set_local((wx - bx) as usize, (wy - by) as usize, (wz - bz) as usize, b);
        }
    }
    let t_apply_ms = ms(t0);

    let occupancy = buf.occupancy();
    if occupancy.is_empty() {
        return JobOut {
            coord: job.coord,
            rev: job.rev,
            job_id: job.job_id,
            occupancy,
            compiled: Arc::new(CompiledSection::empty(job.coord)),
            kind,
            t_total_ms: ms(t_job_start),
            t_gen_ms,
            t_apply_ms,
            t_mesh_ms: 0,
        };
    }

    let t0 = Instant::now();
    let level = &job.level;
    let border = &job.border_edits;
    let compiled = compile_section(&buf, level.palette(), |wx, wy, wz| {
        border
            .get(&(wx, wy, wz))
            .copied()
            .unwrap_or_else(|| level.block_at(wx, wy, wz))
    });
    let t_mesh_ms = ms(t0);

    JobOut {
        coord: job.coord,
        rev: job.rev,
        job_id: job.job_id,
        occupancy,
        compiled: Arc::new(compiled),
        kind,
        t_total_ms: ms(t_job_start),
        t_gen_ms,
        t_apply_ms,
        t_mesh_ms,
    }
}

/// Owns the stream worker pool and the result channel. Player and nearby
/// rebuilds run on the frame thread via `compile_now`; far streaming
/// rebuilds share the remaining cores so a burst of loads never blocks a
/// frame.
pub struct SectionDispatcher {
    job_tx_stream: Sender<BuildJob>,
    res_tx: Sender<JobOut>,
    res_rx: Receiver<JobOut>,
    _stream_pool: Arc<ThreadPool>,
    q_stream: Arc<AtomicUsize>,
    inflight_stream: Arc<AtomicUsize>,
    pub w_stream: usize,
}

impl SectionDispatcher {
    pub fn new() -> Self {
        let (job_tx_stream, job_rx_stream) = unbounded::<BuildJob>();
        let (res_tx, res_rx) = unbounded::<JobOut>();

        let worker_count: usize = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(8);
        // One core stays with the frame thread for the sync compiles.
        let w_stream = worker_count.saturating_sub(1).max(1);

        let q_stream_ctr = Arc::new(AtomicUsize::new(0));
        let inflight_stream_ctr = Arc::new(AtomicUsize::new(0));

        let stream_pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(w_stream)
                .thread_name(|i| format!("vantage-stream-{i}"))
                .build()
                .expect("stream pool"),
        );
        for _ in 0..w_stream {
            let rx = job_rx_stream.clone();
            let tx = res_tx.clone();
            let q = q_stream_ctr.clone();
            let inflight = inflight_stream_ctr.clone();
            stream_pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    q.fetch_sub(1, Ordering::Relaxed);
                    inflight.fetch_add(1, Ordering::Relaxed);
                    let out = run_build_job(&job, JobKind::Stream);
                    inflight.fetch_sub(1, Ordering::Relaxed);
                    let _ = tx.send(out);
                }
            });
        }

        Self {
            job_tx_stream,
            res_tx,
            res_rx,
            _stream_pool: stream_pool,
            q_stream: q_stream_ctr,
            inflight_stream: inflight_stream_ctr,
            w_stream,
        }
    }

    /// Compile on the calling thread and push the result into the same
    /// channel the lanes use, so the frame's drain sees sync and async
    /// output uniformly.
    pub fn compile_now(&self, job: &BuildJob) {
        let out = run_build_job(job, JobKind::Player);
        let _ = self.res_tx.send(out);
    }

    pub fn submit_stream(&self, job: BuildJob) {
        self.q_stream.fetch_add(1, Ordering::Relaxed);
        if self.job_tx_stream.send(job).is_err() {
            self.q_stream.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Non-blocking drain of everything finished since the last call.
    pub fn drain_results(&self) -> Vec<JobOut> {
        self.res_rx.try_iter().collect()
    }

    /// (queued stream, inflight stream).
    pub fn queue_debug_counts(&self) -> (usize, usize) {
        (
            self.q_stream.load(Ordering::Relaxed),
            self.inflight_stream.load(Ordering::Relaxed),
        )
    }
}

impl Default for SectionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vantage_level::{BlockPalette, TerrainParams};

    fn flat_level() -> Arc<Level> {
        Arc::new(Level::new(
            Arc::new(BlockPalette::default()),
            TerrainParams {
                seed: 7,
                ground_level: 8,
                amplitude: 0.0,
                height_frequency: 0.01,
                water_level: 0,
            },
        ))
    }

    fn job(level: &Arc<Level>, coord: SectionCoord, rev: u64) -> BuildJob {
        BuildJob {
            coord,
            rev,
            job_id: job_hash(coord, rev, NeighborsLoaded::ALL),
            neighbors: NeighborsLoaded::ALL,
            section_edits: Vec::new(),
            border_edits: HashMap::new(),
            level: level.clone(),
        }
    }

    fn drain_until(d: &SectionDispatcher, want: usize) -> Vec<JobOut> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut outs = Vec::new();
        while outs.len() < want && Instant::now() < deadline {
            outs.extend(d.drain_results());
            thread::sleep(Duration::from_millis(5));
        }
        outs
    }

    #[test]
    fn sync_compile_lands_in_result_channel() {
        let level = flat_level();
        let d = SectionDispatcher::new();
        let coord = SectionCoord::new(0, 0, 0);
        d.compile_now(&job(&level, coord, 1));
        let outs = d.drain_results();
        assert_eq!(outs.len(), 1);
        assert_eq!(outs[0].coord, coord);
        assert_eq!(outs[0].rev, 1);
        assert_eq!(outs[0].kind, JobKind::Player);
        assert!(outs[0].occupancy.has_blocks());
        assert!(outs[0].compiled.opaque_quads > 0);
    }

    #[test]
    fn stream_lane_compiles_async() {
        let level = flat_level();
        let d = SectionDispatcher::new();
        for sx in 0..4 {
            d.submit_stream(job(&level, SectionCoord::new(sx, 0, 0), 1));
        }
        let outs = drain_until(&d, 4);
        assert_eq!(outs.len(), 4);
        assert!(outs.iter().all(|o| o.kind == JobKind::Stream));
        assert_eq!(d.queue_debug_counts(), (0, 0));
    }

    #[test]
    fn empty_section_reports_empty_occupancy() {
        let level = flat_level();
        let d = SectionDispatcher::new();
        // Section well above the flat ground is all air.
        let coord = SectionCoord::new(0, 4, 0);
        d.compile_now(&job(&level, coord, 3));
        let outs = d.drain_results();
        assert_eq!(outs.len(), 1);
        assert!(outs[0].occupancy.is_empty());
        assert!(!outs[0].compiled.has_renderable());
    }

    #[test]
    fn section_edits_apply_before_compile() {
        let level = flat_level();
        let coord = SectionCoord::new(0, 4, 0);
        let mut j = job(&level, coord, 2);
        let (bx, by, bz) = coord.base();
        j.section_edits.push(((bx + 4, by + 4, bz + 4), Block { id: 1 }));
        let d = SectionDispatcher::new();
        d.compile_now(&j);
        let outs = d.drain_results();
        assert_eq!(outs[0].compiled.opaque_quads, 6);
        assert!(outs[0].occupancy.has_blocks());
    }

    #[test]
    fn border_edits_cull_shared_faces() {
        let level = flat_level();
        let coord = SectionCoord::new(0, 4, 0);
        let (bx, by, bz) = coord.base();
        let mut j = job(&level, coord, 2);
        // A block on the section's -x border face, plus an edit just
        // outside covering that face.
        j.section_edits.push(((bx, by + 4, bz + 4), Block { id: 1 }));
        j.border_edits.insert((bx - 1, by + 4, bz + 4), Block { id: 1 });
        let d = SectionDispatcher::new();
        d.compile_now(&j);
        let outs = d.drain_results();
        assert_eq!(outs[0].compiled.opaque_quads, 5);
    }
}
