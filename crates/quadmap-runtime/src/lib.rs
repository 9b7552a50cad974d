//! Background chunk rebuilds on a fixed pool of worker threads.
#![forbid(unsafe_code)]

mod pool;

use std::thread;

use quadmap_render::{ChunkBuildJob, ChunkBuildResult, RebuildQueue};

use crate::pool::WorkerPool;

/// Half the available parallelism, at least one.
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get() / 2)
        .unwrap_or(1)
        .max(1)
}

/// Runs `ChunkBuildJob`s off the render thread. Results come back in
/// completion order through [`JobSystem::poll`].
pub struct JobSystem {
    pool: WorkerPool<ChunkBuildJob, ChunkBuildResult>,
}

impl JobSystem {
    pub fn new() -> Self {
        Self::with_workers(default_worker_count())
    }

    /// `workers == 0` picks the default size.
    pub fn with_workers(workers: usize) -> Self {
        let workers = if workers == 0 {
            default_worker_count()
        } else {
            workers
        };
        let pool = WorkerPool::spawn("quadmap-chunk", workers, |job: ChunkBuildJob| job.run());
        log::info!(target: "jobs", "chunk job system started with {} workers", pool.worker_count());
        Self { pool }
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Queues a rebuild without blocking. Returns `false` once stopped.
    pub fn submit(&self, job: ChunkBuildJob) -> bool {
        let key = job.key;
        let ok = self.pool.submit(job);
        if !ok {
            log::debug!(target: "jobs", "rejected job for {key:?}: system stopped");
        }
        ok
    }

    /// Drains every finished result without blocking.
    pub fn poll(&self) -> Vec<ChunkBuildResult> {
        self.pool.poll()
    }

    /// Stops accepting work, drops queued jobs and joins the workers.
    /// Jobs already running finish first.
    pub fn stop(&self) {
        if self.pool.is_stopped() {
            return;
        }
        self.pool.stop();
        let (_, _, completed, dropped) = self.pool.counts();
        log::info!(target: "jobs", "chunk job system stopped: {completed} built, {dropped} dropped");
    }

    pub fn is_stopped(&self) -> bool {
        self.pool.is_stopped()
    }

    /// (queued, in flight, completed, dropped)
    pub fn queue_debug_counts(&self) -> (usize, usize, usize, usize) {
        self.pool.counts()
    }
}

impl Default for JobSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for JobSystem {
    fn drop(&mut self) {
        self.stop();
    }
}

impl RebuildQueue for JobSystem {
    fn submit(&self, job: ChunkBuildJob) -> bool {
        JobSystem::submit(self, job)
    }

    fn poll(&self) -> Vec<ChunkBuildResult> {
        JobSystem::poll(self)
    }

    fn is_open(&self) -> bool {
        !self.is_stopped()
    }
}
