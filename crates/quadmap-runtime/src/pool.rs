use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};

#[derive(Default)]
struct Counters {
    queued: AtomicUsize,
    inflight: AtomicUsize,
    completed: AtomicUsize,
    dropped: AtomicUsize,
}

/// Fixed set of named threads draining one job channel into one result
/// channel.
pub(crate) struct WorkerPool<J, R> {
    job_tx: Mutex<Option<Sender<J>>>,
    res_rx: Receiver<R>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    shutdown: Arc<AtomicBool>,
    counters: Arc<Counters>,
    worker_count: usize,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl<J, R> WorkerPool<J, R>
where
    J: Send + 'static,
    R: Send + 'static,
{
    pub(crate) fn spawn<F>(name: &str, workers: usize, run: F) -> Self
    where
        F: Fn(J) -> R + Send + Sync + 'static,
    {
        let (job_tx, job_rx) = unbounded::<J>();
        let (res_tx, res_rx) = unbounded::<R>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let counters = Arc::new(Counters::default());
        let run = Arc::new(run);

        let mut handles = Vec::with_capacity(workers);
        for i in 0..workers.max(1) {
            let rx = job_rx.clone();
            let tx = res_tx.clone();
            let shutdown = Arc::clone(&shutdown);
            let counters = Arc::clone(&counters);
            let run = Arc::clone(&run);
            let spawned = thread::Builder::new()
                .name(format!("{name}-{i}"))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        counters.queued.fetch_sub(1, Ordering::Relaxed);
                        if shutdown.load(Ordering::Acquire) {
                            counters.dropped.fetch_add(1, Ordering::Relaxed);
                            drop(job);
                            break;
                        }
                        counters.inflight.fetch_add(1, Ordering::Relaxed);
                        let out = run(job);
                        counters.inflight.fetch_sub(1, Ordering::Relaxed);
                        counters.completed.fetch_add(1, Ordering::Relaxed);
                        if tx.send(out).is_err() {
                            break;
                        }
                    }
                });
            match spawned {
                Ok(h) => handles.push(h),
                Err(e) => log::warn!(target: "jobs", "failed to spawn worker {name}-{i}: {e}"),
            }
        }
        if handles.is_empty() {
            log::error!(target: "jobs", "no {name} workers could be started");
        }
        let worker_count = handles.len();

        Self {
            job_tx: Mutex::new((worker_count > 0).then_some(job_tx)),
            res_rx,
            workers: Mutex::new(handles),
            shutdown,
            counters,
            worker_count,
        }
    }

    /// Queues a job; `false` once the pool is stopped or has no workers.
    pub(crate) fn submit(&self, job: J) -> bool {
        if self.shutdown.load(Ordering::Acquire) {
            return false;
        }
        let guard = lock(&self.job_tx);
        let Some(tx) = guard.as_ref() else {
            return false;
        };
        self.counters.queued.fetch_add(1, Ordering::Relaxed);
        if tx.send(job).is_err() {
            self.counters.queued.fetch_sub(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    pub(crate) fn poll(&self) -> Vec<R> {
        self.res_rx.try_iter().collect()
    }

    /// Raises the shutdown flag, closes the queue and joins every worker.
    /// Idempotent.
    pub(crate) fn stop(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        drop(lock(&self.job_tx).take());
        let handles: Vec<_> = lock(&self.workers).drain(..).collect();
        for h in handles {
            if h.join().is_err() {
                log::warn!(target: "jobs", "worker panicked before shutdown");
            }
        }
        let left = self.counters.queued.swap(0, Ordering::Relaxed);
        self.counters.dropped.fetch_add(left, Ordering::Relaxed);
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// (queued, in flight, completed, dropped)
    pub(crate) fn counts(&self) -> (usize, usize, usize, usize) {
        (
            self.counters.queued.load(Ordering::Relaxed),
            self.counters.inflight.load(Ordering::Relaxed),
            self.counters.completed.load(Ordering::Relaxed),
            self.counters.dropped.load(Ordering::Relaxed),
        )
    }
}

impl<J, R> Drop for WorkerPool<J, R> {
    fn drop(&mut self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        drop(lock(&self.job_tx).take());
        for h in lock(&self.workers).drain(..) {
            let _ = h.join();
        }
    }
}
