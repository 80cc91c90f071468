//! The worker pool: the only shared mutable structure in the dispatcher.
//! Every read/write to a [`WorkerState`]'s dynamic fields goes through a
//! single `std::sync::Mutex`, held only for the selection/mutation itself —
//! never across a socket or subprocess call.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use distcc_core::WorkerEndpoint;

/// Dynamic, per-worker state.
#[derive(Debug, Clone)]
pub struct WorkerState {
    pub endpoint: WorkerEndpoint,
    pub available: bool,
    pub cpus: u32,
    pub load: f64,
    pub arch: String,
    pub active_jobs: u32,
    pub total_jobs: u64,
    pub total_time: f64,
    pub last_check: Option<DateTime<Utc>>,
}

impl WorkerState {
    fn new(endpoint: WorkerEndpoint) -> Self {
        let cpus = endpoint.cpus.max(1);
        Self {
            endpoint,
            available: false,
            cpus,
            load: 0.0,
            arch: "unknown".to_string(),
            active_jobs: 0,
            total_jobs: 0,
            total_time: 0.0,
            last_check: None,
        }
    }

    /// `score(w) = w.weight * w.cpus / (1 + w.load + w.active_jobs)`.
    fn score(&self) -> f64 {
        self.endpoint.weight * self.cpus as f64 / (1.0 + self.load + self.active_jobs as f64)
    }
}

struct PoolInner {
    workers: Vec<WorkerState>,
    job_counter: u64,
}

pub struct WorkerPool {
    inner: Mutex<PoolInner>,
}

impl WorkerPool {
    pub fn new(endpoints: Vec<WorkerEndpoint>) -> Self {
        Self {
            inner: Mutex::new(PoolInner {
                workers: endpoints.into_iter().map(WorkerState::new).collect(),
                job_counter: 0,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A point-in-time copy of every worker's state, in configured order.
    pub fn snapshot(&self) -> Vec<WorkerState> {
        self.inner.lock().unwrap().workers.clone()
    }

    /// Mint a unique job id, e.g. `job-000123`, under the same mutex as the
    /// worker state it accompanies.
    pub fn next_job_id(&self) -> String {
        let mut inner = self.inner.lock().unwrap();
        inner.job_counter += 1;
        format!("job-{:06}", inner.job_counter)
    }

    /// Select the best available worker by score, incrementing its
    /// `active_jobs` before releasing the lock so a concurrent selection sees
    /// the updated count. Ties go to the earliest position in the configured
    /// list (`Vec::iter` + `max_by` keeps the *last* max on ties, so we scan in
    /// reverse to keep the first).
    pub fn select_best(&self) -> Option<(usize, WorkerEndpoint)> {
        let mut inner = self.inner.lock().unwrap();
        let best_idx = inner
            .workers
            .iter()
            .enumerate()
            .filter(|(_, w)| w.available)
            .rev()
            .max_by(|(_, a), (_, b)| {
                a.score()
                    .partial_cmp(&b.score())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(idx, _)| idx)?;

        inner.workers[best_idx].active_jobs += 1;
        Some((best_idx, inner.workers[best_idx].endpoint.clone()))
    }

    /// Release the job slot taken by [`Self::select_best`]. Must be called on
    /// every exit path of a dispatch attempt, success or failure.
    pub fn release(&self, idx: usize) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(w) = inner.workers.get_mut(idx) {
            w.active_jobs = w.active_jobs.saturating_sub(1);
        }
    }

    /// Record a successfully completed remote job.
    pub fn record_success(&self, idx: usize, remote_elapsed_secs: f64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(w) = inner.workers.get_mut(idx) {
            w.total_jobs += 1;
            w.total_time += remote_elapsed_secs;
        }
    }

    /// Mark a worker unavailable after a transport/protocol failure; it is
    /// skipped by future selections until the next [`Self::apply_probe_result`].
    pub fn mark_unavailable(&self, idx: usize) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(w) = inner.workers.get_mut(idx) {
            w.available = false;
        }
    }

    /// Apply the outcome of a probe: success refreshes dynamic fields and sets
    /// `available = true`; failure sets `available = false`.
    pub fn apply_probe_result(&self, idx: usize, result: Option<distcc_protocol::SystemInfo>) {
        let mut inner = self.inner.lock().unwrap();
        let Some(w) = inner.workers.get_mut(idx) else {
            return;
        };
        w.last_check = Some(Utc::now());
        match result {
            Some(info) => {
                w.available = true;
                w.cpus = info.cpus.max(1);
                w.load = info.load;
                w.arch = info.arch;
            }
            None => w.available = false,
        }
    }

    /// Sum of `cpus` across currently-available workers (used by the batch
    /// scheduler's default parallelism).
    pub fn available_cpus(&self) -> u32 {
        self.inner
            .lock()
            .unwrap()
            .workers
            .iter()
            .filter(|w| w.available)
            .map(|w| w.cpus)
            .sum()
    }

    pub fn endpoint_at(&self, idx: usize) -> Option<WorkerEndpoint> {
        self.inner
            .lock()
            .unwrap()
            .workers
            .get(idx)
            .map(|w| w.endpoint.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(host: &str, weight: f64, cpus: u32) -> WorkerEndpoint {
        WorkerEndpoint {
            host: host.to_string(),
            port: 5555,
            name: host.to_string(),
            weight,
            cpus,
        }
    }

    fn make_available(pool: &WorkerPool, idx: usize, cpus: u32, load: f64) {
        pool.apply_probe_result(
            idx,
            Some(distcc_protocol::SystemInfo {
                hostname: "h".to_string(),
                arch: "ppc".to_string(),
                cpus,
                load,
            }),
        );
    }

    #[test]
    fn selection_prefers_lower_active_jobs_when_otherwise_equal() {
        let pool = WorkerPool::new(vec![endpoint("a", 1.0, 2), endpoint("b", 1.0, 2)]);
        make_available(&pool, 0, 2, 0.0);
        make_available(&pool, 1, 2, 0.0);

        // Bump worker 0's active_jobs above worker 1's.
        let (idx, _) = pool.select_best().unwrap();
        assert_eq!(idx, 0); // tie-break: earliest position wins
        pool.release(idx); // back to parity... give worker 0 an extra job instead:
        let _ = pool.select_best().unwrap();
        // worker 0 now has active_jobs=1, worker 1 has 0 -> worker 1 should win
        let (idx2, endpoint2) = pool.select_best().unwrap();
        assert_eq!(idx2, 1);
        assert_eq!(endpoint2.host, "b");
    }

    #[test]
    fn selection_prefers_higher_weight() {
        let pool = WorkerPool::new(vec![endpoint("slow", 1.0, 2), endpoint("fast", 2.0, 2)]);
        make_available(&pool, 0, 2, 0.0);
        make_available(&pool, 1, 2, 0.0);

        let (idx, endpoint) = pool.select_best().unwrap();
        assert_eq!(idx, 1);
        assert_eq!(endpoint.host, "fast");
    }

    #[test]
    fn selection_prefers_lower_load() {
        let pool = WorkerPool::new(vec![endpoint("busy", 1.0, 2), endpoint("idle", 1.0, 2)]);
        make_available(&pool, 0, 2, 5.0);
        make_available(&pool, 1, 2, 0.0);

        let (idx, endpoint) = pool.select_best().unwrap();
        assert_eq!(idx, 1);
        assert_eq!(endpoint.host, "idle");
    }

    #[test]
    fn selection_ties_break_to_earliest_position() {
        let pool = WorkerPool::new(vec![endpoint("first", 1.0, 2), endpoint("second", 1.0, 2)]);
        make_available(&pool, 0, 2, 0.0);
        make_available(&pool, 1, 2, 0.0);

        let (idx, endpoint) = pool.select_best().unwrap();
        assert_eq!(idx, 0);
        assert_eq!(endpoint.host, "first");
    }

    #[test]
    fn selection_returns_none_when_no_worker_available() {
        let pool = WorkerPool::new(vec![endpoint("a", 1.0, 2)]);
        assert!(pool.select_best().is_none());
    }

    #[test]
    fn active_jobs_never_goes_negative_on_repeated_release() {
        let pool = WorkerPool::new(vec![endpoint("a", 1.0, 2)]);
        make_available(&pool, 0, 2, 0.0);
        pool.release(0);
        pool.release(0);
        let snap = pool.snapshot();
        assert_eq!(snap[0].active_jobs, 0);
    }

    #[test]
    fn job_ids_are_unique_and_increasing() {
        let pool = WorkerPool::new(vec![]);
        let a = pool.next_job_id();
        let b = pool.next_job_id();
        assert_ne!(a, b);
        assert_eq!(a, "job-000001");
        assert_eq!(b, "job-000002");
    }

    #[test]
    fn failed_probe_marks_worker_unavailable() {
        let pool = WorkerPool::new(vec![endpoint("a", 1.0, 2)]);
        make_available(&pool, 0, 2, 0.0);
        assert!(pool.snapshot()[0].available);
        pool.apply_probe_result(0, None);
        assert!(!pool.snapshot()[0].available);
    }
}
