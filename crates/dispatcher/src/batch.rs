//! Batch scheduling: bounded-parallelism fan-out over many jobs, relying on
//! the pool's shared selection state for natural load-spreading rather than a
//! per-worker queue.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use distcc_core::CompileJob;
use tokio::task::JoinSet;

use crate::dispatcher::Dispatcher;
use crate::remote::CompileOutcome;

/// Default parallelism: the sum of available workers' cpus, floored at 4 so a
/// batch run is still useful with zero or tiny pools.
pub fn default_parallelism(dispatcher: &Dispatcher) -> usize {
    (dispatcher.pool().available_cpus() as usize).max(4)
}

/// Compile every job in `jobs`, running at most `max_parallel` at a time.
/// Returns each job's outcome keyed by its source path; a job whose dispatch
/// errored entirely (no remote worker, no fallback) maps to `Err` with its
/// message.
pub async fn compile_many(
    dispatcher: Arc<Dispatcher>,
    jobs: Vec<CompileJob>,
    max_parallel: usize,
) -> BTreeMap<PathBuf, Result<CompileOutcome, String>> {
    compile_many_with_progress(dispatcher, jobs, max_parallel, |_, _| {}).await
}

/// Same as [`compile_many`], calling `on_complete(job_id, &outcome)` as each
/// job finishes — lets a caller drive a progress indicator without polling.
pub async fn compile_many_with_progress(
    dispatcher: Arc<Dispatcher>,
    jobs: Vec<CompileJob>,
    max_parallel: usize,
    on_complete: impl Fn(&str, &Result<CompileOutcome, String>),
) -> BTreeMap<PathBuf, Result<CompileOutcome, String>> {
    let max_parallel = max_parallel.max(1);
    let mut results = BTreeMap::new();
    let mut pending = jobs.into_iter();
    let mut tasks: JoinSet<(String, PathBuf, Result<CompileOutcome, String>)> = JoinSet::new();

    for job in pending.by_ref().take(max_parallel) {
        spawn_job(&mut tasks, dispatcher.clone(), job);
    }

    while let Some(joined) = tasks.join_next().await {
        if let Ok((job_id, source_path, outcome)) = joined {
            on_complete(&job_id, &outcome);
            results.insert(source_path, outcome);
        }
        if let Some(job) = pending.next() {
            spawn_job(&mut tasks, dispatcher.clone(), job);
        }
    }

    results
}

fn spawn_job(
    tasks: &mut JoinSet<(String, PathBuf, Result<CompileOutcome, String>)>,
    dispatcher: Arc<Dispatcher>,
    job: CompileJob,
) {
    tasks.spawn(async move {
        let job_id = job.job_id.clone();
        let source_path = job.source_path.clone();
        let outcome = dispatcher.compile_file(&job).await.map_err(|e| e.to_string());
        (job_id, source_path, outcome)
    });
}
