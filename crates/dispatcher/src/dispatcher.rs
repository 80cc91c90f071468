//! Top-level orchestration: pick a worker, attempt the remote exchange, fall
//! back to local compilation on transport/protocol failure if enabled.

use std::sync::Arc;

use distcc_core::{compile_local, AppConfig, CompileJob};

use crate::error::DispatchError;
use crate::pool::WorkerPool;
use crate::probe::refresh_all;
use crate::remote::{remote_compile, CompileOutcome};

pub struct Dispatcher {
    pool: Arc<WorkerPool>,
    config: AppConfig,
    local_fallback: bool,
}

impl Dispatcher {
    pub fn new(config: AppConfig, local_fallback: bool) -> Self {
        let pool = Arc::new(WorkerPool::new(config.workers.clone()));
        Self {
            pool,
            config,
            local_fallback,
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Probe every configured worker once. Cheap enough to call before every
    /// batch run and on the coordinator's `--refresh` command.
    pub async fn refresh(&self) {
        refresh_all(&self.pool, &self.config.network).await;
    }

    /// Compile one job: dispatch to the best available worker, retrying local
    /// fallback (if enabled) on any worker-health-affecting failure. Returns an
    /// error only when both remote dispatch and local fallback are unavailable
    /// or fail.
    pub async fn compile_file(&self, job: &CompileJob) -> anyhow::Result<CompileOutcome> {
        match self.try_remote(job).await {
            Ok(outcome) => Ok(outcome),
            Err(DispatchError::NoWorkersAvailable) => self.fall_back(job).await,
            Err(err) if err.is_worker_health_affecting() && self.local_fallback => {
                eprintln!("distcc: remote dispatch failed ({err}), falling back to local compile");
                self.fall_back(job).await
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn try_remote(&self, job: &CompileJob) -> Result<CompileOutcome, DispatchError> {
        let Some((idx, endpoint)) = self.pool.select_best() else {
            return Err(DispatchError::NoWorkersAvailable);
        };

        let result = remote_compile(&endpoint, &self.config.network, job).await;
        self.pool.release(idx);

        match &result {
            Ok(CompileOutcome::Success { elapsed, .. }) => self.pool.record_success(idx, *elapsed),
            Ok(CompileOutcome::CompilerFailed { .. }) => {}
            Err(e) if e.is_worker_health_affecting() => self.pool.mark_unavailable(idx),
            Err(_) => {}
        }
        result
    }

    async fn fall_back(&self, job: &CompileJob) -> anyhow::Result<CompileOutcome> {
        if !self.local_fallback {
            anyhow::bail!("no workers available and local fallback is disabled");
        }
        let outcome = compile_local(
            &job.compiler,
            &job.include_paths,
            &job.defines,
            &job.args,
            &job.source_path,
            &job.output_path,
        )
        .await?;

        if outcome.success {
            Ok(CompileOutcome::Success {
                output_path: job.output_path.clone(),
                elapsed: 0.0,
                warnings: None,
            })
        } else {
            Ok(CompileOutcome::CompilerFailed {
                returncode: outcome.returncode,
                stdout: outcome.stdout,
                stderr: outcome.stderr,
                elapsed: 0.0,
            })
        }
    }
}
