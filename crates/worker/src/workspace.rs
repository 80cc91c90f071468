//! Per-job scratch directories: created on job receipt, destroyed
//! unconditionally on every exit path.

use std::path::PathBuf;

use rand::Rng;

pub struct Workspace {
    pub path: PathBuf,
}

impl Workspace {
    /// Create a fresh directory under the system temp dir with a random
    /// suffix, so concurrent jobs never share one.
    pub async fn create() -> std::io::Result<Self> {
        let suffix: u64 = rand::thread_rng().gen();
        let path = std::env::temp_dir().join(format!("distcc-worker-{:016x}", suffix));
        tokio::fs::create_dir_all(&path).await?;
        Ok(Self { path })
    }

    /// Best-effort recursive removal; failures are logged and swallowed
    /// rather than propagated, since a stuck workspace shouldn't fail the job
    /// that already completed.
    pub async fn cleanup(self) {
        if let Err(e) = tokio::fs::remove_dir_all(&self.path).await {
            eprintln!("distcc-worker: failed to remove workspace {}: {e}", self.path.display());
        }
    }
}
