//! Local compilation: used as fallback by the wrapper and the dispatcher when
//! no remote worker can take the job, and directly by the coordinator's
//! `--test` path when no workers are configured at all.

use std::path::Path;

use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct LocalCompileOutcome {
    pub success: bool,
    pub returncode: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Run `compiler` (resolved via the process search path, exactly like invoking
/// it from a shell) against `source`, writing `output`.
pub async fn compile_local(
    compiler: &str,
    include_paths: &[String],
    defines: &[String],
    args: &[String],
    source: &Path,
    output: &Path,
) -> anyhow::Result<LocalCompileOutcome> {
    let mut cmd = Command::new(compiler);
    for inc in include_paths {
        cmd.arg("-I").arg(inc);
    }
    for define in defines {
        cmd.arg("-D").arg(define);
    }
    cmd.args(args);
    cmd.arg("-c").arg(source);
    cmd.arg("-o").arg(output);

    let output_result = cmd
        .output()
        .await
        .map_err(|e| anyhow::anyhow!("spawning local compiler {compiler:?}: {e}"))?;

    Ok(LocalCompileOutcome {
        success: output_result.status.success(),
        returncode: output_result.status.code().unwrap_or(1),
        stdout: String::from_utf8_lossy(&output_result.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output_result.stderr).into_owned(),
    })
}

/// Run a full, untouched argument vector locally (the wrapper's "not a compile
/// job, or distribution disabled" path) and return just its exit code.
pub async fn run_local_passthrough(compiler: &str, args: &[String]) -> anyhow::Result<i32> {
    let status = Command::new(compiler)
        .args(args)
        .status()
        .await
        .map_err(|e| anyhow::anyhow!("spawning local compiler {compiler:?}: {e}"))?;
    Ok(status.code().unwrap_or(1))
}
