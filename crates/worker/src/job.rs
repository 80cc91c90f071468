//! The job state machine: ReceivedJob -> ReceivedSource -> ReceivedHeaders ->
//! Compiling -> {Succeeded | Failed}.

use std::collections::BTreeMap;
use std::path::Path;

use distcc_core::{resolve_compiler, CompilerExecutable, CompilerSpec};
use distcc_protocol::{decode_headers, read_expected, write_frame, JobFailure, JobRequest, JobSuccess, Tag};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Command;

use crate::workspace::Workspace;

/// Run one `JOB` to completion: read `SRC`/`HDR`, compile, reply `OK`+`OBJ` or
/// `ERR`. `job_payload` is the already-read `JOB` frame's body. Any hard
/// failure (bad frame order, bad JSON, bad header encoding) is reported to the
/// peer as `ERR` with a plain-text diagnostic and the workspace is still
/// cleaned up; I/O errors talking to the peer itself propagate to the caller,
/// which drops the connection.
pub async fn handle_job<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    job_payload: &[u8],
    compilers: &BTreeMap<String, CompilerSpec>,
) -> std::io::Result<()> {
    let job: JobRequest = match serde_json::from_slice(job_payload) {
        Ok(j) => j,
        Err(e) => return send_diagnostic(stream, &format!("malformed JOB payload: {e}")).await,
    };

    let workspace = match Workspace::create().await {
        Ok(w) => w,
        Err(e) => return send_diagnostic(stream, &format!("failed to create workspace: {e}")).await,
    };

    let outcome = run_job(stream, &job, &workspace.path, compilers).await;
    workspace.cleanup().await;
    outcome
}

async fn run_job<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    job: &JobRequest,
    workspace: &Path,
    compilers: &BTreeMap<String, CompilerSpec>,
) -> std::io::Result<()> {
    let source_bytes = match read_expected(stream, Tag::Src).await {
        Ok(b) => b,
        Err(e) => return send_diagnostic(stream, &format!("expected SRC frame: {e}")).await,
    };
    let source_path = workspace.join(&job.source_name);
    if let Err(e) = tokio::fs::write(&source_path, &source_bytes).await {
        return send_diagnostic(stream, &format!("writing source file: {e}")).await;
    }

    let header_payload = match read_expected(stream, Tag::Hdr).await {
        Ok(b) => b,
        Err(e) => return send_diagnostic(stream, &format!("expected HDR frame: {e}")).await,
    };
    let headers = match decode_headers(&header_payload) {
        Ok(h) => h,
        Err(e) => return send_diagnostic(stream, &format!("malformed HDR payload: {e}")).await,
    };
    for (rel_path, content) in &headers {
        let dest = workspace.join(rel_path);
        if let Some(parent) = dest.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                return send_diagnostic(stream, &format!("materializing header {rel_path}: {e}")).await;
            }
        }
        if let Err(e) = tokio::fs::write(&dest, content).await {
            return send_diagnostic(stream, &format!("writing header {rel_path}: {e}")).await;
        }
    }

    let output_name = output_name_for(&job.source_name);
    let output_path = workspace.join(&output_name);
    let compiler = resolve_compiler(&job.compiler, compilers);

    let start = std::time::Instant::now();
    let spawned = spawn_compile(&compiler, job, workspace, &source_path, &output_path).await;
    let elapsed = start.elapsed().as_secs_f64();

    let output = match spawned {
        Ok(output) => output,
        Err(e) => return send_diagnostic(stream, &format!("spawning compiler {}: {e}", compiler.as_os_str())).await,
    };

    if !output.status.success() {
        let failure = JobFailure::new(
            job.job_id.clone(),
            output.status.code().unwrap_or(1),
            String::from_utf8_lossy(&output.stderr).into_owned(),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            elapsed,
        );
        let payload = serde_json::to_vec(&failure)?;
        write_frame(stream, Tag::Err, &payload)
            .await
            .map_err(std::io::Error::other)?;
        return Ok(());
    }

    let object_bytes = tokio::fs::read(&output_path).await?;
    let warnings = if output.stderr.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&output.stderr).into_owned())
    };
    let success = JobSuccess::new(job.job_id.clone(), output_name, object_bytes.len() as u64, elapsed, warnings);
    let payload = serde_json::to_vec(&success)?;
    write_frame(stream, Tag::Ok, &payload).await.map_err(std::io::Error::other)?;
    write_frame(stream, Tag::Obj, &object_bytes)
        .await
        .map_err(std::io::Error::other)?;
    Ok(())
}

fn output_name_for(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_name.to_string());
    format!("{stem}.o")
}

async fn spawn_compile(
    compiler: &CompilerExecutable,
    job: &JobRequest,
    workspace: &Path,
    source_path: &Path,
    output_path: &Path,
) -> std::io::Result<std::process::Output> {
    let mut cmd = Command::new(compiler.as_os_str());
    cmd.current_dir(workspace);
    cmd.arg("-I").arg(workspace);
    for inc in &job.include_paths {
        cmd.arg("-I").arg(inc);
    }
    for define in &job.defines {
        cmd.arg("-D").arg(define);
    }
    cmd.args(&job.args);
    cmd.arg("-c").arg(source_path);
    cmd.arg("-o").arg(output_path);
    cmd.output().await
}

async fn send_diagnostic<S: AsyncWrite + Unpin>(stream: &mut S, message: &str) -> std::io::Result<()> {
    eprintln!("distcc-worker: {message}");
    write_frame(stream, Tag::Err, message.as_bytes())
        .await
        .map_err(std::io::Error::other)
}
