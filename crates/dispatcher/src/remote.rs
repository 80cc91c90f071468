//! The remote compile exchange: connect, send `JOB`/`SRC`/`HDR` in order, then
//! read either `OK`+`OBJ` or `ERR`.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use distcc_core::{CompileJob, NetworkConfig, WorkerEndpoint};
use distcc_protocol::{encode_headers, read_frame, write_frame, FrameTag, JobFailure, JobRequest, JobSuccess, Tag};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::error::DispatchError;

#[derive(Debug, Clone)]
pub enum CompileOutcome {
    Success {
        output_path: std::path::PathBuf,
        elapsed: f64,
        warnings: Option<String>,
    },
    CompilerFailed {
        returncode: i32,
        stdout: String,
        stderr: String,
        elapsed: f64,
    },
}

fn transport_err(worker: &str, source: distcc_protocol::FrameError) -> DispatchError {
    DispatchError::Transport {
        worker: worker.to_string(),
        source,
    }
}

/// Run the exchange over an already-connected, already-timed-out-wrapped
/// stream. Split out from [`remote_compile`] so tests can drive it over an
/// in-memory duplex pipe instead of a real socket.
async fn exchange<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    worker: &str,
    job: &CompileJob,
) -> Result<CompileOutcome, DispatchError> {
    let source_bytes = tokio::fs::read(&job.source_path)
        .await
        .map_err(|e| DispatchError::Protocol {
            worker: worker.to_string(),
            detail: format!("reading source file {}: {e}", job.source_path.display()),
        })?;

    let request = JobRequest {
        job_id: job.job_id.clone(),
        compiler: job.compiler.clone(),
        args: job.args.clone(),
        source_name: job.source_basename(),
        include_paths: job.include_paths.clone(),
        defines: job.defines.clone(),
    };
    let request_json = serde_json::to_vec(&request).map_err(|e| DispatchError::Protocol {
        worker: worker.to_string(),
        detail: format!("encoding job request: {e}"),
    })?;

    write_frame(stream, Tag::Job, &request_json)
        .await
        .map_err(|e| transport_err(worker, e))?;
    write_frame(stream, Tag::Src, &source_bytes)
        .await
        .map_err(|e| transport_err(worker, e))?;

    let headers: BTreeMap<String, Vec<u8>> = BTreeMap::new();
    let headers_json = encode_headers(&headers).map_err(|e| transport_err(worker, e))?;
    write_frame(stream, Tag::Hdr, &headers_json)
        .await
        .map_err(|e| transport_err(worker, e))?;

    let (tag, payload) = read_frame(stream).await.map_err(|e| transport_err(worker, e))?;
    match tag {
        FrameTag::Known(Tag::Ok) => {
            let success: JobSuccess = serde_json::from_slice(&payload).map_err(|e| DispatchError::Protocol {
                worker: worker.to_string(),
                detail: format!("malformed OK payload: {e}"),
            })?;
            let object_bytes = tokio_read_expected_obj(stream, worker).await?;
            if object_bytes.len() as u64 != success.output_size {
                return Err(DispatchError::Protocol {
                    worker: worker.to_string(),
                    detail: format!(
                        "OBJ frame length {} did not match declared output_size {}",
                        object_bytes.len(),
                        success.output_size
                    ),
                });
            }
            write_object_atomically(&job.output_path, &object_bytes)
                .await
                .map_err(|e| DispatchError::Protocol {
                    worker: worker.to_string(),
                    detail: format!("writing output {}: {e}", job.output_path.display()),
                })?;
            Ok(CompileOutcome::Success {
                output_path: job.output_path.clone(),
                elapsed: success.elapsed,
                warnings: success.warnings,
            })
        }
        FrameTag::Known(Tag::Err) => {
            let failure: JobFailure = serde_json::from_slice(&payload).map_err(|e| DispatchError::Protocol {
                worker: worker.to_string(),
                detail: format!("malformed ERR payload: {e}"),
            })?;
            Ok(CompileOutcome::CompilerFailed {
                returncode: failure.returncode,
                stdout: failure.stdout,
                stderr: failure.stderr,
                elapsed: failure.elapsed,
            })
        }
        FrameTag::Known(other) => Err(DispatchError::Protocol {
            worker: worker.to_string(),
            detail: format!("unexpected frame {other} after HDR"),
        }),
        FrameTag::Unknown(other) => Err(DispatchError::Protocol {
            worker: worker.to_string(),
            detail: format!("unexpected frame {other} after HDR"),
        }),
    }
}

async fn tokio_read_expected_obj<S: AsyncRead + Unpin>(stream: &mut S, worker: &str) -> Result<Vec<u8>, DispatchError> {
    distcc_protocol::read_expected(stream, Tag::Obj)
        .await
        .map_err(|e| transport_err(worker, e))
}

async fn write_object_atomically(output_path: &std::path::Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let tmp = output_path.with_extension("o.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, output_path).await?;
    Ok(())
}

/// Connect to `endpoint`, wrapping the connect in `network.connect_timeout_secs`
/// and the whole exchange (send + receive) in `network.compile_timeout_secs`.
pub async fn remote_compile(
    endpoint: &WorkerEndpoint,
    network: &NetworkConfig,
    job: &CompileJob,
) -> Result<CompileOutcome, DispatchError> {
    let worker = format!("{}:{}", endpoint.host, endpoint.port);
    let connect_timeout = Duration::from_secs_f64(network.connect_timeout_secs.max(0.0));
    let compile_timeout = Duration::from_secs_f64(network.compile_timeout_secs.max(0.0));

    let mut stream = tokio::time::timeout(connect_timeout, TcpStream::connect(&worker))
        .await
        .map_err(|_| DispatchError::ConnectTimeout {
            worker: worker.clone(),
            timeout_secs: network.connect_timeout_secs,
        })?
        .map_err(|source| DispatchError::Connect {
            worker: worker.clone(),
            source,
        })?;

    let started = Instant::now();
    let result = tokio::time::timeout(compile_timeout, exchange(&mut stream, &worker, job)).await;
    match result {
        Ok(inner) => inner,
        Err(_) => Err(DispatchError::ExchangeTimeout {
            worker,
            timeout_secs: (Instant::now() - started).as_secs_f64().max(network.compile_timeout_secs),
        }),
    }
}
