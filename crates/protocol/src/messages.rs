//! JSON document shapes carried inside frame payloads.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// Payload of a `JOB` frame. `source_name` is a basename only — the absolute
/// source path is never transmitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub job_id: String,
    pub compiler: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub source_name: String,
    #[serde(default)]
    pub include_paths: Vec<String>,
    #[serde(default)]
    pub defines: Vec<String>,
}

/// Payload of the success `OK` frame, sent before the `OBJ` frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSuccess {
    pub status: String,
    pub job_id: String,
    pub output_name: String,
    pub output_size: u64,
    pub elapsed: f64,
    #[serde(default)]
    pub warnings: Option<String>,
}

impl JobSuccess {
    pub fn new(job_id: impl Into<String>, output_name: impl Into<String>, output_size: u64, elapsed: f64, warnings: Option<String>) -> Self {
        Self {
            status: "success".to_string(),
            job_id: job_id.into(),
            output_name: output_name.into(),
            output_size,
            elapsed,
            warnings,
        }
    }
}

/// Payload of the `ERR` frame for a completed (non-zero exit) compile job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFailure {
    pub status: String,
    pub job_id: String,
    pub returncode: i32,
    pub stderr: String,
    pub stdout: String,
    pub elapsed: f64,
}

impl JobFailure {
    pub fn new(job_id: impl Into<String>, returncode: i32, stderr: String, stdout: String, elapsed: f64) -> Self {
        Self {
            status: "error".to_string(),
            job_id: job_id.into(),
            returncode,
            stderr,
            stdout,
            elapsed,
        }
    }
}

/// Payload of a `PONG` frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub hostname: String,
    pub arch: String,
    pub cpus: u32,
    pub load: f64,
}

/// Decode a `HDR` frame payload: a JSON object mapping relative header paths to
/// base64-encoded content. `{}` is valid and means "no sidecar headers".
pub fn decode_headers(payload: &[u8]) -> Result<BTreeMap<String, Vec<u8>>, FrameError> {
    let encoded: BTreeMap<String, String> = serde_json::from_slice(payload)?;
    let mut out = BTreeMap::new();
    for (name, b64) in encoded {
        out.insert(name, B64.decode(b64.as_bytes())?);
    }
    Ok(out)
}

/// Encode a set of sidecar headers into the `HDR` frame's JSON-of-base64 shape.
pub fn encode_headers(headers: &BTreeMap<String, Vec<u8>>) -> Result<Vec<u8>, FrameError> {
    let encoded: BTreeMap<&String, String> = headers
        .iter()
        .map(|(name, bytes)| (name, B64.encode(bytes)))
        .collect();
    Ok(serde_json::to_vec(&encoded)?)
}
