//! Typed errors for the framing layer, in the narrow-enum style the engine
//! crate uses for `BackendError`: small enough to match on, convertible to
//! `anyhow::Error` at call boundaries via `?`.

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("connection closed before a full frame could be read")]
    UnexpectedEof,

    #[error("frame payload of {0} bytes exceeds the maximum accepted length")]
    PayloadTooLarge(usize),

    #[error("frame tag {0:?} is not valid ASCII")]
    MalformedTag(Vec<u8>),

    #[error("expected {expected} frame, got {got}")]
    UnexpectedTag { expected: &'static str, got: String },

    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid base64 in HDR payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    pub(crate) fn from_header_io(err: std::io::Error) -> FrameError {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            FrameError::UnexpectedEof
        } else {
            FrameError::Io(err)
        }
    }
}
