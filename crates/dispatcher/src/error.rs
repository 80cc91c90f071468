//! Narrow error enum for the dispatcher, in the same spirit as the protocol
//! crate's `FrameError` and the teacher's `BackendError`: small enough for
//! callers to match on, and `anyhow`-convertible at the binary boundary.

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("connecting to {worker}: {source}")]
    Connect {
        worker: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connecting to {worker} timed out after {timeout_secs}s")]
    ConnectTimeout { worker: String, timeout_secs: f64 },

    #[error("exchange with {worker} timed out after {timeout_secs}s")]
    ExchangeTimeout { worker: String, timeout_secs: f64 },

    #[error("transport error talking to {worker}: {0}", worker = .worker)]
    Transport {
        worker: String,
        #[source]
        source: distcc_protocol::FrameError,
    },

    #[error("protocol error talking to {worker}: {detail}")]
    Protocol { worker: String, detail: String },

    #[error("no workers available")]
    NoWorkersAvailable,
}

impl DispatchError {
    /// Transport- and protocol-class failures mark the worker unavailable;
    /// `NoWorkersAvailable` is not about a specific worker.
    pub fn is_worker_health_affecting(&self) -> bool {
        !matches!(self, DispatchError::NoWorkersAvailable)
    }
}
