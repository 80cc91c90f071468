//! The dispatch engine: worker pool bookkeeping, probing, the remote compile
//! exchange, batch scheduling, and local-fallback orchestration.

mod batch;
mod dispatcher;
mod error;
mod pool;
mod probe;
mod remote;

pub use batch::{compile_many, compile_many_with_progress, default_parallelism};
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use pool::{WorkerPool, WorkerState};
pub use probe::refresh_all;
pub use remote::{remote_compile, CompileOutcome};
