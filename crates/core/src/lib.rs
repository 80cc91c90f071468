//! Shared types and local-execution helpers used by the dispatcher, the
//! worker daemon, the wrapper, and the coordinator.

mod compiler;
mod config;
mod job;
mod local;

pub use compiler::{resolve_compiler, CompilerExecutable};
pub use config::{
    default_config_path, load_config, save_config, workers_from_hosts_csv, AppConfig,
    CompilerSpec, NetworkConfig, WorkerEndpoint,
};
pub use job::CompileJob;
pub use local::{compile_local, run_local_passthrough, LocalCompileOutcome};
