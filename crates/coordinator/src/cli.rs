use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "distcc-coordinator", about = "Operate and exercise a distcc worker pool")]
pub struct Cli {
    /// Probe every configured worker and print availability, then exit.
    #[arg(long)]
    pub refresh: bool,

    /// Compile a single file through the pool and print per-worker stats, then exit.
    #[arg(long, value_name = "FILE")]
    pub test: Option<std::path::PathBuf>,

    /// Logical compiler name to use for `--test` and batch files.
    #[arg(long, default_value = "gcc")]
    pub compiler: String,

    /// Comma-separated worker hosts, overriding the configured pool.
    #[arg(long, value_name = "HOSTS")]
    pub hosts: Option<String>,

    /// Batch mode parallelism (defaults to available worker cpus, floored at 4).
    #[arg(long)]
    pub parallel: Option<usize>,

    /// Path to a JSON config file (defaults to the XDG config location).
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// Files to compile in batch mode.
    pub files: Vec<std::path::PathBuf>,
}
