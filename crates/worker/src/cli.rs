use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "distcc-worker", about = "Distributed compile worker daemon")]
pub struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = 5555)]
    pub port: u16,

    /// Address to bind to.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Path to a JSON config file (defaults to the XDG config location).
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,
}
