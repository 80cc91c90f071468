use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpSocket;

use distcc_worker::cli::Cli;
use distcc_worker::shutdown::{spawn_ctrl_c_handler, ShutdownController, ShutdownEvent};
use distcc_worker::{connection, system_info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = distcc_core::load_config(cli.config.as_deref())?;
    let compilers = Arc::new(config.compilers);

    let addr = format!("{}:{}", cli.bind, cli.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind address {}:{}: {e}", cli.bind, cli.port))?;
    let socket = TcpSocket::new_v4()?;
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    let listener = socket.listen(128)?;

    let info = system_info::gather();
    println!("distcc-worker starting on {}:{}", cli.bind, cli.port);
    println!("  hostname: {}", info.hostname);
    println!("  arch: {}", info.arch);
    println!("  cpus: {}", info.cpus);

    let shutdown = Arc::new(ShutdownController::new());
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::unbounded_channel::<ShutdownEvent>();
    spawn_ctrl_c_handler(shutdown.clone(), shutdown_tx);

    let mut connections = tokio::task::JoinSet::new();
    let mut accepting = true;
    let mut immediate_exit = false;

    loop {
        tokio::select! {
            accepted = listener.accept(), if accepting => {
                let (stream, peer) = accepted?;
                let compilers = compilers.clone();
                connections.spawn(async move {
                    println!("distcc-worker: connection from {peer}");
                    connection::handle_connection(stream, compilers).await;
                });
            }
            Some(event) = shutdown_rx.recv() => {
                match event {
                    ShutdownEvent::Graceful => {
                        eprintln!("distcc-worker: shutdown requested, finishing in-flight jobs (press Ctrl+C again to exit immediately)");
                        accepting = false;
                    }
                    ShutdownEvent::Immediate => {
                        eprintln!("distcc-worker: exiting immediately");
                        immediate_exit = true;
                        break;
                    }
                }
            }
            Some(_) = connections.join_next(), if !accepting && !connections.is_empty() => {}
            else => break,
        }

        if !accepting && connections.is_empty() {
            break;
        }
    }

    if immediate_exit {
        std::process::exit(130);
    }

    Ok(())
}
