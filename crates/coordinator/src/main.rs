mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use distcc_core::{workers_from_hosts_csv, AppConfig, CompileJob};
use distcc_dispatcher::{compile_many_with_progress, default_parallelism, CompileOutcome, Dispatcher};

use crate::cli::Cli;

fn output_path_for(source: &std::path::Path) -> PathBuf {
    source.with_extension("o")
}

async fn build_dispatcher(cli: &Cli) -> anyhow::Result<Dispatcher> {
    let mut config = distcc_core::load_config(cli.config.as_deref())?;
    if let Some(hosts_csv) = &cli.hosts {
        config.workers = workers_from_hosts_csv(hosts_csv, config.network.default_port);
    }
    let dispatcher = Dispatcher::new(config, true);
    dispatcher.refresh().await;
    Ok(dispatcher)
}

fn print_pool_status(dispatcher: &Dispatcher) {
    let snapshot = dispatcher.pool().snapshot();
    println!("Checking worker availability...");
    for w in &snapshot {
        if w.available {
            println!(
                "  {} ({}): OK - {}, {} CPUs, load {:.2}",
                w.endpoint.name, w.endpoint.host, w.arch, w.cpus, w.load
            );
        } else {
            println!("  {} ({}): OFFLINE", w.endpoint.name, w.endpoint.host);
        }
    }
    let available = snapshot.iter().filter(|w| w.available).count();
    println!("Available workers: {available}/{}", snapshot.len());
}

fn print_worker_stats(dispatcher: &Dispatcher) {
    println!("\n=== Worker Statistics ===");
    for w in dispatcher.pool().snapshot() {
        if w.total_jobs > 0 {
            let avg = w.total_time / w.total_jobs as f64;
            println!("{}: {} jobs, avg {:.2}s", w.endpoint.name, w.total_jobs, avg);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let dispatcher = build_dispatcher(&cli).await?;

    if cli.refresh {
        print_pool_status(&dispatcher);
        return Ok(());
    }

    if let Some(test_file) = &cli.test {
        if !test_file.exists() {
            eprintln!("File not found: {}", test_file.display());
            std::process::exit(1);
        }
        let output = output_path_for(test_file);
        let job = CompileJob {
            job_id: "job-000001".to_string(),
            source_path: test_file.clone(),
            output_path: output.clone(),
            compiler: cli.compiler.clone(),
            args: vec!["-O2".to_string()],
            include_paths: vec![],
            defines: vec![],
        };

        match dispatcher.compile_file(&job).await {
            Ok(CompileOutcome::Success { output_path, .. }) => {
                let size = std::fs::metadata(&output_path).map(|m| m.len()).unwrap_or(0);
                println!("Success! Output: {}", output_path.display());
                println!("Size: {size} bytes");
            }
            Ok(CompileOutcome::CompilerFailed { stderr, stdout, .. }) => {
                println!("Failed: {}", if !stderr.is_empty() { stderr } else { stdout });
                print_worker_stats(&dispatcher);
                std::process::exit(1);
            }
            Err(e) => {
                println!("Failed: {e}");
                print_worker_stats(&dispatcher);
                std::process::exit(1);
            }
        }

        print_worker_stats(&dispatcher);
        return Ok(());
    }

    if cli.files.is_empty() {
        println!("Distributed compiler ready. Pass files to compile in batch mode, or use --refresh / --test.");
        return Ok(());
    }

    let dispatcher = Arc::new(dispatcher);
    let parallel = cli.parallel.unwrap_or_else(|| default_parallelism(&dispatcher));

    let jobs: Vec<CompileJob> = cli
        .files
        .iter()
        .enumerate()
        .map(|(i, source)| CompileJob {
            job_id: format!("job-{:06}", i + 1),
            source_path: source.clone(),
            output_path: output_path_for(source),
            compiler: cli.compiler.clone(),
            args: vec![],
            include_paths: vec![],
            defines: vec![],
        })
        .collect();

    let progress = indicatif::ProgressBar::new(jobs.len() as u64);
    progress.set_style(
        indicatif::ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar()),
    );

    let results = compile_many_with_progress(dispatcher.clone(), jobs, parallel, |job_id, _| {
        progress.inc(1);
        progress.set_message(job_id.to_string());
    })
    .await;
    progress.finish_and_clear();

    let mut failures = 0usize;
    for (source_path, result) in &results {
        let source = source_path.display();
        match result {
            Ok(CompileOutcome::Success { output_path, elapsed, .. }) => {
                println!("{source}: OK -> {} ({elapsed:.2}s)", output_path.display());
            }
            Ok(CompileOutcome::CompilerFailed { returncode, .. }) => {
                failures += 1;
                println!("{source}: FAILED (returncode {returncode})");
            }
            Err(message) => {
                failures += 1;
                println!("{source}: ERROR ({message})");
            }
        }
    }
    println!("\n{} compiled, {failures} failed", results.len() - failures);
    print_worker_stats(&dispatcher);

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
