mod args;
mod env;

use std::path::PathBuf;

use distcc_core::{compile_local, run_local_passthrough, workers_from_hosts_csv, AppConfig, CompileJob};
use distcc_dispatcher::{CompileOutcome, Dispatcher};

use crate::args::{classify, is_compile_job};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let argv: Vec<String> = std::env::args().collect();
    let argv0 = argv.first().cloned().unwrap_or_default();
    let passthrough_args: Vec<String> = argv.into_iter().skip(1).collect();

    let compiler = env::compiler_override().unwrap_or_else(|| env::compiler_from_argv0(&argv0));
    let verbose = env::verbose();

    if env::disabled() {
        if verbose {
            eprintln!("[distcc] disabled, compiling locally");
        }
        std::process::exit(run_local_passthrough(&compiler, &passthrough_args).await?);
    }

    if !is_compile_job(&passthrough_args) {
        std::process::exit(run_local_passthrough(&compiler, &passthrough_args).await?);
    }

    let Some(invocation) = classify(&passthrough_args) else {
        std::process::exit(run_local_passthrough(&compiler, &passthrough_args).await?);
    };

    let mut config = AppConfig::built_in_default();
    if let Ok(loaded) = distcc_core::load_config(None) {
        config = loaded;
    }
    if let Some(hosts_csv) = env::hosts_override() {
        config.workers = workers_from_hosts_csv(&hosts_csv, config.network.default_port);
    }

    let fallback = env::fallback_enabled();
    let dispatcher = Dispatcher::new(config, fallback);
    dispatcher.refresh().await;

    let job = CompileJob {
        job_id: format!("cli-{}", std::process::id()),
        source_path: PathBuf::from(&invocation.source),
        output_path: PathBuf::from(&invocation.output),
        compiler: compiler.clone(),
        args: invocation.other_args,
        include_paths: invocation.include_paths,
        defines: invocation.defines,
    };

    if verbose {
        eprintln!("[distcc] dispatching {} via {compiler}", invocation.source);
    }

    match dispatcher.compile_file(&job).await {
        Ok(CompileOutcome::Success { elapsed, warnings, .. }) => {
            if let Some(warnings) = warnings.filter(|w| !w.is_empty()) {
                eprint!("{warnings}");
            }
            if verbose {
                eprintln!("[distcc] compiled {} in {elapsed:.2}s", invocation.source);
            }
            std::process::exit(0);
        }
        Ok(CompileOutcome::CompilerFailed { returncode, stdout, stderr, .. }) => {
            if !stdout.is_empty() {
                print!("{stdout}");
            }
            if !stderr.is_empty() {
                eprint!("{stderr}");
            }
            std::process::exit(returncode);
        }
        Err(e) => {
            if verbose {
                eprintln!("[distcc] dispatch failed: {e}");
            }
            if fallback {
                let outcome = compile_local(
                    &compiler,
                    &job.include_paths,
                    &job.defines,
                    &job.args,
                    &job.source_path,
                    &job.output_path,
                )
                .await?;
                if !outcome.stdout.is_empty() {
                    print!("{}", outcome.stdout);
                }
                if !outcome.stderr.is_empty() {
                    eprint!("{}", outcome.stderr);
                }
                std::process::exit(outcome.returncode);
            }
            eprintln!("[distcc] no workers available and fallback is disabled");
            std::process::exit(1);
        }
    }
}
