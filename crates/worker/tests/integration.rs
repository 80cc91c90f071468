//! End-to-end: a real worker daemon listening on a loopback socket, driven by
//! the real dispatcher's remote-compile exchange — a clean compile and a
//! compiler-rejected source file.

use std::collections::BTreeMap;
use std::sync::Arc;

use distcc_core::{CompileJob, NetworkConfig, WorkerEndpoint};
use distcc_dispatcher::{remote_compile, CompileOutcome};
use tokio::net::TcpListener;

async fn spawn_worker() -> WorkerEndpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let compilers = Arc::new(BTreeMap::new());

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let compilers = compilers.clone();
            tokio::spawn(async move {
                distcc_worker::connection::handle_connection(stream, compilers).await;
            });
        }
    });

    WorkerEndpoint {
        host: addr.ip().to_string(),
        port: addr.port(),
        name: "loopback".to_string(),
        weight: 1.0,
        cpus: 1,
    }
}

fn scratch_dir(tag: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("distcc-worker-integration-{tag}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[tokio::test]
async fn hello_world_compile_round_trips_through_a_real_worker() {
    let endpoint = spawn_worker().await;
    let dir = scratch_dir("ok");
    let source = dir.join("source.c");
    std::fs::write(&source, b"int main(void){return 0;}").unwrap();
    let job = CompileJob {
        job_id: "job-000001".to_string(),
        source_path: source,
        output_path: dir.join("source.o"),
        compiler: "cc".to_string(),
        args: vec!["-O2".to_string()],
        include_paths: vec![],
        defines: vec![],
    };

    let outcome = remote_compile(&endpoint, &NetworkConfig::default(), &job).await.unwrap();
    match outcome {
        CompileOutcome::Success { output_path, .. } => {
            let metadata = std::fs::metadata(&output_path).expect("object file should exist");
            assert!(metadata.len() > 0);
        }
        other => panic!("expected a successful compile, got {other:?}"),
    }
}

#[tokio::test]
async fn syntax_error_round_trips_as_a_compiler_failure_with_no_object_file() {
    let endpoint = spawn_worker().await;
    let dir = scratch_dir("bad");
    let source = dir.join("bad.c");
    std::fs::write(&source, b"int main(\n").unwrap();
    let job = CompileJob {
        job_id: "job-000002".to_string(),
        source_path: source,
        output_path: dir.join("bad.o"),
        compiler: "cc".to_string(),
        args: vec![],
        include_paths: vec![],
        defines: vec![],
    };

    let outcome = remote_compile(&endpoint, &NetworkConfig::default(), &job).await.unwrap();
    match outcome {
        CompileOutcome::CompilerFailed { returncode, stderr, .. } => {
            assert_ne!(returncode, 0);
            assert!(!stderr.is_empty());
        }
        other => panic!("expected a compiler failure, got {other:?}"),
    }
    assert!(!job.output_path.exists());
}
