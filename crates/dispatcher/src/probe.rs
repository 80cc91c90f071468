//! Worker probing: a `PING`/`PONG` round-trip used both to refresh the pool
//! and to decide initial/ongoing availability.

use std::time::Duration;

use distcc_core::{NetworkConfig, WorkerEndpoint};
use distcc_protocol::{read_expected, write_frame, SystemInfo, Tag};
use tokio::net::TcpStream;

use crate::error::DispatchError;
use crate::pool::WorkerPool;

/// At most this many probes run concurrently during a [`refresh_all`] call.
const MAX_CONCURRENT_PROBES: usize = 10;

async fn probe_one(endpoint: &WorkerEndpoint, network: &NetworkConfig) -> Result<SystemInfo, DispatchError> {
    let addr = format!("{}:{}", endpoint.host, endpoint.port);
    let connect_timeout = Duration::from_secs_f64(network.connect_timeout_secs.max(0.0));

    let mut stream = tokio::time::timeout(connect_timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| DispatchError::ConnectTimeout {
            worker: addr.clone(),
            timeout_secs: network.connect_timeout_secs,
        })?
        .map_err(|source| DispatchError::Connect {
            worker: addr.clone(),
            source,
        })?;

    write_frame(&mut stream, Tag::Ping, b"")
        .await
        .map_err(|source| DispatchError::Transport {
            worker: addr.clone(),
            source,
        })?;

    let payload = read_expected(&mut stream, Tag::Pong)
        .await
        .map_err(|source| DispatchError::Transport {
            worker: addr.clone(),
            source,
        })?;

    serde_json::from_slice(&payload).map_err(|e| DispatchError::Protocol {
        worker: addr,
        detail: format!("malformed PONG payload: {e}"),
    })
}

/// Probe every worker in `pool` concurrently (bounded), updating each one's
/// dynamic state in place. Individual probe failures do not abort the sweep.
pub async fn refresh_all(pool: &WorkerPool, network: &NetworkConfig) {
    let endpoints: Vec<(usize, WorkerEndpoint)> = pool
        .snapshot()
        .into_iter()
        .enumerate()
        .map(|(idx, w)| (idx, w.endpoint))
        .collect();

    for chunk in endpoints.chunks(MAX_CONCURRENT_PROBES) {
        let mut tasks = tokio::task::JoinSet::new();
        for (idx, endpoint) in chunk.iter().cloned() {
            let network = network.clone();
            tasks.spawn(async move {
                let result = probe_one(&endpoint, &network).await;
                (idx, result.ok())
            });
        }
        while let Some(joined) = tasks.join_next().await {
            if let Ok((idx, info)) = joined {
                pool.apply_probe_result(idx, info);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use distcc_protocol::write_frame as write_frame_test;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    async fn spawn_pong_server(info: SystemInfo) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = distcc_protocol::read_expected(&mut stream, Tag::Ping).await;
            let payload = serde_json::to_vec(&info).unwrap();
            write_frame_test(&mut stream, Tag::Pong, &payload).await.unwrap();
            stream.shutdown().await.ok();
        });
        addr
    }

    #[tokio::test]
    async fn probe_one_parses_a_well_formed_pong() {
        let info = SystemInfo {
            hostname: "g5".to_string(),
            arch: "ppc".to_string(),
            cpus: 4,
            load: 0.5,
        };
        let addr = spawn_pong_server(info.clone()).await;
        let endpoint = WorkerEndpoint {
            host: addr.ip().to_string(),
            port: addr.port(),
            name: "g5".to_string(),
            weight: 1.0,
            cpus: 1,
        };
        let network = NetworkConfig::default();
        let result = probe_one(&endpoint, &network).await.unwrap();
        assert_eq!(result.cpus, 4);
        assert_eq!(result.arch, "ppc");
    }

    #[tokio::test]
    async fn probe_one_fails_when_nothing_is_listening() {
        let endpoint = WorkerEndpoint {
            host: "127.0.0.1".to_string(),
            port: 1, // reserved, nothing listens here
            name: "nope".to_string(),
            weight: 1.0,
            cpus: 1,
        };
        let network = NetworkConfig {
            connect_timeout_secs: 0.5,
            ..NetworkConfig::default()
        };
        let result = probe_one(&endpoint, &network).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn refresh_all_marks_reachable_workers_available() {
        let info = SystemInfo {
            hostname: "g4".to_string(),
            arch: "ppc".to_string(),
            cpus: 2,
            load: 0.0,
        };
        let addr = spawn_pong_server(info).await;
        let pool = WorkerPool::new(vec![WorkerEndpoint {
            host: addr.ip().to_string(),
            port: addr.port(),
            name: "g4".to_string(),
            weight: 1.0,
            cpus: 1,
        }]);
        refresh_all(&pool, &NetworkConfig::default()).await;
        assert!(pool.snapshot()[0].available);
        assert_eq!(pool.snapshot()[0].cpus, 2);
    }
}
