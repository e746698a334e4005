// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{health_handler, metrics_handler, root_handler, ExporterState};
use crate::api::metrics::{GpuTotalCollector, GpuTypeCollector, MetricsSource};
use crate::cli::ApiArgs;
use crate::common::config::{ServerConfig, SourceConfig};
use crate::error::Result;
use crate::slurm::utility_available;

/// Per-type and cluster-wide collectors over the configured source.
///
/// Both collectors query the source on their own, so a scrape runs `sinfo`
/// twice.
pub fn build_sources(config: &SourceConfig) -> Vec<Box<dyn MetricsSource>> {
    let source = config.build_source();
    vec![
        Box::new(GpuTypeCollector::new(source.clone())),
        Box::new(GpuTotalCollector::new(source)),
    ]
}

pub fn build_router(state: ExporterState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
}

/// Run the API server until Ctrl+C or SIGTERM.
pub async fn run_api_mode(args: &ApiArgs) -> Result<()> {
    let config = ServerConfig::from_args(args)?;

    if config.source.uses_scheduler() {
        if scheduler_available(&config.source.sinfo).await {
            tracing::info!("Using {} for GPU allocation", config.source.sinfo);
        } else {
            tracing::warn!(
                "{} is not available, scrapes will fail until it is",
                config.source.sinfo
            );
        }
    } else if let Some(path) = &config.source.input_file {
        tracing::info!("Serving GPU allocation from recorded output {}", path.display());
    }

    let app = build_router(ExporterState {
        sources: build_sources(&config.source),
    });

    let listener = TcpListener::bind(config.addr).await?;
    tracing::info!(
        "API server listening on {}",
        listener.local_addr().unwrap_or(config.addr)
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

/// Run the `sinfo` availability probe on the blocking pool.
async fn scheduler_available(program: &str) -> bool {
    let program = program.to_string();
    tokio::task::spawn_blocking(move || utility_available(&program))
        .await
        .unwrap_or(false)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::Duration;

    #[tokio::test]
    async fn test_router_serves_metrics_from_recorded_output() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "2 gpu:T4:4(S:0-1) gpu:T4:3(IDX:0-2)").unwrap();

        let config = SourceConfig {
            sinfo: "sinfo".to_string(),
            timeout: Duration::from_secs(1),
            input_file: Some(PathBuf::from(file.path())),
        };
        let app = build_router(ExporterState {
            sources: build_sources(&config),
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let body = tokio::task::spawn_blocking(move || http_get(addr, "/metrics"))
            .await
            .unwrap();
        server.abort();

        assert!(body.starts_with("HTTP/1.1 200"));
        assert!(body.contains("slurm_gpu_type_alloc{gpu=\"T4\"} 6\n"));
        assert!(body.contains("slurm_gpus_total 8\n"));
        assert!(body.contains("slurm_gpus_utilization 0.75\n"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_scheduler_probe_does_not_block_runtime() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let slow_sinfo = dir.path().join("sinfo");
        std::fs::write(&slow_sinfo, "#!/bin/sh\nsleep 1\necho slurm 23.02\n").unwrap();
        std::fs::set_permissions(&slow_sinfo, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Single threaded runtime: the ticker only advances while the probe yields
        let started = std::time::Instant::now();
        let ticker = async {
            for _ in 0..10 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            started.elapsed()
        };
        let (available, ticker_done) =
            tokio::join!(scheduler_available(slow_sinfo.to_str().unwrap()), ticker);

        assert!(available);
        assert!(
            ticker_done < Duration::from_millis(800),
            "runtime stalled for {ticker_done:?} during the probe"
        );
    }

    #[tokio::test]
    async fn test_scheduler_probe_missing_binary() {
        assert!(!scheduler_available("no-such-sinfo-binary").await);
    }

    fn http_get(addr: std::net::SocketAddr, path: &str) -> String {
        use std::io::Read;
        let mut stream = std::net::TcpStream::connect(addr).unwrap();
        write!(
            stream,
            "GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n"
        )
        .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }
}
