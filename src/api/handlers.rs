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
use std::time::Instant;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::api::metrics::{gather, MetricsSource};
use crate::common::config::AppConfig;

/// Collectors shared by all requests. No values are cached: every scrape
/// recollects from the scheduler.
pub struct ExporterState {
    pub sources: Vec<Box<dyn MetricsSource>>,
}

pub type SharedState = Arc<ExporterState>;

pub async fn metrics_handler(State(state): State<SharedState>) -> Response {
    let started = Instant::now();
    // sinfo is executed synchronously, keep it off the async workers
    let result = tokio::task::spawn_blocking(move || gather(&state.sources)).await;

    match result {
        Ok(Ok(body)) => {
            tracing::debug!("Collected metrics in {:?}", started.elapsed());
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, AppConfig::PROMETHEUS_CONTENT_TYPE)],
                body,
            )
                .into_response()
        }
        Ok(Err(e)) => {
            tracing::error!("Failed to collect GPU metrics: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to collect GPU metrics: {e}\n"),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Metrics collection task failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Metrics collection task failed\n",
            )
                .into_response()
        }
    }
}

pub async fn root_handler() -> &'static str {
    "Slurm GPU Exporter\n\nMetrics are available at /metrics\n"
}

pub async fn health_handler() -> &'static str {
    "ok\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::metrics::{GpuTotalCollector, GpuTypeCollector};
    use crate::error::{Error, Result};
    use crate::slurm::GresSource;

    struct StaticSource(&'static str);

    impl GresSource for StaticSource {
        fn fetch(&self) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    struct MissingSinfo;

    impl GresSource for MissingSinfo {
        fn fetch(&self) -> Result<String> {
            Err(Error::UtilityUnavailable("sinfo".to_string()))
        }

        fn describe(&self) -> String {
            "missing".to_string()
        }
    }

    fn state_for(source: Arc<dyn GresSource>) -> SharedState {
        Arc::new(ExporterState {
            sources: vec![
                Box::new(GpuTypeCollector::new(source.clone())),
                Box::new(GpuTotalCollector::new(source)),
            ],
        })
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_metrics_handler_success() {
        let state = state_for(Arc::new(StaticSource("3 gpu:V100:2 gpu:V100:1")));
        let response = metrics_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            AppConfig::PROMETHEUS_CONTENT_TYPE
        );

        let body = body_text(response).await;
        assert!(body.contains("slurm_gpu_type_total{gpu=\"V100\"} 6\n"));
        assert!(body.contains("slurm_gpus_alloc 3\n"));
        // per-type families come first
        let per_type = body.find("slurm_gpu_type_alloc").unwrap();
        assert!(per_type < body.find("slurm_gpus_alloc").unwrap());
    }

    #[tokio::test]
    async fn test_metrics_handler_command_failure() {
        let state = state_for(Arc::new(MissingSinfo));
        let response = metrics_handler(State(state)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(response).await;
        assert!(body.contains("Utility not available: sinfo"));
    }

    #[tokio::test]
    async fn test_health_and_root() {
        assert_eq!(health_handler().await, "ok\n");
        assert!(root_handler().await.contains("/metrics"));
    }
}
