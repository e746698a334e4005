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

use super::{MetricDesc, MetricsSource, Sample};
use crate::error::Result;
use crate::metrics::{GpuMetrics, MetricsAggregator};
use crate::slurm::GresSource;

const GPU_TOTAL_METRICS: &[MetricDesc] = &[
    MetricDesc {
        name: "slurm_gpus_alloc",
        help: "Allocated GPUs",
        labels: &[],
    },
    MetricDesc {
        name: "slurm_gpus_idle",
        help: "Idle GPUs",
        labels: &[],
    },
    MetricDesc {
        name: "slurm_gpus_total",
        help: "Total GPUs",
        labels: &[],
    },
    MetricDesc {
        name: "slurm_gpus_utilization",
        help: "Total GPU utilization",
        labels: &[],
    },
];

/// Cluster-wide GPU gauges without labels.
pub struct GpuTotalCollector {
    source: Arc<dyn GresSource>,
}

impl GpuTotalCollector {
    pub fn new(source: Arc<dyn GresSource>) -> Self {
        Self { source }
    }

    pub fn samples(metrics: &GpuMetrics) -> Vec<Sample> {
        vec![
            Sample::new("slurm_gpus_alloc", metrics.alloc as f64),
            Sample::new("slurm_gpus_idle", metrics.idle as f64),
            Sample::new("slurm_gpus_total", metrics.total as f64),
            Sample::new("slurm_gpus_utilization", metrics.utilization),
        ]
    }
}

impl MetricsSource for GpuTotalCollector {
    fn describe(&self) -> &'static [MetricDesc] {
        GPU_TOTAL_METRICS
    }

    fn collect(&self) -> Result<Vec<Sample>> {
        let output = self.source.fetch()?;
        let metrics = MetricsAggregator::aggregate_gpus(&output);
        tracing::debug!(
            "Collected {} of {} GPUs allocated from {}",
            metrics.alloc,
            metrics.total,
            self.source.describe()
        );
        Ok(Self::samples(&metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::metrics::gather;
    use crate::error::Error;

    struct StaticSource(&'static str);

    impl GresSource for StaticSource {
        fn fetch(&self) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    struct BrokenSource;

    impl GresSource for BrokenSource {
        fn fetch(&self) -> Result<String> {
            Err(Error::Timeout {
                command: "sinfo".to_string(),
                timeout: std::time::Duration::from_secs(1),
            })
        }

        fn describe(&self) -> String {
            "broken".to_string()
        }
    }

    #[test]
    fn test_collect_always_emits_all_gauges() {
        let collector = GpuTotalCollector::new(Arc::new(StaticSource("")));
        let samples = collector.collect().unwrap();
        assert_eq!(samples.len(), 4);
        assert!(samples.iter().all(|s| s.value == 0.0 && s.labels.is_empty()));
    }

    #[test]
    fn test_rendered_text() {
        let collector = GpuTotalCollector::new(Arc::new(StaticSource(
            "1 gpu:A100:4 gpu:T4:2\n2 gpu:T4:2 gpu:T4:1",
        )));
        let sources: Vec<Box<dyn MetricsSource>> = vec![Box::new(collector)];
        assert_eq!(
            gather(&sources).unwrap(),
            "# HELP slurm_gpus_alloc Allocated GPUs\n\
             # TYPE slurm_gpus_alloc gauge\n\
             slurm_gpus_alloc 4\n\
             # HELP slurm_gpus_idle Idle GPUs\n\
             # TYPE slurm_gpus_idle gauge\n\
             slurm_gpus_idle 4\n\
             # HELP slurm_gpus_total Total GPUs\n\
             # TYPE slurm_gpus_total gauge\n\
             slurm_gpus_total 8\n\
             # HELP slurm_gpus_utilization Total GPU utilization\n\
             # TYPE slurm_gpus_utilization gauge\n\
             slurm_gpus_utilization 0.5\n"
        );
    }

    #[test]
    fn test_collect_propagates_source_errors() {
        let collector = GpuTotalCollector::new(Arc::new(BrokenSource));
        assert!(matches!(collector.collect(), Err(Error::Timeout { .. })));
    }
}
