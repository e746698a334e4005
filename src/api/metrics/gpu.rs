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
use crate::metrics::{GpuTypeMetrics, MetricsAggregator};
use crate::slurm::GresSource;

const GPU_TYPE_METRICS: &[MetricDesc] = &[
    MetricDesc {
        name: "slurm_gpu_type_alloc",
        help: "Allocated GPUs per type",
        labels: &["gpu"],
    },
    MetricDesc {
        name: "slurm_gpu_type_idle",
        help: "Idle GPUs per type",
        labels: &["gpu"],
    },
    MetricDesc {
        name: "slurm_gpu_type_total",
        help: "Total GPUs per type",
        labels: &["gpu"],
    },
    MetricDesc {
        name: "slurm_gpu_type_utilization",
        help: "GPU utilization per type",
        labels: &["gpu"],
    },
];

/// Gauges per GPU type, labeled with `gpu="<type>"`.
pub struct GpuTypeCollector {
    source: Arc<dyn GresSource>,
}

impl GpuTypeCollector {
    pub fn new(source: Arc<dyn GresSource>) -> Self {
        Self { source }
    }

    /// Samples for an already aggregated snapshot.
    pub fn samples(metrics: &GpuTypeMetrics) -> Vec<Sample> {
        let mut samples = Vec::with_capacity(metrics.len() * GPU_TYPE_METRICS.len());
        for (gpu_type, m) in metrics {
            let values = [
                ("slurm_gpu_type_alloc", m.alloc as f64),
                ("slurm_gpu_type_idle", m.idle as f64),
                ("slurm_gpu_type_total", m.total as f64),
                ("slurm_gpu_type_utilization", m.utilization),
            ];
            for (name, value) in values {
                samples.push(Sample::new(name, value).with_label("gpu", gpu_type));
            }
        }
        samples
    }
}

impl MetricsSource for GpuTypeCollector {
    fn describe(&self) -> &'static [MetricDesc] {
        GPU_TYPE_METRICS
    }

    fn collect(&self) -> Result<Vec<Sample>> {
        let output = self.source.fetch()?;
        let metrics = MetricsAggregator::aggregate_gpu_types(&output);
        tracing::debug!(
            "Collected {} GPU type(s) from {}",
            metrics.len(),
            self.source.describe()
        );
        Ok(Self::samples(&metrics))
    }
}
