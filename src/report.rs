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

//! One-shot GPU allocation report for the `report` subcommand.

use std::fmt::Write as _;

use serde::Serialize;

use crate::cli::ReportArgs;
use crate::common::config::SourceConfig;
use crate::error::Result;
use crate::metrics::{GpuMetrics, GpuTypeMetrics, MetricsAggregator};
use crate::slurm::GresSource;

/// Both aggregations computed over the same `sinfo` output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuReport {
    pub gpus: GpuMetrics,
    pub gpu_types: GpuTypeMetrics,
}

impl GpuReport {
    pub fn from_output(output: &str) -> Self {
        Self {
            gpus: MetricsAggregator::aggregate_gpus(output),
            gpu_types: MetricsAggregator::aggregate_gpu_types(output),
        }
    }

    pub fn collect(source: &dyn GresSource) -> Result<Self> {
        let output = source.fetch()?;
        Ok(Self::from_output(&output))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Fixed-width table, one line per GPU type followed by the cluster total.
    pub fn render_table(&self) -> String {
        let width = self
            .gpu_types
            .iter()
            .map(|(gpu_type, _)| gpu_type.len())
            .max()
            .unwrap_or(0)
            .max("GPU TYPE".len());

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<width$} {:>8} {:>8} {:>8} {:>7}",
            "GPU TYPE", "ALLOC", "IDLE", "TOTAL", "UTIL"
        );
        for (gpu_type, m) in &self.gpu_types {
            write_row(&mut out, gpu_type, m, width);
        }
        write_row(&mut out, "(all)", &self.gpus, width);
        out
    }
}

fn write_row(out: &mut String, label: &str, m: &GpuMetrics, width: usize) {
    let _ = writeln!(
        out,
        "{label:<width$} {:>8} {:>8} {:>8} {:>6.1}%",
        m.alloc,
        m.idle,
        m.total,
        m.utilization * 100.0
    );
}

pub fn run_report_mode(args: &ReportArgs) -> Result<()> {
    let config = SourceConfig::from_args(&args.source)?;
    let source = config.build_source();
    tracing::debug!("Collecting GPU report from {}", source.describe());

    let report = GpuReport::collect(source.as_ref())?;
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_table());
    }
    Ok(())
}
