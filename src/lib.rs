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

//! Slurm GPU allocation exporter.
//!
//! Parses `sinfo` node-group output (`<nodes> <Gres> <GresUsed>` rows) into
//! allocated, idle and total GPU counts, per GPU type and cluster-wide, and
//! exposes them as Prometheus gauges.
//!
//! ```rust
//! use slurm_gpu_exporter::metrics::MetricsAggregator;
//!
//! let output = "2 gpu:T4:4(S:0-1) gpu:T4:1(IDX:0)\n";
//! let by_type = MetricsAggregator::aggregate_gpu_types(output);
//! assert_eq!(by_type.get("T4").unwrap().total, 8);
//! assert_eq!(MetricsAggregator::aggregate_gpus(output).alloc, 2);
//! ```

pub mod api;
pub mod cli;
pub mod common;
pub mod error;
pub mod metrics;
pub mod parsing;
pub mod report;
pub mod slurm;
pub mod utils;

pub use error::{Error, Result};
