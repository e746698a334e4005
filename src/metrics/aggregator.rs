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

use std::collections::btree_map::{self, BTreeMap};

use serde::Serialize;

use crate::parsing::{parse_gpu_gres, rows, NodeGroupRow};

/// Allocation snapshot for a set of GPUs.
///
/// Counts use wrapping arithmetic: the scheduler output is trusted, so a row
/// reporting more used than declared GPUs is not clamped. `alloc + idle`
/// equals `total` modulo 2^64 for every input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GpuMetrics {
    pub alloc: u64,
    pub idle: u64,
    pub total: u64,
    /// `alloc / total`, 0.0 when there are no GPUs
    pub utilization: f64,
}

impl GpuMetrics {
    fn finalize(&mut self) {
        self.utilization = utilization(self.alloc, self.total);
    }
}

/// Per GPU type snapshot, ordered by type label.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GpuTypeMetrics {
    types: BTreeMap<String, GpuMetrics>,
}

impl GpuTypeMetrics {
    pub fn get(&self, gpu_type: &str) -> Option<&GpuMetrics> {
        self.types.get(gpu_type)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, GpuMetrics> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl<'a> IntoIterator for &'a GpuTypeMetrics {
    type Item = (&'a String, &'a GpuMetrics);
    type IntoIter = btree_map::Iter<'a, String, GpuMetrics>;

    fn into_iter(self) -> Self::IntoIter {
        self.types.iter()
    }
}

/// Aggregates `sinfo` node-group output into GPU allocation snapshots.
///
/// Both entry points are pure: they never fail, never keep state between
/// calls and log malformed rows instead of rejecting the whole input.
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Allocation broken down by GPU type.
    ///
    /// A row only counts when both its `Gres` and `GresUsed` descriptors
    /// name the same GPU type. Idle GPUs are derived per row before being
    /// scaled by the node count.
    pub fn aggregate_gpu_types(input: &str) -> GpuTypeMetrics {
        let mut types: BTreeMap<String, GpuMetrics> = BTreeMap::new();

        for row in rows(input) {
            let (Some(declared), Some(used)) =
                (parse_gpu_gres(row.gres), parse_gpu_gres(row.gres_used))
            else {
                continue;
            };

            if declared.gpu_type != used.gpu_type {
                tracing::warn!(
                    "GPU types in Gres '{}' and GresUsed '{}' do not match",
                    declared.gpu_type,
                    used.gpu_type
                );
                continue;
            }

            if used.count > declared.count {
                warn_overcommitted(&row, declared.count, used.count);
            }

            let row_idle = declared.count.wrapping_sub(used.count);
            let entry = types.entry(declared.gpu_type.to_string()).or_default();
            entry.alloc = entry.alloc.wrapping_add(used.count * row.nodes);
            entry.idle = entry.idle.wrapping_add(row_idle.wrapping_mul(row.nodes));
            entry.total = entry.total.wrapping_add(declared.count * row.nodes);
        }

        for metrics in types.values_mut() {
            metrics.finalize();
        }

        GpuTypeMetrics { types }
    }

    /// Cluster-wide allocation regardless of GPU type.
    ///
    /// Each side of a row is parsed on its own: a descriptor that does not
    /// match counts as zero GPUs for that side only. Idle GPUs are derived
    /// once from the totals. Rows using more GPUs than they declare are
    /// logged but still counted.
    pub fn aggregate_gpus(input: &str) -> GpuMetrics {
        let mut total = 0u64;
        let mut alloc = 0u64;

        for row in rows(input) {
            let declared = parse_gpu_gres(row.gres).map_or(0, |g| g.count);
            let used = parse_gpu_gres(row.gres_used).map_or(0, |g| g.count);
            if used > declared {
                warn_overcommitted(&row, declared, used);
            }
            total = total.wrapping_add(declared * row.nodes);
            alloc = alloc.wrapping_add(used * row.nodes);
        }

        let mut metrics = GpuMetrics {
            alloc,
            idle: total.wrapping_sub(alloc),
            total,
            utilization: 0.0,
        };
        metrics.finalize();
        metrics
    }
}

fn utilization(alloc: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        alloc as f64 / total as f64
    }
}

fn warn_overcommitted(row: &NodeGroupRow<'_>, declared: u64, used: u64) {
    tracing::warn!(
        "GresUsed '{}' reports {used} GPUs but Gres '{}' declares only {declared}",
        row.gres_used,
        row.gres
    );
}
