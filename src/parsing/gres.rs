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

// GRES descriptor parsing, e.g. `gpu:A100:4(S:0-1)` or `gpu:A100:2(IDX:0,3)`.

use once_cell::sync::Lazy;
use regex::Regex;

/// `gpu:<type>:<count>` with an ignored suffix. ASCII digits only, `\d`
/// would also admit other Unicode decimal digits.
static GPU_GRES_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^gpu:([^:]+):([0-9]+)").unwrap());

/// A GPU entry extracted from a GRES descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuGres<'a> {
    /// GPU model label, verbatim (no case folding or trimming)
    pub gpu_type: &'a str,
    pub count: u64,
}

/// Extract the GPU type and count from a GRES descriptor.
///
/// Returns `None` for anything that does not start with `gpu:<type>:<digits>`,
/// including `(null)`, untyped `gpu:4` and non-GPU resources.
pub fn parse_gpu_gres(descriptor: &str) -> Option<GpuGres<'_>> {
    let caps = GPU_GRES_REGEX.captures(descriptor)?;
    let gpu_type = caps.get(1)?.as_str();
    let digits = caps.get(2)?.as_str();

    match digits.parse::<u32>() {
        Ok(count) => Some(GpuGres {
            gpu_type,
            count: u64::from(count),
        }),
        Err(e) => {
            // Only reachable with a digit run wider than 32 bits
            tracing::error!("GPU count '{digits}' in '{descriptor}' could not be parsed: {e}");
            None
        }
    }
}
