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

// Row tokenizer for `sinfo --Format=Nodes: ,Gres: ,GresUsed: ` output.

/// One line of `sinfo` output: a group of identical nodes that share the
/// same declared and used GRES strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeGroupRow<'a> {
    /// Number of nodes in the group
    pub nodes: u64,
    /// Declared resources (`Gres` column)
    pub gres: &'a str,
    /// Currently allocated resources (`GresUsed` column)
    pub gres_used: &'a str,
}

/// Tokenize a single line into a [`NodeGroupRow`].
///
/// Fields are separated by single spaces, so consecutive spaces produce
/// empty fields. Lines with fewer than three fields are skipped silently
/// (blank lines, header artifacts). Lines whose node count is not an
/// unsigned 32-bit decimal are skipped with a warning. Trailing fields
/// beyond the third are ignored.
pub fn parse_row(line: &str) -> Option<NodeGroupRow<'_>> {
    let mut fields = line.split(' ');
    let (Some(nodes), Some(gres), Some(gres_used)) = (fields.next(), fields.next(), fields.next())
    else {
        return None;
    };

    let Some(nodes) = parse_node_count(nodes) else {
        tracing::warn!("Invalid number of nodes in '{line}'");
        return None;
    };

    Some(NodeGroupRow {
        nodes,
        gres,
        gres_used,
    })
}

/// Iterate over all well-formed rows of a raw `sinfo` output.
pub fn rows(input: &str) -> impl Iterator<Item = NodeGroupRow<'_>> {
    input.split('\n').filter_map(parse_row)
}

fn parse_node_count(field: &str) -> Option<u64> {
    // `str::parse` accepts a leading '+', sinfo never prints one
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse::<u32>().ok().map(u64::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_row_basic() {
        let row = parse_row("4 gpu:V100:8(S:0-1) gpu:V100:4(IDX:0-3)").unwrap();
        assert_eq!(row.nodes, 4);
        assert_eq!(row.gres, "gpu:V100:8(S:0-1)");
        assert_eq!(row.gres_used, "gpu:V100:4(IDX:0-3)");
    }

    #[test]
    fn test_parse_row_ignores_trailing_fields() {
        let row = parse_row("2 gpu:T4:4 gpu:T4:1 extra fields here").unwrap();
        assert_eq!(row.nodes, 2);
        assert_eq!(row.gres_used, "gpu:T4:1");
    }

    #[test]
    fn test_parse_row_too_few_fields() {
        assert_eq!(parse_row(""), None);
        assert_eq!(parse_row("12"), None);
        assert_eq!(parse_row("12 gpu:T4:4"), None);
    }

    #[test]
    fn test_parse_row_invalid_node_count() {
        assert_eq!(parse_row("NODES GRES GRES_USED"), None);
        assert_eq!(parse_row("-1 gpu:T4:4 gpu:T4:1"), None);
        assert_eq!(parse_row("+1 gpu:T4:4 gpu:T4:1"), None);
        assert_eq!(parse_row("1.5 gpu:T4:4 gpu:T4:1"), None);
        // Does not fit into 32 bits
        assert_eq!(parse_row("4294967296 gpu:T4:4 gpu:T4:1"), None);
    }

    #[test]
    fn test_parse_row_double_space_shifts_fields() {
        // The second field is empty, the declared GRES lands in the third slot
        let row = parse_row("2  gpu:T4:4 gpu:T4:1").unwrap();
        assert_eq!(row.gres, "");
        assert_eq!(row.gres_used, "gpu:T4:4");
    }

    #[test]
    fn test_rows_skips_malformed_lines() {
        let input = "2 gpu:T4:4 gpu:T4:1\n\nbogus\nx gpu:T4:4 gpu:T4:1\n1 (null) gpu:0\n";
        let parsed: Vec<_> = rows(input).collect();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].nodes, 2);
        assert_eq!(parsed[1].gres, "(null)");
    }
}
