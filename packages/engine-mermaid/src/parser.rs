//! Hand-rolled line-based state machine converting a Mermaid flowchart into
//! the internal `{nodes, edges}` representation (spec §4.F). Kept free of
//! any parser-combinator dependency, in the same spirit as this workspace's
//! reference Cypher lexer — a handful of `str` scans per line is all this
//! dialect needs.

use std::collections::BTreeMap;

use graph_domain::{Edge, GraphPayload, Node};
use serde_json::json;

use crate::error::MermaidError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeKind {
    SolidArrow,
    OpenLine,
    ThickArrow,
    DottedArrow,
}

impl EdgeKind {
    fn as_str(self) -> &'static str {
        match self {
            EdgeKind::SolidArrow => "solid_arrow",
            EdgeKind::OpenLine => "open_line",
            EdgeKind::ThickArrow => "thick_arrow",
            EdgeKind::DottedArrow => "dotted_arrow",
        }
    }
}

/// Longest-match-first token table: `-.->`  must be checked before `-->`,
/// which shares its leading `-`.
const EDGE_TOKENS: &[(&str, EdgeKind)] = &[
    ("-.->", EdgeKind::DottedArrow),
    ("-->", EdgeKind::SolidArrow),
    ("---", EdgeKind::OpenLine),
    ("==>", EdgeKind::ThickArrow),
];

struct NodeRef {
    id: String,
    label: Option<String>,
    node_type: Option<&'static str>,
}

/// Parse a single `Id[label]` / `Id((label))` / `Id{label}` / `Id(label)` /
/// bare `Id` reference starting at the beginning of `s`. Returns the parsed
/// reference and the unconsumed remainder of `s`.
fn parse_node_ref(s: &str) -> Option<(NodeRef, &str)> {
    let s = s.trim_start();
    let id_end = s
        .find(|c: char| c.is_whitespace() || c == '[' || c == '(' || c == '{')
        .unwrap_or(s.len());
    if id_end == 0 {
        return None;
    }
    let id = s[..id_end].to_string();
    let rest = &s[id_end..];

    let (label, node_type, rest) = if let Some(inner) = rest.strip_prefix("((") {
        let close = inner.find("))")?;
        (Some(inner[..close].to_string()), Some("terminal"), &inner[close + 2..])
    } else if let Some(inner) = rest.strip_prefix('[') {
        let close = inner.find(']')?;
        (Some(inner[..close].to_string()), Some("process"), &inner[close + 1..])
    } else if let Some(inner) = rest.strip_prefix('{') {
        let close = inner.find('}')?;
        (Some(inner[..close].to_string()), Some("decision"), &inner[close + 1..])
    } else if let Some(inner) = rest.strip_prefix('(') {
        let close = inner.find(')')?;
        (Some(inner[..close].to_string()), Some("rounded"), &inner[close + 1..])
    } else {
        (None, None, rest)
    };

    Some((
        NodeRef {
            id,
            label,
            node_type,
        },
        rest,
    ))
}

/// Find the earliest edge token in `line`, scanning left to right and
/// preferring the longest match at a given position.
fn find_edge_token(line: &str) -> Option<(usize, usize, EdgeKind)> {
    for (idx, _) in line.char_indices() {
        for (token, kind) in EDGE_TOKENS {
            if line[idx..].starts_with(token) {
                return Some((idx, idx + token.len(), *kind));
            }
        }
    }
    None
}

/// Parse an optional `|label|` immediately following an edge token.
fn parse_inline_label(rest: &str) -> (Option<String>, &str) {
    let rest = rest.trim_start();
    if let Some(inner) = rest.strip_prefix('|') {
        if let Some(close) = inner.find('|') {
            return (Some(inner[..close].to_string()), inner[close + 1..].trim_start());
        }
    }
    (None, rest)
}

fn is_directive(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    lower.starts_with("graph ")
        || lower == "graph"
        || lower.starts_with("flowchart ")
        || lower == "flowchart"
}

struct Builder {
    nodes: BTreeMap<String, Node>,
    order: Vec<String>,
    edges: Vec<Edge>,
    seen_edges: std::collections::HashSet<(String, String)>,
}

impl Builder {
    fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            order: Vec::new(),
            edges: Vec::new(),
            seen_edges: std::collections::HashSet::new(),
        }
    }

    /// Register a node reference. The first occurrence of an id wins for
    /// label/shape; later bare references to the same id never overwrite it.
    fn upsert(&mut self, node_ref: NodeRef) {
        if self.nodes.contains_key(&node_ref.id) {
            return;
        }
        let label = node_ref.label.clone().unwrap_or_else(|| node_ref.id.clone());
        let node_type = node_ref.node_type.unwrap_or("process").to_string();
        self.order.push(node_ref.id.clone());
        self.nodes.insert(
            node_ref.id.clone(),
            Node {
                id: node_ref.id,
                label,
                node_type,
                properties: json!({}),
            },
        );
    }

    fn add_edge(&mut self, src: &str, dst: &str, kind: EdgeKind, label: Option<String>) {
        let key = (src.to_string(), dst.to_string());
        if !self.seen_edges.insert(key) {
            return;
        }
        self.edges.push(Edge {
            source_id: src.to_string(),
            target_id: dst.to_string(),
            edge_type: kind.as_str().to_string(),
            label,
            properties: json!({}),
        });
    }

    fn into_payload(self) -> GraphPayload {
        let nodes = self
            .order
            .into_iter()
            .map(|id| self.nodes.get(&id).cloned().unwrap())
            .collect();
        GraphPayload {
            nodes,
            edges: self.edges,
        }
    }
}

/// Parse Mermaid flowchart text into `{nodes, edges}`. Never partially
/// persists: on any syntax error the whole parse is discarded and the error
/// carries the offending 1-indexed line number.
pub fn parse_mermaid(text: &str) -> Result<GraphPayload, MermaidError> {
    let mut builder = Builder::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();

        if line.is_empty() || is_directive(line) {
            continue;
        }

        if let Some((edge_start, edge_end, kind)) = find_edge_token(line) {
            let left = line[..edge_start].trim();
            let (left_ref, left_rest) = parse_node_ref(left).ok_or_else(|| {
                MermaidError::new(line_no, format!("could not parse source node in '{line}'"))
            })?;
            if !left_rest.trim().is_empty() {
                return Err(MermaidError::new(
                    line_no,
                    format!("unexpected trailing text before edge in '{line}'"),
                ));
            }

            let (inline_label, after_label) = parse_inline_label(&line[edge_end..]);

            let (right_ref, right_rest) = parse_node_ref(after_label).ok_or_else(|| {
                MermaidError::new(line_no, format!("could not parse target node in '{line}'"))
            })?;
            if !right_rest.trim().is_empty() {
                return Err(MermaidError::new(
                    line_no,
                    format!("unexpected trailing text after edge in '{line}'"),
                ));
            }

            let (src, dst) = (left_ref.id.clone(), right_ref.id.clone());
            builder.upsert(left_ref);
            builder.upsert(right_ref);
            builder.add_edge(&src, &dst, kind, inline_label);
        } else {
            let (node_ref, rest) = parse_node_ref(line).ok_or_else(|| {
                MermaidError::new(line_no, format!("unrecognized syntax: '{line}'"))
            })?;
            if !rest.trim().is_empty() {
                return Err(MermaidError::new(
                    line_no,
                    format!("unexpected trailing text: '{line}'"),
                ));
            }
            builder.upsert(node_ref);
        }
    }

    Ok(builder.into_payload())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_chain() {
        let payload = parse_mermaid("graph TD\nA-->B\nB-->C").unwrap();
        assert_eq!(payload.nodes.len(), 3);
        assert_eq!(payload.edges.len(), 2);
        assert_eq!(payload.edges[0].source_id, "A");
        assert_eq!(payload.edges[0].target_id, "B");
        assert_eq!(payload.edges[0].edge_type, "solid_arrow");
    }

    #[test]
    fn parses_shapes_and_inline_label() {
        let payload = parse_mermaid(
            "graph LR\nStart((Begin)) --> Check{Is valid?}\nCheck -->|yes| Done[Process it]",
        )
        .unwrap();

        let start = payload.nodes.iter().find(|n| n.id == "Start").unwrap();
        assert_eq!(start.node_type, "terminal");
        assert_eq!(start.label, "Begin");

        let check = payload.nodes.iter().find(|n| n.id == "Check").unwrap();
        assert_eq!(check.node_type, "decision");

        let done = payload.nodes.iter().find(|n| n.id == "Done").unwrap();
        assert_eq!(done.node_type, "process");
        assert_eq!(done.label, "Process it");

        let labeled_edge = payload
            .edges
            .iter()
            .find(|e| e.source_id == "Check" && e.target_id == "Done")
            .unwrap();
        assert_eq!(labeled_edge.label.as_deref(), Some("yes"));
    }

    #[test]
    fn blank_lines_and_directives_are_ignored() {
        let payload = parse_mermaid("graph TD\n\n   \nA-->B\n").unwrap();
        assert_eq!(payload.nodes.len(), 2);
        assert_eq!(payload.edges.len(), 1);
    }

    #[test]
    fn unreferenced_node_declaration_creates_isolated_node() {
        let payload = parse_mermaid("graph TD\nA-->B\nC[Orphan]").unwrap();
        assert_eq!(payload.nodes.len(), 3);
        assert!(payload.nodes.iter().any(|n| n.id == "C" && n.label == "Orphan"));
    }

    #[test]
    fn parallel_edges_are_deduplicated() {
        let payload = parse_mermaid("graph TD\nA-->B\nA-->B").unwrap();
        assert_eq!(payload.edges.len(), 1);
    }

    #[test]
    fn syntax_error_reports_line_number() {
        let err = parse_mermaid("graph TD\nA-->B\nA --> [broken").unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn dotted_and_thick_arrows_are_distinguished_from_solid() {
        let payload = parse_mermaid("graph TD\nA-.->B\nB==>C\nC---D").unwrap();
        assert_eq!(payload.edges[0].edge_type, "dotted_arrow");
        assert_eq!(payload.edges[1].edge_type, "thick_arrow");
        assert_eq!(payload.edges[2].edge_type, "open_line");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn ident() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9]{0,5}"
    }

    proptest! {
        /// Totality: any input either parses or fails with a located error,
        /// but never panics and never returns a partially-built payload that
        /// doesn't correspond to one full pass over the text.
        #[test]
        fn never_panics_on_arbitrary_text(text in ".{0,200}") {
            let _ = parse_mermaid(&text);
        }

        /// A chain of N distinct ids joined by `-->` always yields exactly N
        /// nodes and N-1 edges, regardless of which names are chosen.
        #[test]
        fn distinct_chain_yields_expected_counts(ids in prop::collection::vec(ident(), 2..12)) {
            let mut distinct = Vec::new();
            for id in ids {
                if !distinct.contains(&id) {
                    distinct.push(id);
                }
            }
            prop_assume!(distinct.len() >= 2);

            let body = distinct.join("-->");
            let text = format!("graph TD\n{body}");
            let payload = parse_mermaid(&text).unwrap();

            prop_assert_eq!(payload.nodes.len(), distinct.len());
            prop_assert_eq!(payload.edges.len(), distinct.len() - 1);
        }
    }
}
