//! Safe-fallback synthesis: a minimal diagram that always renders.
//!
//! When normalization is not enough, the orchestrator gives up on the
//! generator's structure and keeps only what can be pattern-matched out of
//! the original text: node declarations. Edges are never inferred here.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Last-resort diagram used when no node declaration can be extracted.
pub const GENERIC_ARCHITECTURE: &str = "flowchart TD
    UI[User Interface Layer] --> BL[Business Logic Layer]
    BL --> DAL[Data Access Layer]
    DAL --> DB[Database]
    BL --> API[External APIs]
    BL --> SEC[Security Layer]
    UI --> AUTH[Authentication]
    AUTH --> SEC
    style UI fill:#e1f5fe
    style BL fill:#f3e5f5
    style DAL fill:#e8f5e8
    style DB fill:#fff3e0
    style API fill:#fce4ec
    style SEC fill:#ffebee
    style AUTH fill:#f1f8e9";

static NODE_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][A-Za-z0-9_]*)\[([^\]\n]+)\]").expect("NODE_DECLARATION is a valid static regex pattern")
});

/// A node id and label pulled out of diagram text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    pub id: String,
    pub label: String,
}

/// Extract `ID[label]` declarations with an uppercase-initial id.
///
/// A label never spans lines, so an unclosed bracket yields no node. Labels
/// lose characters the renderer treats as syntax. Declarations whose label
/// ends up empty are skipped; the first declaration of an id wins.
#[must_use]
pub fn extract_nodes(source: &str) -> Vec<NodeDescriptor> {
    let mut nodes: Vec<NodeDescriptor> = Vec::new();
    for caps in NODE_DECLARATION.captures_iter(source) {
        let label = sanitize_label(&caps[2]);
        if label.is_empty() || nodes.iter().any(|n| n.id == caps[1]) {
            continue;
        }
        nodes.push(NodeDescriptor { id: caps[1].to_owned(), label });
    }
    nodes
}

/// Build the fallback diagram from the original, unnormalized source.
#[must_use]
pub fn synthesize(original: &str) -> String {
    let nodes = extract_nodes(original);
    if nodes.is_empty() {
        debug!("fallback: no node declarations; using generic architecture");
        return GENERIC_ARCHITECTURE.to_owned();
    }

    let mut out = String::from("graph TD\n");
    for node in &nodes {
        let _ = writeln!(out, "  {}[{}]", node.id, node.label);
    }
    out
}

/// Flat flowchart connecting `nodes` in the order given.
#[must_use]
pub fn flat_chain(nodes: &[NodeDescriptor]) -> String {
    let mut out = String::from("flowchart TD\n");
    for node in nodes {
        let _ = writeln!(out, "  {}[{}]", node.id, node.label);
    }
    for pair in nodes.windows(2) {
        let _ = writeln!(out, "  {} --> {}", pair[0].id, pair[1].id);
    }
    out
}

fn sanitize_label(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '<' | '>' | '[' | ']' | '(' | ')' | '{' | '}' | '|' | '"' | '\r'))
        .collect::<String>()
        .trim()
        .to_owned()
}

#[cfg(test)]
#[path = "fallback_test.rs"]
mod tests;
