use super::*;

// =============================================================================
// extract_nodes
// =============================================================================

#[test]
fn extract_nodes_in_order() {
    let nodes = extract_nodes("flowchart TD\nA[Start] --> B[Middle]\nB --> C[End]");
    let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let labels: Vec<&str> = nodes.iter().map(|n| n.label.as_str()).collect();
    assert_eq!(ids, ["A", "B", "C"]);
    assert_eq!(labels, ["Start", "Middle", "End"]);
}

#[test]
fn extract_nodes_accepts_multi_letter_ids() {
    let nodes = extract_nodes("API[Gateway] --> DB_1[Store]");
    assert_eq!(nodes[0], NodeDescriptor { id: "API".into(), label: "Gateway".into() });
    assert_eq!(nodes[1], NodeDescriptor { id: "DB_1".into(), label: "Store".into() });
}

#[test]
fn extract_nodes_ignores_lowercase_ids() {
    assert!(extract_nodes("api[Gateway] --> db[Store]").is_empty());
}

#[test]
fn extract_nodes_strips_angle_brackets_and_skips_empty() {
    let nodes = extract_nodes("A[<Login>] --> B[<>]");
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].label, "Login");
}

#[test]
fn extract_nodes_first_declaration_wins() {
    let nodes = extract_nodes("A[First]\nA[Second]");
    assert_eq!(nodes, vec![NodeDescriptor { id: "A".into(), label: "First".into() }]);
}

// =============================================================================
// synthesize
// =============================================================================

#[test]
fn synthesize_lists_nodes_without_edges() {
    let out = synthesize("flowchart TD\nA[Start] -->|go| B[End]\nsubgraph X {");
    assert_eq!(out, "graph TD\n  A[Start]\n  B[End]\n");
    assert!(!out.contains("-->"));
}

#[test]
fn synthesize_without_nodes_is_generic_architecture() {
    assert_eq!(synthesize(""), GENERIC_ARCHITECTURE);
    assert_eq!(synthesize("graph TD\na --> b"), GENERIC_ARCHITECTURE);
    assert_eq!(synthesize("\u{0}\u{1}]]][[[((("), GENERIC_ARCHITECTURE);
}

#[test]
fn synthesize_always_declares_a_node() {
    let inputs = ["", "A[x]", "subgraph {", "A --> B", "Z[<>]", "%% only a comment", "X[(db)]"];
    for input in inputs {
        let out = synthesize(input);
        assert!(NODE_DECLARATION.is_match(&out), "no node declaration for {input:?}: {out}");
    }
}

/// Every line after the header is a complete `  ID[label]` declaration.
fn assert_one_declaration_per_line(out: &str) {
    let declaration = regex::Regex::new(r"^  [A-Z][A-Za-z0-9_]*\[[^\]\n]+\]$").unwrap();
    let mut lines = out.lines();
    assert_eq!(lines.next(), Some("graph TD"));
    for line in lines {
        assert!(declaration.is_match(line), "broken declaration {line:?} in {out:?}");
    }
}

#[test]
fn synthesize_skips_unclosed_label() {
    let out = synthesize("graph TD\nA[Unclosed label\nB[Next] --> C[End]");
    assert_eq!(out, "graph TD\n  B[Next]\n  C[End]\n");
    assert_one_declaration_per_line(&out);
}

#[test]
fn synthesize_output_is_line_per_node() {
    let inputs = [
        "A[x]",
        "A[one\r\ntwo] --> B[ok]",
        "A[open\nB[(db)]\nC[<b>bold</b>]",
        "flowchart LR\n  Api[Gateway] -->|calls| Db[Store]\r\n  Db --> ???",
    ];
    for input in inputs {
        assert_one_declaration_per_line(&synthesize(input));
    }
}

#[test]
fn carriage_return_is_dropped_from_labels() {
    let nodes = extract_nodes("A[Login\r]");
    assert_eq!(nodes, vec![NodeDescriptor { id: "A".into(), label: "Login".into() }]);
}

#[test]
fn generic_architecture_names_the_seven_layers() {
    for id in ["UI[", "BL[", "DAL[", "DB[", "API[", "SEC[", "AUTH["] {
        assert!(GENERIC_ARCHITECTURE.contains(id), "missing {id}");
    }
}

// =============================================================================
// flat_chain
// =============================================================================

#[test]
fn flat_chain_connects_consecutive_nodes() {
    let nodes = extract_nodes("A[X] B[Y] C[Z]");
    let out = flat_chain(&nodes);
    assert_eq!(out, "flowchart TD\n  A[X]\n  B[Y]\n  C[Z]\n  A --> B\n  B --> C\n");
}

#[test]
fn flat_chain_never_spans_an_unclosed_label() {
    let out = flat_chain(&extract_nodes("subgraph G {\nA[Open\nB[Next]\nC[End]\n} end"));
    assert_eq!(out, "flowchart TD\n  B[Next]\n  C[End]\n  B --> C\n");
}

#[test]
fn flat_chain_single_node_has_no_edges() {
    let out = flat_chain(&[NodeDescriptor { id: "A".into(), label: "Only".into() }]);
    assert_eq!(out, "flowchart TD\n  A[Only]\n");
}
