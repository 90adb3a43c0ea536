//! Syntax normalizer — best-effort repair of generated flowchart text.
//!
//! DESIGN
//! ======
//! The generator upstream produces flowcharts that are close to valid but
//! trip the renderer in a handful of recurring ways: `<br>` tags, parentheses
//! inside labels, labelled edges, `subgraph` blocks with braces, and
//! single-letter ids that collide with label text. Each repair is a named
//! stage in [`STAGES`]; stages run in order and each one assumes the earlier
//! ones already ran.
//!
//! A stage either continues the pipeline or finishes it early (the grouping
//! stage replaces the whole diagram when it flattens). A stage error is
//! logged and the stage's input carries on unchanged, so [`normalize`] is
//! total.
//!
//! TRADE-OFFS
//! ==========
//! Renderability wins over fidelity: edge labels are dropped, parenthetical
//! label suffixes are dropped, and grouping blocks are always flattened.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};

use super::fallback::{GENERIC_ARCHITECTURE, extract_nodes, flat_chain};
use super::tokens::{RewriteRules, rewrite_bare_tokens};

// =============================================================================
// TYPES
// =============================================================================

/// Errors a normalizer stage may report. Never escapes [`normalize`].
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// A pattern built from diagram content failed to compile.
    #[error("identifier pattern for {id} failed to compile: {source}")]
    Pattern { id: String, source: regex::Error },
}

type StageResult = Result<ControlFlow<String, String>, NormalizeError>;

/// A named text transform in the normalizer pipeline.
pub struct Stage {
    pub name: &'static str,
    pub run: fn(&str) -> StageResult,
}

/// The normalizer pipeline, in execution order.
pub const STAGES: &[Stage] = &[
    Stage { name: "line_breaks", run: unify_line_breaks },
    Stage { name: "label_suffixes", run: collapse_label_suffixes },
    Stage { name: "slash_parens", run: strip_slash_parens },
    Stage { name: "grouping", run: flatten_grouping },
    Stage { name: "header", run: space_header },
    Stage { name: "bare_parens", run: bracket_bare_parens },
    Stage { name: "nested_parens", run: strip_nested_parens },
    Stage { name: "edge_labels", run: strip_edge_labels },
    Stage { name: "whitespace", run: canonicalize_whitespace },
    Stage { name: "expand_ids", run: expand_single_letter_ids },
];

/// Hint tags that pick the prefix for an expanded single-letter id.
pub const CATEGORY_HINTS: &[&str] =
    &["UI", "APP", "BIZ", "DATA", "SEC", "INFRA", "API", "CTRL", "SVC", "REPO", "DB", "UTIL", "EXT"];

/// Prefix used when a declaration carries no recognized hint tag.
pub const GENERIC_PREFIX: &str = "NODE";

// =============================================================================
// PATTERNS
// =============================================================================

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static normalizer pattern is valid")
}

static BREAK_TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)<br\s*/?>"));
static LABEL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| compile(r"([A-Z])\[([^\]]*?)(?:<br>|\(([^)]*)\))[^\]]*?\]"));
static SLASH_PAREN: LazyLock<Regex> = LazyLock::new(|| compile(r"([A-Z])\[([^\]]*?)/\([^)]*\)([^\]]*?)\]"));

static GROUPING_KEYWORD: LazyLock<Regex> = LazyLock::new(|| compile(r"\bsubgraph\b"));
static GROUP_HEAD: LazyLock<Regex> = LazyLock::new(|| compile(r"subgraph[ \t]+([^\n]+)"));
static GROUP_LINE: LazyLock<Regex> = LazyLock::new(|| compile(r"subgraph[ \t]*([A-Za-z0-9_ \t]+?)[ \t]*\n"));
static GROUP_END: LazyLock<Regex> = LazyLock::new(|| compile(r"end[ \t]*\n"));
static GROUP_BRACE: LazyLock<Regex> = LazyLock::new(|| compile(r"subgraph[ \t]*([^\n{]+?)[ \t]*\{"));
static BRACE_END: LazyLock<Regex> = LazyLock::new(|| compile(r"\}\s*end"));

static HEADER: LazyLock<Regex> = LazyLock::new(|| compile(r"flowchart[ \t]*([A-Z]+)"));
static BARE_PAREN: LazyLock<Regex> = LazyLock::new(|| compile(r"\b([A-Za-z]\w*)[ \t]*\(([^()\n]+)\)"));
static NESTED_PAREN: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\b([A-Za-z]\w*)\[([^\]\n]*?\([^)\n]*\)[^\]\n]*?)\]"));

static QUOTED_EDGE_LABEL: LazyLock<Regex> = LazyLock::new(|| compile(r#"--\s*"[^"]*"\s*-->"#));
static PIPE_EDGE_LABEL: LazyLock<Regex> = LazyLock::new(|| compile(r"--\s*\|[^|]*\|\s*-->"));
static TRAILING_PIPE_LABEL: LazyLock<Regex> = LazyLock::new(|| compile(r"(-->|---)[ \t]*\|[^|\n]*\|"));

static ARROW: LazyLock<Regex> = LazyLock::new(|| compile(r"[ \t]*-->[ \t]*"));
static LINK: LazyLock<Regex> = LazyLock::new(|| compile(r"[ \t]*---[ \t]*"));
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| compile(r"\n\s*\n"));

static LETTER_DECLARATION: LazyLock<Regex> = LazyLock::new(|| compile(r"^\s*([A-Za-z])\s*\[([^\]\n]*)"));
static HINT_TAG: LazyLock<Regex> = LazyLock::new(|| compile(r":::(\w+)"));
static CLASS_STATEMENT: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?m)^([ \t]*)class[ \t]+([\w, \t]+?)[ \t]+([A-Za-z_]\w*)[ \t]*(;?)[ \t]*$"));

static DOUBLED_LETTERS: LazyLock<HashMap<String, String>> =
    LazyLock::new(|| ('A'..='Z').map(|c| (c.to_string(), format!("{c}{c}"))).collect());

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Run every stage over `source` and return text believed renderable.
#[must_use]
pub fn normalize(source: &str) -> String {
    run_stages(STAGES, source)
}

/// Run `stages` in order. A failing stage is skipped with its input intact.
fn run_stages(stages: &[Stage], source: &str) -> String {
    let mut text = source.to_owned();
    for stage in stages {
        match (stage.run)(&text) {
            Ok(ControlFlow::Continue(next)) => text = next,
            Ok(ControlFlow::Break(done)) => {
                debug!(stage = stage.name, "normalize: pipeline finished early");
                return done;
            }
            Err(e) => warn!(stage = stage.name, error = %e, "normalize: stage failed; keeping previous text"),
        }
    }
    text
}

/// Conservative retry transform: double every bare single uppercase id.
///
/// Used by the orchestrator after the primary render fails, independently of
/// the id expansion stage.
#[must_use]
pub fn double_letter_ids(text: &str) -> String {
    let doubled = rewrite_bare_tokens(text, &DOUBLED_LETTERS, RewriteRules::ALL);
    remap_class_statements(&doubled, |id| DOUBLED_LETTERS.get(id).cloned())
}

// =============================================================================
// STAGES
// =============================================================================

fn unify_line_breaks(text: &str) -> StageResult {
    Ok(ControlFlow::Continue(BREAK_TAG.replace_all(text, " ").into_owned()))
}

/// `A[Primary (detail)]` → `A[Primary]`. An empty primary keeps the detail.
fn collapse_label_suffixes(text: &str) -> StageResult {
    let out = LABEL_SUFFIX.replace_all(text, |caps: &Captures| {
        let primary = caps[2].trim();
        let label = if primary.is_empty() {
            caps.get(3).map_or("", |m| m.as_str()).trim()
        } else {
            primary
        };
        format!("{}[{label}]", &caps[1])
    });
    Ok(ControlFlow::Continue(out.into_owned()))
}

/// `Q[api/(GET)v1]` → `Q[apiv1]`.
fn strip_slash_parens(text: &str) -> StageResult {
    let out = SLASH_PAREN.replace_all(text, |caps: &Captures| {
        let joined = format!("{}{}", &caps[2], &caps[3]);
        format!("{}[{}]", &caps[1], joined.trim())
    });
    Ok(ControlFlow::Continue(out.into_owned()))
}

/// Grouping blocks are repaired, then flattened if the keyword survives.
fn flatten_grouping(text: &str) -> StageResult {
    if !GROUPING_KEYWORD.is_match(text) {
        return Ok(ControlFlow::Continue(text.to_owned()));
    }

    let repaired = repair_grouping(text);
    if !GROUPING_KEYWORD.is_match(&repaired) {
        return Ok(ControlFlow::Continue(repaired));
    }

    let nodes = extract_nodes(&repaired);
    debug!(nodes = nodes.len(), "normalize: flattening grouping block");
    if nodes.is_empty() {
        return Ok(ControlFlow::Break(GENERIC_ARCHITECTURE.to_owned()));
    }
    Ok(ControlFlow::Break(flat_chain(&nodes)))
}

fn repair_grouping(text: &str) -> String {
    let text = GROUP_HEAD.replace_all(text, "subgraph $1");
    let text = GROUP_LINE.replace_all(&text, "subgraph $1\n");
    let text = GROUP_END.replace_all(&text, "end\n");
    let text = GROUP_BRACE.replace_all(&text, "subgraph $1\n");
    BRACE_END.replace_all(&text, "\nend").into_owned()
}

fn space_header(text: &str) -> StageResult {
    Ok(ControlFlow::Continue(HEADER.replace_all(text, "flowchart $1").into_owned()))
}

/// `id(text)` → `id[text]`, outside labels and style directives.
fn bracket_bare_parens(text: &str) -> StageResult {
    let out = BARE_PAREN.replace_all(text, |caps: &Captures| {
        let start = caps.get(0).map_or(0, |m| m.start());
        if inside_label_or_directive(text, start) {
            caps[0].to_owned()
        } else {
            format!("{}[{}]", &caps[1], &caps[2])
        }
    });
    Ok(ControlFlow::Continue(out.into_owned()))
}

/// `a[x (y) z]` → `a[x y z]`.
fn strip_nested_parens(text: &str) -> StageResult {
    let out = NESTED_PAREN.replace_all(text, |caps: &Captures| {
        let label = caps[2].replace(['(', ')'], "");
        format!("{}[{}]", &caps[1], label.trim())
    });
    Ok(ControlFlow::Continue(out.into_owned()))
}

fn strip_edge_labels(text: &str) -> StageResult {
    let text = QUOTED_EDGE_LABEL.replace_all(text, " --> ");
    let text = PIPE_EDGE_LABEL.replace_all(&text, " --> ");
    let text = TRAILING_PIPE_LABEL.replace_all(&text, " $1 ");
    Ok(ControlFlow::Continue(text.into_owned()))
}

fn canonicalize_whitespace(text: &str) -> StageResult {
    let text = ARROW.replace_all(text, " --> ");
    let text = LINK.replace_all(&text, " --- ");
    let text = BLANK_LINES.replace_all(&text, "\n");
    Ok(ControlFlow::Continue(text.trim().to_owned()))
}

/// `A[Login]:::ui` → `UI_A[Login]:::ui`, with every bare `A` following along.
///
/// Mid-line `A[..]` sites follow only when they repeat the declared label.
fn expand_single_letter_ids(text: &str) -> StageResult {
    let mut renames: HashMap<String, String> = HashMap::new();
    let mut labels: HashMap<String, String> = HashMap::new();
    for line in text.lines() {
        if let Some(caps) = LETTER_DECLARATION.captures(line) {
            let id = &caps[1];
            if !renames.contains_key(id) {
                renames.insert(id.to_owned(), format!("{}_{id}", category_prefix(line)));
                labels.insert(id.to_owned(), caps[2].trim().to_owned());
            }
        }
    }
    if renames.is_empty() {
        return Ok(ControlFlow::Continue(text.to_owned()));
    }

    let mut updated = text.to_owned();
    for (old, new) in &renames {
        let site = declaration_site(old)?;
        updated = site
            .replace_all(&updated, |caps: &Captures| format!("{}{new}{}", &caps[1], &caps[2]))
            .into_owned();
    }
    updated = remap_class_statements(&updated, |id| renames.get(id).cloned());
    updated = rewrite_bare_tokens(&updated, &renames, RewriteRules { declared_labels: Some(&labels) });

    Ok(ControlFlow::Continue(updated))
}

// =============================================================================
// HELPERS
// =============================================================================

fn category_prefix(line: &str) -> &'static str {
    HINT_TAG
        .captures(line)
        .and_then(|caps| {
            let hint = caps[1].to_ascii_uppercase();
            CATEGORY_HINTS.iter().copied().find(|known| *known == hint)
        })
        .unwrap_or(GENERIC_PREFIX)
}

fn declaration_site(id: &str) -> Result<Regex, NormalizeError> {
    let pattern = format!(r"(?m)^([ \t]*){}([ \t]*\[)", regex::escape(id));
    Regex::new(&pattern).map_err(|source| NormalizeError::Pattern { id: id.to_owned(), source })
}

/// Rewrite the id list of every `class a,b name;` statement.
fn remap_class_statements(text: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    CLASS_STATEMENT
        .replace_all(text, |caps: &Captures| {
            let ids = caps[2]
                .split(',')
                .map(|id| {
                    let id = id.trim();
                    lookup(id).unwrap_or_else(|| id.to_owned())
                })
                .collect::<Vec<_>>()
                .join(",");
            format!("{}class {ids} {}{}", &caps[1], &caps[3], &caps[4])
        })
        .into_owned()
}

/// True when `offset` sits inside an open `[` on its line, or on a style line.
fn inside_label_or_directive(text: &str, offset: usize) -> bool {
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &text[line_start..offset];
    if matches!(
        prefix.split_whitespace().next(),
        Some("style" | "classDef" | "linkStyle" | "click")
    ) {
        return true;
    }
    let opened = prefix.matches('[').count();
    let closed = prefix.matches(']').count();
    opened > closed
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
