//! Whole-token rewriting of bare node identifiers.
//!
//! Identifier renames must not touch label text, class names, or colour
//! codes. This scanner walks each line, tracks label nesting (`[..]`, `(..)`,
//! `{..}`, `>..]` and quoted strings) and only rewrites words that sit outside
//! every label.

use std::collections::HashMap;

/// Rewrite policy for [`rewrite_bare_tokens`].
#[derive(Debug, Clone, Copy)]
pub struct RewriteRules<'a> {
    /// Declared label per token. When set, `X[label]` is rewritten only if
    /// `label` matches the one recorded for `X`; a declaration with another
    /// label is a different node and keeps its id.
    pub declared_labels: Option<&'a HashMap<String, String>>,
}

impl RewriteRules<'static> {
    /// Rewrite every bare occurrence, declarations included.
    pub const ALL: Self = Self { declared_labels: None };
}

/// Replace every bare occurrence of a mapped token with its replacement.
#[must_use]
pub fn rewrite_bare_tokens(text: &str, map: &HashMap<String, String>, rules: RewriteRules<'_>) -> String {
    if map.is_empty() {
        return text.to_owned();
    }
    text.split('\n')
        .map(|line| rewrite_line(line, map, rules))
        .collect::<Vec<_>>()
        .join("\n")
}

fn rewrite_line(line: &str, map: &HashMap<String, String>, rules: RewriteRules<'_>) -> String {
    if skips_line(line) {
        return line.to_owned();
    }

    let mut out = String::with_capacity(line.len());
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut prev: Option<char> = None;
    let mut chars = line.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if in_quote {
            in_quote = c != '"';
            out.push(c);
            prev = Some(c);
            continue;
        }

        match c {
            '"' => in_quote = true,
            '[' | '(' | '{' => depth += 1,
            // `A>label]` opens an asymmetric label; `-->` does not.
            '>' if prev.is_some_and(is_word_char) => depth += 1,
            ']' | ')' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }

        if depth == 0 && is_word_char(c) {
            let mut end = start + c.len_utf8();
            while let Some(&(i, next)) = chars.peek() {
                if !is_word_char(next) {
                    break;
                }
                end = i + next.len_utf8();
                chars.next();
            }
            let word = &line[start..end];
            let replacement = map
                .get(word)
                .filter(|_| may_rewrite(word, prev, &line[end..], rules));
            out.push_str(replacement.map_or(word, String::as_str));
            prev = word.chars().last();
            continue;
        }

        out.push(c);
        prev = Some(c);
    }

    out
}

/// Comment lines and class assignments are handled elsewhere or not at all.
fn skips_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.starts_with("%%") {
        return true;
    }
    matches!(trimmed.split_whitespace().next(), Some("class" | "classDef"))
}

fn may_rewrite(word: &str, prev: Option<char>, rest: &str, rules: RewriteRules<'_>) -> bool {
    if matches!(prev, Some(':' | '#' | '.')) {
        return false;
    }
    let (Some(labels), Some(label)) = (rules.declared_labels, bracket_label(rest)) else {
        return true;
    };
    labels.get(word).is_some_and(|declared| declared.trim() == label.trim())
}

/// Label text of a `[..]` directly following a token, up to `]` or end of line.
fn bracket_label(rest: &str) -> Option<&str> {
    let inner = rest.trim_start().strip_prefix('[')?;
    Some(inner.find(']').map_or(inner, |end| &inner[..end]))
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    const ALL: RewriteRules<'static> = RewriteRules::ALL;

    #[test]
    fn rewrites_edge_endpoints() {
        let out = rewrite_bare_tokens("A --> B", &map(&[("A", "NODE_A"), ("B", "NODE_B")]), ALL);
        assert_eq!(out, "NODE_A --> NODE_B");
    }

    #[test]
    fn leaves_label_text_alone() {
        let out = rewrite_bare_tokens("X --> Y[A plan (A)] --> Z{is A?}", &map(&[("A", "NODE_A")]), ALL);
        assert_eq!(out, "X --> Y[A plan (A)] --> Z{is A?}");
    }

    #[test]
    fn leaves_quoted_text_alone() {
        let out = rewrite_bare_tokens(r#"B["A quoted A"] --> A"#, &map(&[("A", "NODE_A")]), ALL);
        assert_eq!(out, r#"B["A quoted A"] --> NODE_A"#);
    }

    #[test]
    fn declarations_follow_only_a_matching_label() {
        let renames = map(&[("A", "NODE_A")]);
        let labels = map(&[("A", "Plan")]);
        let rules = RewriteRules { declared_labels: Some(&labels) };
        assert_eq!(rewrite_bare_tokens("B --> A[Plan] --> A", &renames, rules), "B --> NODE_A[Plan] --> NODE_A");
        assert_eq!(rewrite_bare_tokens("B --> A[ Plan ]", &renames, rules), "B --> NODE_A[ Plan ]");
        assert_eq!(rewrite_bare_tokens("B --> A[Other]", &renames, rules), "B --> A[Other]");
        assert_eq!(rewrite_bare_tokens("B --> A[Other]", &renames, ALL), "B --> NODE_A[Other]");
    }

    #[test]
    fn unclosed_declaration_compares_to_end_of_line() {
        let renames = map(&[("A", "NODE_A")]);
        let labels = map(&[("A", "Plan")]);
        let rules = RewriteRules { declared_labels: Some(&labels) };
        assert_eq!(rewrite_bare_tokens("B --> A[Plan", &renames, rules), "B --> NODE_A[Plan");
    }

    #[test]
    fn only_whole_words() {
        let out = rewrite_bare_tokens("AB --> A_1 --> A", &map(&[("A", "AA")]), ALL);
        assert_eq!(out, "AB --> A_1 --> AA");
    }

    #[test]
    fn ignores_class_suffix_colour_and_class_lines() {
        let rules = map(&[("A", "NODE_A"), ("f", "NODE_f")]);
        let text = "A:::A\nstyle A fill:#f\nclass A hot\nclassDef A fill:#fff\n%% A comment";
        let out = rewrite_bare_tokens(text, &rules, ALL);
        assert_eq!(out, "NODE_A:::A\nstyle NODE_A fill:#f\nclass A hot\nclassDef A fill:#fff\n%% A comment");
    }

    #[test]
    fn asymmetric_label_is_a_label() {
        let out = rewrite_bare_tokens("B>A flag] --> A", &map(&[("A", "AA")]), ALL);
        assert_eq!(out, "B>A flag] --> AA");
    }
}
