//! Classification of raw diagram text handed over by the analysis service.
//!
//! The generator wraps diagrams in markdown fences and occasionally returns a
//! hosted embed link instead of diagram code. Only `Mermaid` sources enter the
//! normalize/render ladder.

/// Prefix marking a hosted diagram embed rather than diagram code.
pub const EMBED_PREFIX: &str = "LUCID_EMBED::";

const FENCE_OPEN: &str = "```mermaid\n";
const FENCE: &str = "```";

/// A classified diagram source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramSource {
    /// Nothing left after fence removal.
    Empty,
    /// Hosted embed; the payload is the embed URL.
    Embed(String),
    /// Diagram-description text, kept verbatim.
    Mermaid(String),
}

impl DiagramSource {
    /// Classify raw text returned by the analysis service.
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        let code = strip_fences(raw);
        if code.trim().is_empty() {
            return Self::Empty;
        }
        if let Some(url) = code.trim_start().strip_prefix(EMBED_PREFIX) {
            return Self::Embed(url.trim().to_owned());
        }
        Self::Mermaid(code)
    }

    /// The diagram code, if this source is renderable.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Mermaid(code) => Some(code),
            Self::Empty | Self::Embed(_) => None,
        }
    }
}

/// Remove markdown code fences wrapping a diagram.
#[must_use]
pub fn strip_fences(raw: &str) -> String {
    raw.replace(FENCE_OPEN, "").replace(FENCE, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_strips_mermaid_fence() {
        let raw = "```mermaid\nflowchart TD\nA[Start] --> B[End]\n```";
        assert_eq!(
            DiagramSource::classify(raw),
            DiagramSource::Mermaid("flowchart TD\nA[Start] --> B[End]\n".into())
        );
    }

    #[test]
    fn classify_empty_and_whitespace() {
        assert_eq!(DiagramSource::classify(""), DiagramSource::Empty);
        assert_eq!(DiagramSource::classify("  \n\t"), DiagramSource::Empty);
        assert_eq!(DiagramSource::classify("```mermaid\n```"), DiagramSource::Empty);
    }

    #[test]
    fn classify_embed_link() {
        let source = DiagramSource::classify("LUCID_EMBED::https://lucid.app/embed/abc");
        assert_eq!(source, DiagramSource::Embed("https://lucid.app/embed/abc".into()));
        assert!(source.code().is_none());
    }

    #[test]
    fn classify_keeps_code_verbatim() {
        let source = DiagramSource::classify("  graph TD\n  A[x]  ");
        assert_eq!(source.code(), Some("  graph TD\n  A[x]  "));
    }
}
