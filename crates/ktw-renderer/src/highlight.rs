//! Syntax highlighting for fenced code blocks.
//!
//! The renderer owns the `<pre>`/`<code>` wrapper around every fence, so a
//! [`Highlighter`] returns only inline markup: escaped source text with
//! `<span class="...">` elements around tokens, never a container element.

use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::state::escape_html;

/// Error returned by a highlighter.
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    /// The underlying tokenizer failed.
    #[error("syntax highlighting failed: {0}")]
    Syntect(#[from] syntect::Error),
    /// Failure reported by another highlighter implementation.
    #[error("{0}")]
    Failed(String),
}

/// Produces inline, class-annotated markup for a code block.
///
/// Implementations must not emit their own `<pre>` or `<code>` wrapper.
pub trait Highlighter: Send + Sync {
    /// Highlight `source` written in `language`.
    ///
    /// Unknown languages should produce escaped plain text rather than fail.
    fn highlight(&self, language: &str, source: &str) -> Result<String, HighlightError>;
}

/// Highlighter backed by syntect's bundled grammars.
///
/// Tokens are wrapped in spans whose classes are the space-separated scope
/// names (e.g. `<span class="keyword control go">`), so styling is left to a
/// stylesheet.
pub struct SyntectHighlighter {
    syntaxes: SyntaxSet,
}

impl SyntectHighlighter {
    /// Load the default syntax definitions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
        }
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, language: &str, source: &str) -> Result<String, HighlightError> {
        let syntax = self
            .syntaxes
            .find_syntax_by_token(language)
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text());

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntaxes, ClassStyle::Spaced);
        for line in LinesWithEndings::from(source) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }
        Ok(generator.finalize())
    }
}

/// Highlighter that only escapes the source.
///
/// Useful when output must not depend on grammar definitions.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, _language: &str, source: &str) -> Result<String, HighlightError> {
        Ok(escape_html(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_highlighter_escapes() {
        let html = PlainHighlighter.highlight("go", "a < b && c").unwrap();
        assert_eq!(html, "a &lt; b &amp;&amp; c");
    }

    #[test]
    fn test_syntect_emits_spans_without_wrapper() {
        let highlighter = SyntectHighlighter::new();
        let html = highlighter
            .highlight("rust", "fn main() {}\n")
            .unwrap();
        assert!(html.contains("<span class="));
        assert!(html.contains("main"));
        assert!(!html.contains("<pre"));
        assert!(!html.contains("<code"));
    }

    #[test]
    fn test_syntect_unknown_language_falls_back_to_plain_text() {
        let highlighter = SyntectHighlighter::new();
        let html = highlighter
            .highlight("unknown", "<b>not bold</b>\n")
            .unwrap();
        assert!(html.contains("&lt;b&gt;not bold&lt;/b&gt;"));
        assert!(!html.contains("<pre"));
    }

    #[test]
    fn test_syntect_matches_extension_token() {
        let highlighter = SyntectHighlighter::new();
        let by_name = highlighter.highlight("python", "x = 1\n").unwrap();
        let by_ext = highlighter.highlight("py", "x = 1\n").unwrap();
        assert_eq!(by_name, by_ext);
    }
}
