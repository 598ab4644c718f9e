//! Single-document pipeline: split, read metadata, render, compose.

use std::io;
use std::path::PathBuf;

use ktw_renderer::Engine;

use crate::cancel::Cancellation;
use crate::content::Markdown;
use crate::frontmatter::{Metadata, MetadataError, SplitError, split};
use crate::page::{Page, PageError};

/// Why a document failed.
#[derive(Debug, thiserror::Error)]
pub enum DocumentErrorKind {
    #[error("failed to read source: {0}")]
    Read(#[source] io::Error),
    #[error("failed to split content: {0}")]
    Split(#[from] SplitError),
    #[error("failed to parse metadata: {0}")]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error("failed to write output: {0}")]
    Write(#[source] io::Error),
}

/// A failed document and its source path.
#[derive(Debug, thiserror::Error)]
#[error("{}: {kind}", path.display())]
pub struct DocumentError {
    pub path: PathBuf,
    pub kind: DocumentErrorKind,
}

impl DocumentError {
    /// Whether the failure was a cancellation rather than a real error.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, DocumentErrorKind::Page(PageError::Cancelled))
    }
}

/// Render one source document into a complete HTML page.
///
/// `name` is the source file name; it becomes the page title unless the
/// frontmatter sets a string `title`.
pub fn render_document(
    engine: &Engine,
    name: &str,
    source: &[u8],
    cancel: &Cancellation,
) -> Result<String, DocumentErrorKind> {
    let split = split(source)?;
    tracing::debug!(name, frontmatter_bytes = split.frontmatter.len(), "Split document");

    let metadata = split.metadata()?;
    if split.has_metadata() {
        tracing::debug!(name, keys = metadata.len(), "Parsed frontmatter");
    } else {
        tracing::debug!(name, "Skipped non-YAML frontmatter");
    }

    let page = Page::new(page_title(&metadata, name))
        .with_metadata(metadata)
        .with_content(Markdown::new(engine, split.body));
    let html = page.compose(cancel)?;
    tracing::debug!(name, bytes = html.len(), "Composed page");

    Ok(html)
}

/// Frontmatter `title`, falling back to the file name.
fn page_title(metadata: &Metadata, name: &str) -> String {
    metadata
        .get("title")
        .and_then(serde_yaml::Value::as_str)
        .filter(|title| !title.trim().is_empty())
        .unwrap_or(name)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use ktw_renderer::{EngineConfig, PlainHighlighter};
    use pretty_assertions::assert_eq;

    use super::*;

    fn engine() -> Engine {
        Engine::with_highlighter(EngineConfig::default(), PlainHighlighter)
    }

    fn render(source: &[u8]) -> Result<String, DocumentErrorKind> {
        render_document(&engine(), "page.md", source, &Cancellation::new())
    }

    #[test]
    fn test_render_with_yaml_title() {
        let html = render(b"---\ntitle: Home\n---\nWarning: careful\n").unwrap();
        assert_eq!(
            html,
            r#"<html><head><meta charset="utf-8"><title>Home</title><!-- Generated by ktw --></head><body><p class="warning">careful</p></body></html>"#
        );
    }

    #[test]
    fn test_title_falls_back_to_file_name() {
        let html = render(b"---\nauthor: me\n---\nbody\n").unwrap();
        assert!(html.contains("<title>page.md</title>"));
    }

    #[test]
    fn test_non_string_title_ignored() {
        let html = render(b"---\ntitle: [a, b]\n---\nbody\n").unwrap();
        assert!(html.contains("<title>page.md</title>"));
    }

    #[test]
    fn test_non_yaml_frontmatter_not_parsed() {
        let html = render(b"+++\nthis: [is not yaml\n+++\nNote: fine\n").unwrap();
        assert!(html.contains("<title>page.md</title>"));
        assert!(html.contains(r#"<p class="note">fine</p>"#));
        assert!(!html.contains("is not yaml"));
    }

    #[test]
    fn test_missing_delimiter() {
        let err = render(b"# No frontmatter\n").unwrap_err();
        assert!(matches!(
            err,
            DocumentErrorKind::Split(SplitError::DelimiterNotFound)
        ));
    }

    #[test]
    fn test_malformed_frontmatter() {
        let err = render(b"---\ntitle: [unclosed\n---\nbody\n").unwrap_err();
        assert!(matches!(err, DocumentErrorKind::Metadata(_)));
    }

    #[test]
    fn test_invalid_utf8_body() {
        let err = render(b"---\n---\nbad \xff\n").unwrap_err();
        assert!(matches!(
            err,
            DocumentErrorKind::Page(PageError::Render { index: 0, .. })
        ));
    }

    #[test]
    fn test_cancelled() {
        let cancel = Cancellation::new();
        cancel.cancel();
        let err = render_document(&engine(), "page.md", b"---\n---\nbody\n", &cancel).unwrap_err();
        assert!(matches!(err, DocumentErrorKind::Page(PageError::Cancelled)));
    }

    #[test]
    fn test_document_error_display() {
        let err = DocumentError {
            path: PathBuf::from("docs/a.md"),
            kind: DocumentErrorKind::Split(SplitError::DelimiterNotFound),
        };
        assert_eq!(
            err.to_string(),
            "docs/a.md: failed to split content: frontmatter delimiter not found"
        );
        assert!(!err.is_cancelled());
    }
}
