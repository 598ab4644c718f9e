//! Renderable page content.

use ktw_renderer::Engine;

use crate::cancel::Cancellation;

/// Error produced by a single content item.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("content is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("{0}")]
    Failed(String),
}

/// Something that can append an HTML fragment to a page body.
///
/// Implementations write only to `out`; the composer decides whether the
/// fragment reaches the final document.
pub trait Render: Send + Sync {
    fn render(&self, cancel: &Cancellation, out: &mut String) -> Result<(), ContentError>;
}

/// Markdown source rendered through an [`Engine`].
pub struct Markdown<'a> {
    engine: &'a Engine,
    source: &'a [u8],
}

impl<'a> Markdown<'a> {
    #[must_use]
    pub fn new(engine: &'a Engine, source: &'a [u8]) -> Self {
        Self { engine, source }
    }
}

impl Render for Markdown<'_> {
    fn render(&self, _cancel: &Cancellation, out: &mut String) -> Result<(), ContentError> {
        let markdown = std::str::from_utf8(self.source)?;
        let result = self.engine.render(markdown);
        for warning in &result.warnings {
            tracing::warn!(%warning, "Markdown rendered with warnings");
        }
        out.push_str(&result.html);
        Ok(())
    }
}

/// Pre-rendered HTML inserted verbatim.
pub struct RawHtml(pub String);

impl Render for RawHtml {
    fn render(&self, _cancel: &Cancellation, out: &mut String) -> Result<(), ContentError> {
        out.push_str(&self.0);
        Ok(())
    }
}
