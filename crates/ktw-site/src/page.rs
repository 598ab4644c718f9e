//! Page composition.
//!
//! A [`Page`] renders its content items in order into separate buffers,
//! wraps the fragments in a minimal HTML document and writes the result to
//! the sink in a single call. Any failure happens before that write, so a
//! sink never receives part of a page.

use std::io;

use ktw_renderer::escape_html;

use crate::cancel::Cancellation;
use crate::content::{ContentError, Render};
use crate::frontmatter::Metadata;

/// Comment placed in every generated `<head>`.
pub const GENERATOR_COMMENT: &str = "<!-- Generated by ktw -->";

/// Error returned when composing a page.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// A content item failed; `index` is its position in the page.
    #[error("content item {index} failed to render: {source}")]
    Render {
        index: usize,
        #[source]
        source: ContentError,
    },
    #[error("rendering cancelled")]
    Cancelled,
    #[error("failed to write page: {0}")]
    Io(#[from] io::Error),
}

/// A single output document.
pub struct Page<'a> {
    pub title: String,
    pub metadata: Metadata,
    pub contents: Vec<Box<dyn Render + 'a>>,
}

impl<'a> Page<'a> {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            metadata: Metadata::new(),
            contents: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Append a content item. Items render in the order they were added.
    #[must_use]
    pub fn with_content(mut self, item: impl Render + 'a) -> Self {
        self.contents.push(Box::new(item));
        self
    }

    /// Render the page and write it to `sink` in one call.
    pub fn render<W: io::Write + ?Sized>(
        &self,
        cancel: &Cancellation,
        sink: &mut W,
    ) -> Result<(), PageError> {
        let document = self.compose(cancel)?;
        sink.write_all(document.as_bytes())?;
        Ok(())
    }

    /// Build the complete document without writing it anywhere.
    pub fn compose(&self, cancel: &Cancellation) -> Result<String, PageError> {
        let mut body = String::new();
        for (index, item) in self.contents.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(PageError::Cancelled);
            }
            let mut fragment = String::new();
            item.render(cancel, &mut fragment)
                .map_err(|source| PageError::Render { index, source })?;
            body.push_str(&fragment);
        }
        if cancel.is_cancelled() {
            return Err(PageError::Cancelled);
        }

        let title = escape_html(&self.title);
        let mut document = String::with_capacity(body.len() + title.len() + 128);
        document.push_str(r#"<html><head><meta charset="utf-8"><title>"#);
        document.push_str(&title);
        document.push_str("</title>");
        document.push_str(GENERATOR_COMMENT);
        document.push_str("</head><body>");
        document.push_str(&body);
        document.push_str("</body></html>");
        Ok(document)
    }
}
