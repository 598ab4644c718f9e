//! Document pipeline and site generation for ktw.
//!
//! Turns raw source files into complete HTML pages:
//!
//! 1. [`split`] cuts a document into delimiter, frontmatter and body.
//! 2. Frontmatter becomes [`Metadata`] when the delimiter starts with `---`.
//! 3. The body is rendered by a [`ktw_renderer::Engine`] as a [`Markdown`]
//!    content item.
//! 4. A [`Page`] wraps the fragments in an HTML document and writes it in one
//!    call.
//!
//! [`SiteGenerator`] runs this pipeline for every source file under a
//! directory, in parallel.
//!
//! # Example
//!
//! ```
//! use ktw_renderer::{Engine, EngineConfig, PlainHighlighter};
//! use ktw_site::{Cancellation, render_document};
//!
//! let engine = Engine::with_highlighter(EngineConfig::default(), PlainHighlighter);
//! let source = b"---\ntitle: Home\n---\nNote: hi\n";
//! let html = render_document(&engine, "index.md", source, &Cancellation::new()).unwrap();
//! assert!(html.contains("<title>Home</title>"));
//! assert!(html.contains(r#"<p class="note">hi</p>"#));
//! ```

mod cancel;
mod content;
mod document;
mod frontmatter;
mod generator;
mod page;

pub use cancel::Cancellation;
pub use content::{ContentError, Markdown, RawHtml, Render};
pub use document::{DocumentError, DocumentErrorKind, render_document};
pub use frontmatter::{Metadata, MetadataError, Split, SplitError, parse_metadata, split};
pub use generator::{
    FailurePolicy, GenerateError, GenerateReport, GeneratedPage, GeneratorConfig, SiteGenerator,
};
pub use page::{GENERATOR_COMMENT, Page, PageError};

#[cfg(test)]
mod tests {
    static_assertions::assert_impl_all!(super::Cancellation: Send, Sync);
    static_assertions::assert_impl_all!(super::GenerateError: Send, Sync);
}
