//! Markdown to HTML engine for static site pages.
//!
//! This crate provides an [`Engine`] that renders Markdown into HTML fragments
//! using `pulldown-cmark` for parsing, with two extensions layered on top:
//!
//! - **Callout paragraphs**: paragraphs whose first line starts with `Note:`,
//!   `Info:` or `Warning:` are rendered as `<p class="note|info|warning">`.
//! - **Attributed code fences**: a fence info string such as
//!   `go {.good #example1}` yields
//!   `<pre class="chroma"><code class="language-go good" id="example1">`,
//!   with the body highlighted by a pluggable [`Highlighter`].
//!
//! # Architecture
//!
//! The engine is configured once through an immutable [`EngineConfig`] and is
//! safe to share across threads. Each call to [`Engine::render`] creates a
//! fresh [`MarkdownRenderer`] that walks the parser events with their source
//! offsets, so no state survives between documents.
//!
//! # Example
//!
//! ```
//! use ktw_renderer::{Engine, EngineConfig, PlainHighlighter};
//!
//! let engine = Engine::with_highlighter(EngineConfig::default(), PlainHighlighter);
//! let result = engine.render("Note: ok\n");
//! assert_eq!(result.html, r#"<p class="note">ok</p>"#);
//! ```

mod callout;
mod code_block;
mod engine;
mod highlight;
mod html;
mod options;
mod renderer;
mod state;
mod util;

pub use callout::{
    Callout, CalloutConflict, CalloutKind, CalloutRegistry, DEFAULT_CALLOUT_PRIORITY,
    PARAGRAPH_PRIORITY, Prioritized,
};
pub use code_block::{AttributeList, DEFAULT_LANGUAGE, FenceInfo, is_allowed_attribute};
pub use engine::Engine;
pub use highlight::{HighlightError, Highlighter, PlainHighlighter, SyntectHighlighter};
pub use options::{EngineConfig, ParserOptions, RendererOptions, SoftBreak};
pub use renderer::{MarkdownRenderer, RenderResult};
pub use state::{TocEntry, escape_html, slugify};
