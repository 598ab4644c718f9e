//! Shareable rendering engine.

use crate::highlight::{Highlighter, SyntectHighlighter};
use crate::options::EngineConfig;
use crate::renderer::{MarkdownRenderer, RenderResult};

/// Markdown engine: an immutable configuration plus a highlighter.
///
/// Built once at startup and shared by reference; rendering takes `&self`, so
/// one engine serves any number of documents and threads.
pub struct Engine {
    config: EngineConfig,
    highlighter: Box<dyn Highlighter>,
}

impl Engine {
    /// Create an engine that highlights fences with syntect.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_highlighter(config, SyntectHighlighter::new())
    }

    /// Create an engine with a custom highlighter.
    #[must_use]
    pub fn with_highlighter(config: EngineConfig, highlighter: impl Highlighter + 'static) -> Self {
        Self {
            config,
            highlighter: Box::new(highlighter),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Render one Markdown document into an HTML fragment.
    ///
    /// Output is a pure function of the input and the configuration.
    pub fn render(&self, markdown: &str) -> RenderResult {
        MarkdownRenderer::new(&self.config, self.highlighter.as_ref()).render(markdown)
    }
}
