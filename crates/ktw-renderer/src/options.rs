//! Engine configuration.
//!
//! All settings live in one immutable [`EngineConfig`] value that is built
//! once at startup and handed to [`Engine`](crate::Engine) by value. Nothing
//! is applied incrementally, so the order in which fields are set never
//! matters.

use pulldown_cmark::Options;

use crate::callout::{CalloutRegistry, DEFAULT_CALLOUT_PRIORITY};

/// How a soft line break inside a paragraph is written to the output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SoftBreak {
    /// Fold the break into a single space.
    #[default]
    Space,
    /// Keep the break as a newline character.
    Newline,
}

/// Markdown syntax extensions understood by the parser.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ParserOptions {
    /// GitHub Flavored Markdown: tables, strikethrough and task lists.
    pub gfm: bool,
    /// Footnote references and definitions.
    pub footnotes: bool,
    /// Typographic quotes, dashes and ellipses.
    pub smart_punctuation: bool,
    /// `# Heading {#id .class}` attribute blocks.
    pub heading_attributes: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            footnotes: true,
            smart_punctuation: true,
            heading_attributes: true,
        }
    }
}

impl ParserOptions {
    /// Translate into `pulldown-cmark` parser flags.
    #[must_use]
    pub fn to_pulldown(&self) -> Options {
        let mut options = Options::empty();
        if self.gfm {
            options |=
                Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
        }
        if self.footnotes {
            options |= Options::ENABLE_FOOTNOTES;
        }
        if self.smart_punctuation {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }
        if self.heading_attributes {
            options |= Options::ENABLE_HEADING_ATTRIBUTES;
        }
        options
    }
}

/// Output settings for the HTML writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RendererOptions {
    /// Soft line break handling.
    pub soft_break: SoftBreak,
    /// Pass raw HTML through unchanged. When `false` it is escaped.
    pub raw_html: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            soft_break: SoftBreak::default(),
            raw_html: true,
        }
    }
}

/// Complete, immutable engine configuration.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Callout recognizers, tried before plain paragraph rendering.
    pub callouts: CalloutRegistry,
    /// Parser extensions.
    pub parser: ParserOptions,
    /// HTML writer settings.
    pub renderer: RendererOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            callouts: CalloutRegistry::standard(DEFAULT_CALLOUT_PRIORITY),
            parser: ParserOptions::default(),
            renderer: RendererOptions::default(),
        }
    }
}
