//! Markdown to HTML renderer.
//!
//! Walks `pulldown-cmark` events with their source offsets. Offsets are needed
//! at paragraph starts, where the callout registry inspects the raw first line
//! to decide between a plain `<p>` and a classed callout paragraph.

use std::fmt::Write;

use pulldown_cmark::{self as md, CowStr, Event, Parser, Tag, TagEnd};

use crate::code_block::{FenceInfo, is_allowed_attribute};
use crate::highlight::Highlighter;
use crate::html;
use crate::options::{EngineConfig, SoftBreak};
use crate::state::{
    CodeBlockKind, CodeBlockState, FootnoteState, HeadingAttributes, HeadingState, ImageState,
    PrefixStrip, TableState, TocEntry, escape_html,
};
use crate::util::heading_level_to_num;

/// Result of rendering markdown.
#[derive(Clone, Debug)]
pub struct RenderResult {
    /// Rendered HTML fragment.
    pub html: String,
    /// Text of the first H1 heading, if any.
    pub title: Option<String>,
    /// Table of contents entries (every heading except the title).
    pub toc: Vec<TocEntry>,
    /// Non-fatal problems hit while rendering (e.g. highlighter failures).
    pub warnings: Vec<String>,
}

/// Single-use renderer for one document.
///
/// Borrows the engine configuration and highlighter; all per-document state
/// lives here so an [`Engine`](crate::Engine) can be shared across threads.
pub struct MarkdownRenderer<'e> {
    config: &'e EngineConfig,
    highlighter: &'e dyn Highlighter,
    output: String,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    prefix: PrefixStrip,
    footnotes: FootnoteState,
    pending_image: Option<(String, String)>,
    warnings: Vec<String>,
}

impl<'e> MarkdownRenderer<'e> {
    #[must_use]
    pub fn new(config: &'e EngineConfig, highlighter: &'e dyn Highlighter) -> Self {
        Self {
            config,
            highlighter,
            output: String::with_capacity(4096),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::default(),
            prefix: PrefixStrip::default(),
            footnotes: FootnoteState::default(),
            pending_image: None,
            warnings: Vec::new(),
        }
    }

    /// Render a markdown document.
    pub fn render(mut self, markdown: &str) -> RenderResult {
        let parser = Parser::new_ext(markdown, self.config.parser.to_pulldown());
        for (event, range) in parser.into_offset_iter() {
            self.process_event(event, markdown, range.start);
        }

        RenderResult {
            html: self.output,
            title: self.heading.take_title(),
            toc: self.heading.take_toc(),
            warnings: self.warnings,
        }
    }

    /// Push content to output or heading buffer based on context.
    fn push_inline(&mut self, content: &str) {
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn process_event(&mut self, event: Event<'_>, source: &str, offset: usize) {
        // Prefix stripping only spans the leading text of a callout.
        if self.prefix.is_active()
            && !matches!(event, Event::Text(_) | Event::SoftBreak | Event::HardBreak)
        {
            self.prefix.finish();
        }

        match event {
            Event::Start(Tag::Paragraph) => self.paragraph_start(source, offset),
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.raw_html(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.hard_break(),
            Event::Rule => self.output.push_str("<hr>"),
            Event::TaskListMarker(checked) => html::task_list_marker(checked, &mut self.output),
            Event::FootnoteReference(label) => self.footnote_reference(&label),
            Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not enabled
            }
        }
    }

    fn paragraph_start(&mut self, source: &str, offset: usize) {
        let callout = self.config.callouts.recognize(source, offset);
        html::paragraph_start(callout.map(|c| c.css_class()), &mut self.output);
        if let Some(callout) = callout {
            self.prefix.start(callout.prefix().len());
        }
    }

    #[allow(clippy::too_many_lines)]
    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => html::paragraph_start(None, &mut self.output),
            Tag::Heading {
                level,
                id,
                classes,
                attrs,
            } => {
                // Opening tag is written in end_tag once the ID is known.
                self.heading
                    .start_heading(heading_level_to_num(level), heading_attributes(id, classes, attrs));
            }
            Tag::BlockQuote(_) => self.output.push_str("<blockquote>"),
            Tag::CodeBlock(kind) => {
                let kind = match kind {
                    md::CodeBlockKind::Fenced(info) => CodeBlockKind::Fenced(FenceInfo::parse(&info)),
                    md::CodeBlockKind::Indented => CodeBlockKind::Indented,
                };
                self.code.start(kind);
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(label) => {
                let number = self.footnotes.number(&label);
                html::footnote_definition_start(&label, number, &mut self.output);
            }
            Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_style();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                write!(self.output, "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<del>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut link = String::new();
                html::link_start(&dest_url, &title, &mut link);
                self.push_inline(&link);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // Alt text is collected until the end tag
                self.image.start();
                self.pending_image = Some((dest_url.into_string(), title.into_string()));
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.prefix.finish();
                self.output.push_str("</p>");
            }
            TagEnd::Heading(_) => {
                if let Some(heading) = self.heading.complete_heading() {
                    html::heading(&heading, &mut self.output);
                }
            }
            TagEnd::BlockQuote(_) => self.output.push_str("</blockquote>"),
            TagEnd::CodeBlock => self.code_block_end(),
            TagEnd::List(ordered) => {
                self.output
                    .push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition => self.output.push_str("</div>"),
            TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</del>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
            TagEnd::Image => {
                let alt = self.image.end();
                if let Some((src, title)) = self.pending_image.take() {
                    let mut img = String::new();
                    html::image(&src, &alt, &title, &mut img);
                    self.push_inline(&img);
                }
            }
        }
    }

    fn code_block_end(&mut self) {
        let Some((kind, content)) = self.code.end() else {
            return;
        };
        match kind {
            CodeBlockKind::Indented => html::indented_code(&content, &mut self.output),
            CodeBlockKind::Fenced(info) => {
                let highlighted = self.highlight(info.language_or_default(), &content);
                html::code_fence(&info, &highlighted, &mut self.output);
            }
        }
    }

    /// Highlight a fence body, falling back to escaped text on failure.
    fn highlight(&mut self, language: &str, source: &str) -> String {
        match self.highlighter.highlight(language, source) {
            Ok(highlighted) => highlighted,
            Err(e) => {
                tracing::warn!(language, error = %e, "Highlighting failed, using plain text");
                self.warnings
                    .push(format!("code block ({language}) rendered without highlighting: {e}"));
                escape_html(source)
            }
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&escape_html(text));
        } else {
            let text = self.prefix.apply(text);
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        let html = format!("<code>{}</code>", escape_html(code));
        self.push_inline(&html);
    }

    fn raw_html(&mut self, raw: &str) {
        if self.config.renderer.raw_html {
            self.push_inline(raw);
        } else {
            self.push_inline(&escape_html(raw));
        }
    }

    fn hard_break(&mut self) {
        if self.prefix.is_active() {
            return;
        }
        self.push_inline("<br>");
    }

    fn soft_break(&mut self) {
        if self.code.is_active() {
            self.code.push_newline();
            return;
        }
        if self.prefix.is_active() {
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(" ");
        }
        match self.config.renderer.soft_break {
            SoftBreak::Space => self.push_inline(" "),
            SoftBreak::Newline => self.push_inline("\n"),
        }
    }

    fn footnote_reference(&mut self, label: &str) {
        let number = self.footnotes.number(label);
        let mut reference = String::new();
        html::footnote_reference(label, number, &mut reference);
        self.push_inline(&reference);
    }
}

/// Collect explicit heading attributes, keeping only allowed keys.
fn heading_attributes(
    id: Option<CowStr<'_>>,
    classes: Vec<CowStr<'_>>,
    attrs: Vec<(CowStr<'_>, Option<CowStr<'_>>)>,
) -> HeadingAttributes {
    HeadingAttributes {
        id: id.map(CowStr::into_string),
        classes: classes.into_iter().map(CowStr::into_string).collect(),
        attributes: attrs
            .into_iter()
            .filter(|(key, _)| {
                let key: &str = key;
                key != "id" && key != "class" && is_allowed_attribute(key)
            })
            .map(|(key, value)| {
                (
                    key.into_string(),
                    value.map(CowStr::into_string).unwrap_or_default(),
                )
            })
            .collect(),
    }
}
