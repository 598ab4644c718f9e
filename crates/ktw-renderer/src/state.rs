//! Per-render state tracked while walking parser events.

use std::collections::HashMap;

use pulldown_cmark::Alignment;

use crate::code_block::FenceInfo;

/// Kind of code block being collected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodeBlockKind {
    /// Indented block, rendered without highlighting.
    Indented,
    /// Fenced block with its parsed info string.
    Fenced(FenceInfo),
}

/// State for tracking code block rendering.
#[derive(Default)]
pub struct CodeBlockState {
    /// Current block, if inside one.
    kind: Option<CodeBlockKind>,
    /// Buffer for code block content.
    buffer: String,
}

impl CodeBlockState {
    /// Start collecting a code block.
    pub fn start(&mut self, kind: CodeBlockKind) {
        self.kind = Some(kind);
        self.buffer.clear();
    }

    /// End the current code block and return its kind and content.
    pub fn end(&mut self) -> Option<(CodeBlockKind, String)> {
        let kind = self.kind.take()?;
        Some((kind, std::mem::take(&mut self.buffer)))
    }

    /// Check if we're inside a code block.
    pub fn is_active(&self) -> bool {
        self.kind.is_some()
    }

    /// Append text to the code block buffer.
    pub fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Append a newline to the code block buffer.
    pub fn push_newline(&mut self) {
        self.buffer.push('\n');
    }
}

/// State for tracking table rendering.
#[derive(Default)]
pub struct TableState {
    /// Whether we're inside the table header row.
    in_head: bool,
    /// Column alignments for current table.
    alignments: Vec<Alignment>,
    /// Current column index in table row.
    cell_index: usize,
}

impl TableState {
    /// Start a new table with column alignments.
    pub fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell_index = 0;
    }

    pub fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub fn end_head(&mut self) {
        self.in_head = false;
    }

    pub fn start_row(&mut self) {
        self.cell_index = 0;
    }

    pub fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    pub fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// Get the alignment style for the current cell.
    pub fn current_alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// State for tracking image alt text capture.
#[derive(Default)]
pub struct ImageState {
    active: bool,
    alt_text: String,
}

impl ImageState {
    pub fn start(&mut self) {
        self.active = true;
        self.alt_text.clear();
    }

    /// End image capture and return the alt text.
    pub fn end(&mut self) -> String {
        self.active = false;
        std::mem::take(&mut self.alt_text)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn push_str(&mut self, text: &str) {
        self.alt_text.push_str(text);
    }
}

/// Removes a callout's keyword prefix from the start of its paragraph.
///
/// The prefix may arrive split over several text events, and the whitespace
/// that follows it (including a line break) is dropped as well.
#[derive(Default)]
pub struct PrefixStrip {
    /// Prefix bytes still to drop.
    remaining: usize,
    /// Whether leading whitespace is still being dropped.
    trimming: bool,
}

impl PrefixStrip {
    /// Begin stripping a prefix of `len` bytes.
    pub fn start(&mut self, len: usize) {
        self.remaining = len;
        self.trimming = true;
    }

    /// Whether the strip is still consuming input.
    pub fn is_active(&self) -> bool {
        self.trimming
    }

    /// Stop stripping, e.g. when the paragraph ends or inline markup begins.
    pub fn finish(&mut self) {
        self.remaining = 0;
        self.trimming = false;
    }

    /// Return the part of `text` that survives the strip.
    pub fn apply<'t>(&mut self, text: &'t str) -> &'t str {
        if !self.trimming {
            return text;
        }

        let mut text = text;
        if self.remaining > 0 {
            let n = self.remaining.min(text.len());
            text = text.get(n..).unwrap_or_default();
            self.remaining -= n;
            if self.remaining > 0 {
                return "";
            }
        }

        let trimmed = text.trim_start();
        if !trimmed.is_empty() {
            self.trimming = false;
        }
        trimmed
    }
}

/// Numbering for footnotes, in order of first use.
#[derive(Default)]
pub struct FootnoteState {
    numbers: HashMap<String, usize>,
}

impl FootnoteState {
    /// Number for `label`, assigning the next one on first use.
    pub fn number(&mut self, label: &str) -> usize {
        let next = self.numbers.len() + 1;
        *self.numbers.entry(label.to_owned()).or_insert(next)
    }
}

/// Table of contents entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor ID for linking.
    pub id: String,
}

/// A heading that has been fully collected.
#[derive(Debug)]
pub struct CompletedHeading {
    pub level: u8,
    pub id: String,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub html: String,
}

/// Explicit attributes from `# Heading {#id .class key=value}`.
#[derive(Debug, Default)]
pub struct HeadingAttributes {
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<(String, String)>,
}

/// State for tracking headings, IDs and title extraction.
#[derive(Default)]
pub struct HeadingState {
    /// Extracted title from first H1.
    title: Option<String>,
    /// Current heading level being processed (None if not in a heading).
    current_level: Option<u8>,
    /// Explicit attributes of the current heading.
    current_attrs: HeadingAttributes,
    /// Buffer for heading plain text (for table of contents and slug).
    text: String,
    /// Buffer for heading HTML (with inline formatting).
    html: String,
    /// Table of contents entries.
    toc: Vec<TocEntry>,
    /// Counter for generating unique heading IDs.
    id_counts: HashMap<String, usize>,
}

impl HeadingState {
    /// Check if we're currently inside a heading.
    pub fn is_active(&self) -> bool {
        self.current_level.is_some()
    }

    /// Start tracking a heading.
    pub fn start_heading(&mut self, level: u8, attrs: HeadingAttributes) {
        self.current_level = Some(level);
        self.current_attrs = attrs;
        self.text.clear();
        self.html.clear();
    }

    /// Complete the heading and record it in the table of contents.
    ///
    /// The first H1 becomes the document title instead of a ToC entry.
    pub fn complete_heading(&mut self) -> Option<CompletedHeading> {
        let level = self.current_level.take()?;
        let text = std::mem::take(&mut self.text);
        let html = std::mem::take(&mut self.html);
        let attrs = std::mem::take(&mut self.current_attrs);

        let id = match attrs.id {
            Some(id) => {
                *self.id_counts.entry(id.clone()).or_default() += 1;
                id
            }
            None => self.generate_id(&text),
        };

        if level == 1 && self.title.is_none() {
            self.title = Some(text.trim().to_owned());
        } else {
            self.toc.push(TocEntry {
                level,
                title: text.trim().to_owned(),
                id: id.clone(),
            });
        }

        Some(CompletedHeading {
            level,
            id,
            classes: attrs.classes,
            attributes: attrs.attributes,
            html,
        })
    }

    /// Generate a unique ID for a heading.
    fn generate_id(&mut self, text: &str) -> String {
        let base_id = slugify(text);
        let count = self.id_counts.entry(base_id.clone()).or_default();
        let id = match *count {
            0 => base_id,
            n => format!("{base_id}-{n}"),
        };
        *count += 1;
        id
    }

    pub fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }

    /// Take the extracted title.
    pub fn take_title(&mut self) -> Option<String> {
        self.title.take()
    }

    /// Take the table of contents entries.
    pub fn take_toc(&mut self) -> Vec<TocEntry> {
        std::mem::take(&mut self.toc)
    }
}

/// Convert text to URL-safe slug.
///
/// Converts to lowercase, replaces whitespace/dashes/underscores with single dashes,
/// and removes other non-alphanumeric characters.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true; // Prevents leading dash

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
