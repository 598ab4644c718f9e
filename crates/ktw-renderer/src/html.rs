//! HTML fragments written by the renderer.
//!
//! Each helper appends one element (or an opening tag) to an output buffer.
//! Attribute values are always escaped here, never by the caller.

use std::fmt::Write;

use crate::code_block::FenceInfo;
use crate::state::{CompletedHeading, escape_html};

/// Write a highlighted fenced code block.
///
/// The element shape is fixed:
/// `<pre class="chroma"><code class="language-LANG[ classes]"[ id][ attrs]>`
/// followed by `highlighted` and the closing tags. The highlighter output is
/// inserted as-is and must already be escaped.
pub fn code_fence(info: &FenceInfo, highlighted: &str, out: &mut String) {
    write!(
        out,
        r#"<pre class="chroma"><code class="language-{}"#,
        escape_html(info.language_or_default())
    )
    .unwrap();

    if let Some(attrs) = &info.attributes {
        for class in &attrs.classes {
            out.push(' ');
            out.push_str(&escape_html(class));
        }
        out.push('"');
        if let Some(id) = &attrs.id {
            write!(out, r#" id="{}""#, escape_html(id)).unwrap();
        }
        for (key, value) in &attrs.attributes {
            write!(out, r#" {key}="{}""#, escape_html(value)).unwrap();
        }
    } else {
        out.push('"');
    }

    out.push('>');
    out.push_str(highlighted);
    out.push_str("</code></pre>");
}

/// Write an indented code block. No highlighting, no language class.
pub fn indented_code(content: &str, out: &mut String) {
    write!(out, "<pre><code>{}</code></pre>", escape_html(content)).unwrap();
}

/// Write a paragraph opening tag, with a class for callouts.
pub fn paragraph_start(class: Option<&str>, out: &mut String) {
    match class {
        Some(class) => write!(out, r#"<p class="{}">"#, escape_html(class)).unwrap(),
        None => out.push_str("<p>"),
    }
}

/// Write a complete heading element.
pub fn heading(heading: &CompletedHeading, out: &mut String) {
    let level = heading.level;
    write!(out, r#"<h{level} id="{}""#, escape_html(&heading.id)).unwrap();
    if !heading.classes.is_empty() {
        write!(out, r#" class="{}""#, escape_html(&heading.classes.join(" "))).unwrap();
    }
    for (key, value) in &heading.attributes {
        write!(out, r#" {key}="{}""#, escape_html(value)).unwrap();
    }
    write!(out, ">{}</h{level}>", heading.html.trim()).unwrap();
}

/// Write a link opening tag.
pub fn link_start(href: &str, title: &str, out: &mut String) {
    write!(out, r#"<a href="{}""#, escape_html(href)).unwrap();
    if !title.is_empty() {
        write!(out, r#" title="{}""#, escape_html(title)).unwrap();
    }
    out.push('>');
}

pub fn image(src: &str, alt: &str, title: &str, out: &mut String) {
    let title_attr = if title.is_empty() {
        String::new()
    } else {
        format!(r#" title="{}""#, escape_html(title))
    };
    write!(
        out,
        r#"<img src="{}"{title_attr} alt="{}">"#,
        escape_html(src),
        escape_html(alt)
    )
    .unwrap();
}

pub fn task_list_marker(checked: bool, out: &mut String) {
    if checked {
        out.push_str(r#"<input type="checkbox" checked disabled>"#);
    } else {
        out.push_str(r#"<input type="checkbox" disabled>"#);
    }
}

/// Write a footnote reference as a numbered superscript link.
pub fn footnote_reference(label: &str, number: usize, out: &mut String) {
    let label = escape_html(label);
    write!(
        out,
        r##"<sup class="footnote-reference"><a href="#fn-{label}" id="fnref-{label}">{number}</a></sup>"##
    )
    .unwrap();
}

/// Open a footnote definition block.
pub fn footnote_definition_start(label: &str, number: usize, out: &mut String) {
    write!(
        out,
        r#"<div class="footnote-definition" id="fn-{}"><sup class="footnote-definition-label">{number}</sup>"#,
        escape_html(label)
    )
    .unwrap();
}
