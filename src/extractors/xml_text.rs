//! Paragraph/run-aware text extraction from OOXML parts.
//!
//! Each OOXML family stores text in differently named elements, so the walker
//! is driven by an [`XmlTextLayout`] naming the elements that carry text, end
//! a paragraph, separate cells, or stand for a break.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static RE_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());

/// Local element names (namespace prefix stripped) that drive extraction.
#[derive(Debug, Clone, Copy)]
pub struct XmlTextLayout {
    pub text: &'static [&'static str],
    pub paragraph: &'static [&'static str],
    pub cell: &'static [&'static str],
    pub line_break: &'static [&'static str],
    pub tab: &'static [&'static str],
}

/// `w:p` / `w:t` in WordprocessingML.
pub const WORD_LAYOUT: XmlTextLayout = XmlTextLayout {
    text: &["t"],
    paragraph: &["p"],
    cell: &[],
    line_break: &["br", "cr"],
    tab: &["tab"],
};

/// `a:p` / `a:t` in DrawingML (slides, notes, SmartArt, drawings).
pub const DRAWING_LAYOUT: XmlTextLayout = XmlTextLayout {
    text: &["t"],
    paragraph: &["p"],
    cell: &[],
    line_break: &["br"],
    tab: &[],
};

/// Visio shape text.
pub const SHAPE_LAYOUT: XmlTextLayout = XmlTextLayout {
    text: &["Text"],
    paragraph: &["Shape"],
    cell: &[],
    line_break: &[],
    tab: &[],
};

fn contains(names: &[&str], local: &[u8]) -> bool {
    names.iter().any(|n| n.as_bytes() == local)
}

/// Walks `xml` and returns one string per paragraph, skipping empty ones.
pub fn extract_paragraphs(xml: &str, layout: &XmlTextLayout) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut text_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let local = e.local_name();
                if contains(layout.text, local.as_ref()) {
                    text_depth += 1;
                }
            }
            Event::Empty(e) => {
                let local = e.local_name();
                if contains(layout.line_break, local.as_ref()) {
                    flush(&mut current, &mut paragraphs);
                } else if contains(layout.tab, local.as_ref()) {
                    current.push(' ');
                } else if contains(layout.paragraph, local.as_ref()) {
                    flush(&mut current, &mut paragraphs);
                }
            }
            Event::End(e) => {
                let local = e.local_name();
                let local = local.as_ref();
                if contains(layout.text, local) {
                    text_depth = text_depth.saturating_sub(1);
                } else if contains(layout.cell, local) {
                    if !current.trim().is_empty() && !current.trim_end().ends_with('|') {
                        current.push_str(" | ");
                    }
                } else if contains(layout.paragraph, local) {
                    flush(&mut current, &mut paragraphs);
                }
            }
            Event::Text(t) if text_depth > 0 => {
                current.push_str(&t.unescape()?);
            }
            Event::CData(c) if text_depth > 0 => {
                current.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    flush(&mut current, &mut paragraphs);
    Ok(paragraphs)
}

fn flush(current: &mut String, paragraphs: &mut Vec<String>) {
    let cleaned = collapse_whitespace(current.trim_end_matches([' ', '|']));
    if !cleaned.is_empty() {
        paragraphs.push(cleaned);
    }
    current.clear();
}

pub fn collapse_whitespace(text: &str) -> String {
    RE_SPACES.replace_all(text.trim(), " ").into_owned()
}

/// Tag-stripping fallback used when structure-aware extraction finds nothing.
pub fn strip_tags(xml: &str) -> String {
    let without_tags = RE_TAG.replace_all(xml, "\n");
    without_tags
        .lines()
        .map(|line| collapse_whitespace(&decode_entities(line)))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&#10;", " ")
            .replace("&amp;", "&"),
    )
}

/// Structured extraction with tag-stripping fallback. Returns joined lines.
pub fn extract_text(xml: &str, layout: &XmlTextLayout) -> Result<String, quick_xml::Error> {
    let paragraphs = extract_paragraphs(xml, layout)?;
    if paragraphs.is_empty() {
        return Ok(strip_tags(xml));
    }
    Ok(paragraphs.join("\n"))
}

/// Reads an attribute by local name.
pub fn attribute(element: &BytesStart<'_>, name: &str) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name.as_bytes())
        .map(|a| decode_entities(&String::from_utf8_lossy(&a.value)).into_owned())
}
