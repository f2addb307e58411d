//! Last-resort text recovery for containers that cannot be opened.
//!
//! These scans work on raw bytes and never fail; they return whatever
//! plausible text they find, possibly nothing.

use once_cell::sync::Lazy;
use regex::bytes::Regex as BytesRegex;
use regex::Regex;

use super::xml_text::{collapse_whitespace, decode_entities};

static RE_BETWEEN_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r">([^<>]+)<").unwrap());
static RE_PDF_SHOW_TEXT: Lazy<BytesRegex> =
    Lazy::new(|| BytesRegex::new(r"(?s-u)\[((?:[^\]\\]|\\.)*)\]\s*TJ|\(((?:[^()\\]|\\.)*)\)\s*Tj").unwrap());
static RE_ASCII_RUN: Lazy<BytesRegex> = Lazy::new(|| BytesRegex::new(r"(?-u)[\x20-\x7e\t]{8,}").unwrap());
static RE_UTF16LE_RUN: Lazy<BytesRegex> =
    Lazy::new(|| BytesRegex::new(r"(?s-u)(?:[\x20-\x7e\t]\x00){8,}").unwrap());
static RE_PDF_LITERAL: Lazy<BytesRegex> =
    Lazy::new(|| BytesRegex::new(r"(?-u)\(((?:[^()\\]|\\.)*)\)").unwrap());

/// Text found between XML tags of a (possibly truncated) OOXML buffer.
///
/// Stored (uncompressed) members of a damaged archive still expose their XML
/// directly; deflated members yield nothing plausible and are dropped.
pub fn salvage_xml_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    RE_BETWEEN_TAGS
        .captures_iter(&text)
        .map(|caps| collapse_whitespace(&decode_entities(&caps[1])))
        .filter(|fragment| is_plausible_text(fragment))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strings shown by `Tj`/`TJ` operators in uncompressed PDF content streams.
pub fn salvage_pdf_strings(bytes: &[u8]) -> String {
    let mut lines = Vec::new();
    for caps in RE_PDF_SHOW_TEXT.captures_iter(bytes) {
        let line = if let Some(array) = caps.get(1) {
            RE_PDF_LITERAL
                .captures_iter(array.as_bytes())
                .map(|literal| unescape_pdf_literal(&literal[1]))
                .collect::<String>()
        } else if let Some(literal) = caps.get(2) {
            unescape_pdf_literal(literal.as_bytes())
        } else {
            continue;
        };
        let line = collapse_whitespace(&line);
        if is_plausible_text(&line) {
            lines.push(line);
        }
    }
    lines.join("\n")
}

/// Printable runs from a legacy binary Office file, in file order. Text is
/// looked for both as single-byte runs and as UTF-16LE runs.
pub fn salvage_binary_text(bytes: &[u8]) -> String {
    let ascii = RE_ASCII_RUN
        .find_iter(bytes)
        .map(|m| (m.start(), String::from_utf8_lossy(m.as_bytes()).into_owned()));
    let wide = RE_UTF16LE_RUN.find_iter(bytes).map(|m| {
        let text: String = m.as_bytes().iter().step_by(2).map(|b| *b as char).collect();
        (m.start(), text)
    });
    let mut runs: Vec<(usize, String)> = ascii.chain(wide).collect();
    runs.sort_by_key(|(start, _)| *start);
    runs.into_iter()
        .map(|(_, run)| collapse_whitespace(&run))
        .filter(|run| is_plausible_text(run))
        .collect::<Vec<_>>()
        .join("\n")
}

fn unescape_pdf_literal(raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut iter = raw.iter().copied().peekable();
    while let Some(byte) = iter.next() {
        if byte != b'\\' {
            out.push(byte as char);
            continue;
        }
        match iter.next() {
            Some(b'n' | b'r' | b't') => out.push(' '),
            Some(b'(') => out.push('('),
            Some(b')') => out.push(')'),
            Some(b'\\') => out.push('\\'),
            Some(d @ b'0'..=b'7') => {
                let mut value = u32::from(d - b'0');
                for _ in 0..2 {
                    match iter.peek() {
                        Some(&next @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(next - b'0');
                            iter.next();
                        }
                        _ => break,
                    }
                }
                if let Some(c) = char::from_u32(value) {
                    out.push(c);
                }
            }
            Some(other) => out.push(other as char),
            None => {}
        }
    }
    out
}

/// At least two alphabetic words and almost nothing but printable text.
fn is_plausible_text(fragment: &str) -> bool {
    let total = fragment.chars().count();
    if total == 0 {
        return false;
    }
    let words = fragment
        .split_whitespace()
        .filter(|w| w.chars().filter(|c| c.is_alphabetic()).count() >= 2)
        .count();
    let printable = fragment
        .chars()
        .filter(|c| (c.is_alphanumeric() || c.is_whitespace() || c.is_ascii_punctuation()) && *c != '\u{fffd}')
        .count();
    words >= 2 && printable * 100 >= total * 85
}
