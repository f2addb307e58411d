//! PDF reader: `pdf-extract` for the text layer, then a structuring pass that
//! labels headers, tables, diagram fragments and flow arrows.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::salvage::salvage_pdf_strings;
use super::xml_text::collapse_whitespace;
use super::{ExtractedContent, PartExtractor};
use crate::error::{ExtractionError, Result};

static RE_NUMBERED_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)*\.?\s+[A-Z][A-Za-z&/-]*(\s+[A-Za-z&/-]+){0,5}$").unwrap());
static RE_MODAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(must|should|shall|will|can|may)\b").unwrap());
static RE_BOX_DRAWING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{2500}-\u{259F}]|\+[-=]{3,}").unwrap());
static RE_BOX_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\u{2500}-\u{259F}|+=]+|-{2,}").unwrap());
static RE_ARROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[→←↔⇒⇐⇔➔➜➝➞►▶]|-{1,2}>|=>").unwrap());
static RE_CELL_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}|\t").unwrap());

const PDF_MAGIC: &[u8] = b"%PDF";

/// Reads a PDF, falling back to literal-string salvage when the text layer
/// cannot be parsed.
pub fn read(bytes: &[u8], file_name: &str) -> Result<ExtractedContent> {
    let detail = match PartExtractor::Pdf.extract(file_name, bytes) {
        Ok(text) if !text.trim().is_empty() => {
            return Ok(ExtractedContent {
                raw_text: text,
                ..ExtractedContent::default()
            })
        }
        Ok(_) => "no text layer".to_string(),
        Err(failure) => failure.detail,
    };

    warn!(file = file_name, %detail, "PDF text extraction failed, salvaging literal strings");
    let salvaged = salvage_pdf_strings(bytes);
    if salvaged.is_empty() && !bytes.starts_with(PDF_MAGIC) {
        return Err(ExtractionError::CorruptContainer {
            file_name: file_name.to_string(),
            detail,
        });
    }
    Ok(ExtractedContent::from_fallback(salvaged, "PDF literal strings"))
}

/// Text layer of `bytes`, restructured by [`structure_text`].
pub fn extract_structured(bytes: &[u8]) -> std::result::Result<String, String> {
    // pdf-extract panics on some malformed streams
    let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| "PDF parser panicked".to_string())?
        .map_err(|e| e.to_string())?;
    Ok(structure_text(&extracted))
}

#[derive(Debug, PartialEq, Eq)]
enum PdfLine {
    Header(String),
    Diagram(String),
    Flow(String),
    Table(Vec<String>),
    Body(String),
}

fn categorize(line: &str) -> PdfLine {
    if RE_BOX_DRAWING.is_match(line) {
        return PdfLine::Diagram(collapse_whitespace(&RE_BOX_CHARS.replace_all(line, " ")));
    }
    if RE_ARROW.is_match(line) {
        return PdfLine::Flow(collapse_whitespace(&RE_ARROW.replace_all(line, " -> ")));
    }
    let cells: Vec<String> = RE_CELL_GAP
        .split(line)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    let sentence_end = line.ends_with(['.', '!', '?']);
    if cells.len() >= 3 || (cells.len() == 2 && !sentence_end) {
        return PdfLine::Table(cells);
    }
    if is_header(line) {
        return PdfLine::Header(collapse_whitespace(line));
    }
    PdfLine::Body(collapse_whitespace(line))
}

fn is_header(line: &str) -> bool {
    let letters = line.chars().filter(|c| c.is_alphabetic()).count();
    let all_caps = letters >= 3 && line.chars().count() <= 80 && !line.chars().any(char::is_lowercase);
    let numbered = RE_NUMBERED_HEADER.is_match(line) && !RE_MODAL.is_match(line);
    all_caps || numbered
}

/// Re-emits headers as `###` headings in place and gathers tables, diagram
/// fragments and flow arrows under their own labelled subsections.
pub fn structure_text(text: &str) -> String {
    let mut body = Vec::new();
    let mut tables = Vec::new();
    let mut diagrams = Vec::new();
    let mut flows = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match categorize(line) {
            PdfLine::Header(h) => body.push(format!("### {}", h)),
            PdfLine::Body(b) => body.push(b),
            PdfLine::Table(cells) => tables.push(cells.join(" | ")),
            PdfLine::Diagram(d) if !d.is_empty() => diagrams.push(d),
            PdfLine::Diagram(_) => {}
            PdfLine::Flow(f) => flows.push(f),
        }
    }
    debug!(
        body = body.len(),
        tables = tables.len(),
        diagrams = diagrams.len(),
        flows = flows.len(),
        "structured PDF text"
    );

    let mut out = body;
    for (label, lines) in [
        ("Table Data", tables),
        ("Diagram Elements", diagrams),
        ("Flow Indicators", flows),
    ] {
        if !lines.is_empty() {
            out.push(format!("#### {}", label));
            out.extend(lines);
        }
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_become_sections() {
        let text = "ORDER MANAGEMENT\n2.1 Payment Handling\nThe system must capture the card before shipping.";
        assert_eq!(
            structure_text(text),
            "### ORDER MANAGEMENT\n### 2.1 Payment Handling\nThe system must capture the card before shipping."
        );
    }

    #[test]
    fn numbered_requirement_is_not_a_header() {
        assert!(!is_header("1. The system must validate the order total"));
        assert!(is_header("3 Scope"));
    }

    #[test]
    fn tables_diagrams_and_arrows_are_grouped() {
        let text = [
            "Requirement    Owner    Priority",
            "┌──────────────┐",
            "│ Review order │",
            "Submit → Review → Approve",
            "Refunds must be approved by a manager.",
        ]
        .join("\n");
        assert_eq!(
            structure_text(&text),
            [
                "Refunds must be approved by a manager.",
                "#### Table Data",
                "Requirement | Owner | Priority",
                "#### Diagram Elements",
                "Review order",
                "#### Flow Indicators",
                "Submit -> Review -> Approve",
            ]
            .join("\n")
        );
    }

    #[test]
    fn non_pdf_garbage_is_corrupt() {
        let err = read(b"definitely not a document", "notes.pdf").unwrap_err();
        assert!(err.to_string().contains("notes.pdf"));
    }

    #[test]
    fn damaged_pdf_falls_back_to_literal_strings() {
        let bytes = b"%PDF-1.4\n1 0 obj\n<< /Length 60 >>\nstream\nBT (The invoice must show the tax rate.) Tj ET\nendstream";
        let content = read(bytes, "invoice.pdf").unwrap();
        assert!(content.raw_text.contains("The invoice must show the tax rate."));
    }
}
