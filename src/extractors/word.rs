//! WordprocessingML (`.docx`) reader.

use tracing::{debug, warn};

use super::archive::{self, OoxmlArchive};
use super::salvage::salvage_xml_text;
use super::{ExtractedContent, PartExtractor, TextAssembler};

/// Single parts read after the body, with their headings.
const NOTE_PARTS: &[(&str, &str)] = &[
    ("word/footnotes.xml", "Footnotes"),
    ("word/endnotes.xml", "Endnotes"),
    ("word/comments.xml", "Comments"),
];

/// Reads a Word document. Never fails: an unopenable archive falls back to a
/// plain paragraph dump, then to salvaging text between tags.
pub fn read(bytes: &[u8]) -> ExtractedContent {
    read_nested(bytes, 0)
}

pub(crate) fn read_nested(bytes: &[u8], depth: usize) -> ExtractedContent {
    match OoxmlArchive::open(bytes) {
        Ok(mut archive) => read_parts(&mut archive, depth),
        Err(e) => {
            warn!(error = %e, "cannot open Word archive, using fallback extraction");
            fallback(bytes)
        }
    }
}

fn read_parts(archive: &mut OoxmlArchive<'_>, depth: usize) -> ExtractedContent {
    let mut assembler = TextAssembler::default();
    let paragraph = PartExtractor::OoxmlParagraph;

    assembler.push_part(archive, "word/document.xml", "Main Document Content", paragraph);

    for (kind, label) in [("header", "Header"), ("footer", "Footer")] {
        let parts: Vec<String> = archive
            .members("word/", ".xml")
            .into_iter()
            .filter(|m| archive::file_name(m).starts_with(kind))
            .collect();
        for part in parts {
            let heading = format!("{}: {}", label, archive::file_name(&part));
            assembler.push_part(archive, &part, &heading, paragraph);
        }
    }

    for (part, heading) in NOTE_PARTS {
        if archive.contains(part) {
            assembler.push_part(archive, part, heading, paragraph);
        }
    }

    for part in archive.members("word/diagrams/", ".xml") {
        if archive::file_name(&part).starts_with("data") {
            let heading = format!("Diagram: {}", archive::file_name(&part));
            assembler.push_part(archive, &part, &heading, PartExtractor::OoxmlSlide);
        }
    }

    assembler.push_embedded(archive, "word/embeddings/", depth);
    assembler.finish()
}

fn fallback(bytes: &[u8]) -> ExtractedContent {
    match docx_rs::read_docx(bytes) {
        Ok(docx) => {
            let text = paragraph_dump(&docx);
            if !text.trim().is_empty() {
                return ExtractedContent::from_fallback(text, "docx paragraph dump");
            }
        }
        Err(e) => debug!(error = %e, "docx-rs could not read document"),
    }
    ExtractedContent::from_fallback(salvage_xml_text(bytes), "salvaged XML text")
}

/// Plain text of every body paragraph, one per line.
fn paragraph_dump(docx: &docx_rs::Docx) -> String {
    let mut text = String::new();
    for child in &docx.document.children {
        if let docx_rs::DocumentChild::Paragraph(para) = child {
            for run in &para.children {
                if let docx_rs::ParagraphChild::Run(run_content) = run {
                    for run_child in &run_content.children {
                        if let docx_rs::RunChild::Text(text_content) = run_child {
                            text.push_str(&text_content.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::archive::test_support::{build_zip, build_zip_bytes};

    fn document(paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
            .collect();
        format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        )
    }

    #[test]
    fn reads_body_headers_and_footers_in_order() {
        let bytes = build_zip(&[
            ("word/footer1.xml", document(&["Confidential footer text here"]).as_str()),
            ("word/document.xml", document(&["The system must validate the order total."]).as_str()),
            ("word/header2.xml", document(&["Second header text is here"]).as_str()),
            ("word/header1.xml", document(&["First header text is here"]).as_str()),
        ]);
        let content = read(&bytes);
        assert_eq!(
            content.raw_text,
            [
                "## Main Document Content",
                "The system must validate the order total.",
                "",
                "## Header: header1.xml",
                "First header text is here",
                "",
                "## Header: header2.xml",
                "Second header text is here",
                "",
                "## Footer: footer1.xml",
                "Confidential footer text here",
            ]
            .join("\n")
        );
        assert!(content.failures.is_empty());
        assert!(content.fallback.is_none());
    }

    #[test]
    fn broken_part_is_skipped() {
        let bytes = build_zip(&[
            ("word/document.xml", document(&["Orders must be confirmed by email."]).as_str()),
            ("word/comments.xml", "<w:comments><w:comment><w:p></w:comments>"),
        ]);
        let content = read(&bytes);
        assert!(content.raw_text.contains("Orders must be confirmed by email."));
        assert_eq!(content.failures.len(), 1);
        assert_eq!(content.failures[0].part, "word/comments.xml");
    }

    #[test]
    fn truncated_archive_falls_back_without_error() {
        let bytes = build_zip(&[("word/document.xml", document(&["Some requirement text."]).as_str())]);
        let content = read(&bytes[..bytes.len() / 2]);
        assert!(content.fallback.is_some());
    }

    #[test]
    fn embedded_workbook_is_read() {
        let workbook = build_zip(&[(
            "xl/worksheets/sheet1.xml",
            r#"<worksheet><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>Embedded rule about refunds</t></is></c></row></sheetData></worksheet>"#,
        )]);
        let body = document(&["Body text that is long enough."]);
        let outer = build_zip_bytes(&[
            ("word/document.xml", body.as_bytes()),
            ("word/embeddings/Microsoft_Excel_Worksheet.xlsx", workbook.as_slice()),
            ("word/embeddings/oleObject1.bin", &[0u8, 1][..]),
        ]);
        let content = read(&outer);
        assert!(content
            .raw_text
            .contains("## Embedded Object: Microsoft_Excel_Worksheet.xlsx"));
        assert!(content.raw_text.contains("Embedded rule about refunds"));
    }
}
