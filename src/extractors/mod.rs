//! Container readers.
//!
//! Every reader turns a document's bytes into one ordered `raw_text` string.
//! Parts are emitted under `## <heading>` lines naming their role so the
//! normalizer can track sections. Text is pulled out of individual parts by a
//! [`PartExtractor`] chosen for the kind of part being read.

pub mod archive;
pub mod excel;
pub mod pdf;
pub mod powerpoint;
pub mod salvage;
pub mod visio;
pub mod word;
pub mod xml_text;

use tracing::{debug, warn};

use crate::error::PartFailure;
use crate::flowchart::FlowchartSummary;
use archive::OoxmlArchive;
use xml_text::{DRAWING_LAYOUT, SHAPE_LAYOUT, WORD_LAYOUT};

/// Nested documents inside `*/embeddings/` are read to this depth.
const MAX_EMBEDDING_DEPTH: usize = 1;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedContent {
    pub raw_text: String,
    pub failures: Vec<PartFailure>,
    pub flowchart: Option<FlowchartSummary>,
    /// Set when the container could not be opened and a fallback produced the text.
    pub fallback: Option<String>,
}

impl ExtractedContent {
    pub fn from_fallback(raw_text: String, description: impl Into<String>) -> Self {
        Self {
            raw_text,
            fallback: Some(description.into()),
            ..Self::default()
        }
    }
}

/// Strategy for pulling text out of a single container part.
#[derive(Debug, Clone, Copy)]
pub enum PartExtractor<'a> {
    Pdf,
    OoxmlParagraph,
    OoxmlSlide,
    OoxmlSheet { shared_strings: &'a [String] },
    OoxmlShape,
}

impl PartExtractor<'_> {
    pub fn extract(&self, part: &str, data: &[u8]) -> Result<String, PartFailure> {
        let xml = || std::str::from_utf8(data).map_err(|e| PartFailure::new(part, e));
        let text = match self {
            PartExtractor::Pdf => pdf::extract_structured(data).map_err(|e| PartFailure::new(part, e))?,
            PartExtractor::OoxmlParagraph => xml_text::extract_text(xml()?, &WORD_LAYOUT)
                .map_err(|e| PartFailure::new(part, e))?,
            PartExtractor::OoxmlSlide => xml_text::extract_text(xml()?, &DRAWING_LAYOUT)
                .map_err(|e| PartFailure::new(part, e))?,
            PartExtractor::OoxmlSheet { shared_strings } => excel::sheet_rows(xml()?, shared_strings)
                .map(|rows| rows.join("\n"))
                .map_err(|e| PartFailure::new(part, e))?,
            PartExtractor::OoxmlShape => xml_text::extract_text(xml()?, &SHAPE_LAYOUT)
                .map_err(|e| PartFailure::new(part, e))?,
        };
        Ok(text)
    }
}

/// Collects part texts under their headings, in the order they are added.
#[derive(Debug, Default)]
pub struct TextAssembler {
    sections: Vec<String>,
    pub failures: Vec<PartFailure>,
}

impl TextAssembler {
    pub fn push(&mut self, heading: &str, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            debug!(heading, "part produced no text");
            return;
        }
        self.sections.push(format!("## {}\n{}", heading, text));
    }

    /// Reads `part` from `archive` with `extractor`; failures are recorded and skipped.
    pub fn push_part(
        &mut self,
        archive: &mut OoxmlArchive<'_>,
        part: &str,
        heading: &str,
        extractor: PartExtractor<'_>,
    ) {
        let result = archive
            .read_bytes(part)
            .and_then(|bytes| extractor.extract(part, &bytes));
        match result {
            Ok(text) => self.push(heading, &text),
            Err(failure) => self.fail(failure),
        }
    }

    pub fn fail(&mut self, failure: PartFailure) {
        warn!(part = %failure.part, detail = %failure.detail, "skipping unreadable part");
        self.failures.push(failure);
    }

    pub fn push_embedded(&mut self, archive: &mut OoxmlArchive<'_>, dir: &str, depth: usize) {
        if depth >= MAX_EMBEDDING_DEPTH {
            return;
        }
        for member in archive.members(dir, "") {
            let name = archive::file_name(&member).to_string();
            let lower = name.to_lowercase();
            let reader: fn(&[u8], usize) -> ExtractedContent = if lower.ends_with(".docx") {
                word::read_nested
            } else if lower.ends_with(".xlsx") {
                excel::read_nested
            } else if lower.ends_with(".pptx") {
                powerpoint::read_nested
            } else if lower.ends_with(".vsdx") {
                visio::read_nested
            } else {
                continue;
            };
            match archive.read_bytes(&member) {
                Ok(bytes) => {
                    let nested = reader(&bytes, depth + 1);
                    self.push(&format!("Embedded Object: {}", name), &nested.raw_text);
                    self.failures.extend(nested.failures);
                }
                Err(failure) => self.fail(failure),
            }
        }
    }

    pub fn finish(self) -> ExtractedContent {
        ExtractedContent {
            raw_text: self.sections.join("\n\n"),
            failures: self.failures,
            flowchart: None,
            fallback: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembler_skips_empty_parts() {
        let mut assembler = TextAssembler::default();
        assembler.push("Slide 1", "  ");
        assembler.push("Slide 2", "Customers can cancel an order before shipment.");
        let content = assembler.finish();
        assert_eq!(
            content.raw_text,
            "## Slide 2\nCustomers can cancel an order before shipment."
        );
    }

    #[test]
    fn paragraph_extractor_reports_malformed_part() {
        let failure = PartExtractor::OoxmlParagraph
            .extract("word/header1.xml", b"<w:hdr><w:p><w:t>x</w:hdr>")
            .unwrap_err();
        assert_eq!(failure.part, "word/header1.xml");
    }

    #[test]
    fn slide_extractor_reads_drawing_text() {
        let xml = br#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree><p:sp><p:txBody>
            <a:p><a:r><a:t>Managers approve refunds above 500 EUR.</a:t></a:r></a:p>
        </p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#;
        assert_eq!(
            PartExtractor::OoxmlSlide.extract("ppt/slides/slide1.xml", xml).unwrap(),
            "Managers approve refunds above 500 EUR."
        );
    }
}
