//! PresentationML (`.pptx`) reader.
//!
//! Slide layouts and masters only hold placeholder prompts, so they are not
//! read.

use tracing::warn;

use super::archive::{self, OoxmlArchive};
use super::salvage::salvage_xml_text;
use super::{ExtractedContent, PartExtractor, TextAssembler};

pub fn read(bytes: &[u8]) -> ExtractedContent {
    read_nested(bytes, 0)
}

pub(crate) fn read_nested(bytes: &[u8], depth: usize) -> ExtractedContent {
    let mut archive = match OoxmlArchive::open(bytes) {
        Ok(archive) => archive,
        Err(e) => {
            warn!(error = %e, "cannot open PowerPoint archive, salvaging text");
            return ExtractedContent::from_fallback(salvage_xml_text(bytes), "salvaged XML text");
        }
    };

    let mut assembler = TextAssembler::default();
    let slide = PartExtractor::OoxmlSlide;

    for part in archive.members("ppt/slides/", ".xml") {
        let heading = numbered_heading("Slide", &part);
        assembler.push_part(&mut archive, &part, &heading, slide);
    }
    for part in archive.members("ppt/notesSlides/", ".xml") {
        let heading = numbered_heading("Speaker Notes", &part);
        assembler.push_part(&mut archive, &part, &heading, slide);
    }
    for (dir, stem, label) in [
        ("ppt/diagrams/", "data", "Diagram"),
        ("ppt/charts/", "chart", "Chart"),
    ] {
        for part in archive.members(dir, ".xml") {
            if archive::file_name(&part).starts_with(stem) {
                let heading = format!("{}: {}", label, archive::file_name(&part));
                assembler.push_part(&mut archive, &part, &heading, slide);
            }
        }
    }

    assembler.push_embedded(&mut archive, "ppt/embeddings/", depth);
    assembler.finish()
}

fn numbered_heading(label: &str, part: &str) -> String {
    match archive::part_number(part) {
        Some(n) => format!("{} {}", label, n),
        None => format!("{}: {}", label, archive::file_name(part)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::archive::test_support::build_zip;

    fn slide(text: &str) -> String {
        format!(
            r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
            text
        )
    }

    #[test]
    fn slides_and_notes_in_natural_order() {
        let bytes = build_zip(&[
            ("ppt/slides/slide10.xml", slide("Tenth slide text goes here").as_str()),
            ("ppt/slides/slide2.xml", slide("Second slide text goes here").as_str()),
            ("ppt/notesSlides/notesSlide2.xml", slide("Presenter remarks for slide two").as_str()),
            ("ppt/slideLayouts/slideLayout1.xml", slide("Click to edit Master title style").as_str()),
        ]);
        let content = read(&bytes);
        assert_eq!(
            content.raw_text,
            [
                "## Slide 2",
                "Second slide text goes here",
                "",
                "## Slide 10",
                "Tenth slide text goes here",
                "",
                "## Speaker Notes 2",
                "Presenter remarks for slide two",
            ]
            .join("\n")
        );
    }

    #[test]
    fn unreadable_slide_is_skipped() {
        let bytes = build_zip(&[
            ("ppt/slides/slide1.xml", "<p:sld><a:p></p:sld>"),
            ("ppt/slides/slide2.xml", slide("Remaining slide still counts").as_str()),
        ]);
        let content = read(&bytes);
        assert_eq!(content.failures.len(), 1);
        assert!(content.raw_text.contains("Remaining slide still counts"));
    }
}
