//! Format detection and dispatch to the container readers.
//!
//! Detection is a pure function of the MIME type and the file extension.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ExtractionError, Result};
use crate::extractors::salvage::salvage_binary_text;
use crate::extractors::{excel, pdf, powerpoint, visio, word, ExtractedContent};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp", "svg", "heic"];
const WORD_EXTENSIONS: &[&str] = &["docx", "docm", "dotx", "doc"];
const EXCEL_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xltx", "xls"];
const POWERPOINT_EXTENSIONS: &[&str] = &["pptx", "pptm", "potx", "ppt"];
const VISIO_EXTENSIONS: &[&str] = &["vsdx", "vsdm", "vstx", "vsd"];
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "rst", "text"];

/// Pre-OOXML binary formats: container kind, extension and MIME type.
const LEGACY_FORMATS: &[(ContainerKind, &str, &str)] = &[
    (ContainerKind::Word, "doc", "application/msword"),
    (ContainerKind::Excel, "xls", "application/vnd.ms-excel"),
    (ContainerKind::PowerPoint, "ppt", "application/vnd.ms-powerpoint"),
    (ContainerKind::Visio, "vsd", "application/vnd.visio"),
];
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Input to the pipeline: the uploaded bytes and what the caller knows about them.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl RawDocument {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    pub fn extension(&self) -> String {
        extension_of(&self.file_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContainerKind {
    Pdf,
    Word,
    Excel,
    PowerPoint,
    Visio,
    PlainText,
    Image,
}

impl ContainerKind {
    /// Images are checked first so a mislabelled upload is never parsed as a container.
    pub fn detect(mime_type: &str, extension: &str) -> Option<Self> {
        let checks: [(fn(&str, &str) -> bool, ContainerKind); 7] = [
            (is_image_file, ContainerKind::Image),
            (is_pdf_file, ContainerKind::Pdf),
            (is_excel_file, ContainerKind::Excel),
            (is_powerpoint_file, ContainerKind::PowerPoint),
            (is_visio_file, ContainerKind::Visio),
            (is_word_file, ContainerKind::Word),
            (is_text_file, ContainerKind::PlainText),
        ];
        checks
            .iter()
            .find(|(check, _)| check(mime_type, extension))
            .map(|(_, kind)| *kind)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContainerKind::Pdf => "PDF",
            ContainerKind::Word => "Word",
            ContainerKind::Excel => "Excel",
            ContainerKind::PowerPoint => "PowerPoint",
            ContainerKind::Visio => "Visio",
            ContainerKind::PlainText => "Text",
            ContainerKind::Image => "Image",
        }
    }
}

impl std::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn has_extension(extension: &str, list: &[&str]) -> bool {
    let extension = extension.trim_start_matches('.').to_lowercase();
    list.contains(&extension.as_str())
}

pub fn is_image_file(mime_type: &str, extension: &str) -> bool {
    mime_type.to_lowercase().starts_with("image/") || has_extension(extension, IMAGE_EXTENSIONS)
}

pub fn is_pdf_file(mime_type: &str, extension: &str) -> bool {
    mime_type.eq_ignore_ascii_case("application/pdf") || has_extension(extension, &["pdf"])
}

pub fn is_word_file(mime_type: &str, extension: &str) -> bool {
    let mime = mime_type.to_lowercase();
    mime.contains("wordprocessingml") || mime == "application/msword" || has_extension(extension, WORD_EXTENSIONS)
}

pub fn is_excel_file(mime_type: &str, extension: &str) -> bool {
    let mime = mime_type.to_lowercase();
    mime.contains("spreadsheetml") || mime.contains("ms-excel") || has_extension(extension, EXCEL_EXTENSIONS)
}

pub fn is_powerpoint_file(mime_type: &str, extension: &str) -> bool {
    let mime = mime_type.to_lowercase();
    mime.contains("presentationml") || mime.contains("ms-powerpoint") || has_extension(extension, POWERPOINT_EXTENSIONS)
}

pub fn is_visio_file(mime_type: &str, extension: &str) -> bool {
    mime_type.to_lowercase().contains("visio") || has_extension(extension, VISIO_EXTENSIONS)
}

pub fn is_text_file(mime_type: &str, extension: &str) -> bool {
    let mime = mime_type.to_lowercase();
    mime.starts_with("text/") || has_extension(extension, TEXT_EXTENSIONS)
}

/// MIME type for a file extension, `application/octet-stream` when unknown.
pub fn mime_from_extension(extension: &str) -> &'static str {
    match extension.trim_start_matches('.').to_lowercase().as_str() {
        "pdf" => "application/pdf",
        "docx" | "docm" | "dotx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "doc" => "application/msword",
        "xlsx" | "xlsm" | "xltx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        "pptx" | "pptm" | "potx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "ppt" => "application/vnd.ms-powerpoint",
        "vsdx" | "vsdm" | "vstx" => "application/vnd.ms-visio.drawing",
        "vsd" => "application/vnd.visio",
        "md" | "markdown" => "text/markdown",
        "txt" | "text" | "rst" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

fn legacy_binary_format(kind: ContainerKind, document: &RawDocument) -> Option<&'static str> {
    if document.bytes.starts_with(ZIP_MAGIC) {
        return None;
    }
    let extension = document.extension();
    let mime = document.mime_type.to_lowercase();
    LEGACY_FORMATS
        .iter()
        .find(|(legacy_kind, legacy_extension, legacy_mime)| {
            *legacy_kind == kind && (extension == *legacy_extension || mime == *legacy_mime)
        })
        .map(|(_, legacy_extension, _)| *legacy_extension)
}

pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default()
}

#[derive(Debug, Default)]
pub struct DocumentProcessor;

impl DocumentProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Reads a file from disk, inferring the MIME type from the extension
    /// unless one is given.
    pub async fn read_document<P: AsRef<Path>>(&self, path: P, mime_type: Option<&str>) -> Result<RawDocument> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let mime_type = match mime_type {
            Some(mime) => mime.to_string(),
            None => mime_from_extension(&extension_of(&file_name)).to_string(),
        };
        Ok(RawDocument::new(bytes, mime_type, file_name))
    }

    /// Runs the container reader for `document`.
    ///
    /// Only an unknown format, or a PDF with nothing recoverable, is an
    /// error; broken OOXML containers fall back to weaker extraction.
    pub fn extract(&self, document: &RawDocument) -> Result<(ContainerKind, ExtractedContent)> {
        let kind = ContainerKind::detect(&document.mime_type, &document.extension()).ok_or_else(|| {
            ExtractionError::UnsupportedFormat {
                mime_type: document.mime_type.clone(),
                file_name: document.file_name.clone(),
            }
        })?;
        debug!(file = %document.file_name, %kind, bytes = document.bytes.len(), "reading container");

        if let Some(extension) = legacy_binary_format(kind, document) {
            warn!(file = %document.file_name, format = extension, "legacy binary format, OOXML readers skipped");
            let content = match kind {
                ContainerKind::Excel => excel::read_legacy(&document.bytes),
                _ => ExtractedContent::from_fallback(
                    salvage_binary_text(&document.bytes),
                    format!("strings salvaged from legacy binary {} (.{})", kind, extension),
                ),
            };
            return Ok((kind, content));
        }

        let content = match kind {
            ContainerKind::Pdf => pdf::read(&document.bytes, &document.file_name)?,
            ContainerKind::Word => word::read(&document.bytes),
            ContainerKind::Excel => excel::read(&document.bytes),
            ContainerKind::PowerPoint => powerpoint::read(&document.bytes),
            ContainerKind::Visio => visio::read(&document.bytes),
            ContainerKind::PlainText => ExtractedContent {
                raw_text: String::from_utf8_lossy(&document.bytes).into_owned(),
                ..ExtractedContent::default()
            },
            ContainerKind::Image => ExtractedContent::default(),
        };
        if let Some(fallback) = &content.fallback {
            info!(file = %document.file_name, fallback = %fallback, "container could not be opened");
        }
        Ok((kind, content))
    }

    /// Whether `document` is one of the pre-OOXML binary formats. A file that
    /// is actually a ZIP container is read as OOXML whatever its name says.
    pub fn is_legacy_binary(&self, document: &RawDocument) -> bool {
        ContainerKind::detect(&document.mime_type, &document.extension())
            .and_then(|kind| legacy_binary_format(kind, document))
            .is_some()
    }

    pub fn is_supported_format<P: AsRef<Path>>(&self, file_path: P) -> bool {
        let file_name = file_path
            .as_ref()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let extension = extension_of(file_name);
        ContainerKind::detect(mime_from_extension(&extension), &extension).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_format() {
        let processor = DocumentProcessor::new();

        assert!(processor.is_supported_format("test.pdf"));
        assert!(processor.is_supported_format("test.docx"));
        assert!(processor.is_supported_format("test.xlsx"));
        assert!(processor.is_supported_format("test.pptx"));
        assert!(processor.is_supported_format("flow.vsdx"));
        assert!(processor.is_supported_format("notes.md"));
        assert!(processor.is_supported_format("scan.PNG"));

        assert!(!processor.is_supported_format("setup.exe"));
        assert!(!processor.is_supported_format("archive.zip"));
        assert!(!processor.is_supported_format("no_extension"));
    }

    #[test]
    fn predicates_accept_mime_or_extension() {
        assert!(is_image_file("image/png", ""));
        assert!(is_image_file("application/octet-stream", "JPG"));
        assert!(is_excel_file("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", ""));
        assert!(is_powerpoint_file("", "pptx"));
        assert!(is_visio_file("application/vnd.ms-visio.drawing", ""));
        assert!(!is_visio_file("application/pdf", "pdf"));
        assert!(is_word_file("application/msword", ""));
    }

    #[test]
    fn image_wins_over_other_families() {
        assert_eq!(ContainerKind::detect("image/png", "docx"), Some(ContainerKind::Image));
        assert_eq!(ContainerKind::detect("application/octet-stream", "bin"), None);
    }

    #[test]
    fn unsupported_format_names_the_mime_type() {
        let document = RawDocument::new(vec![0, 1, 2], "application/x-msdownload", "setup.exe");
        let err = DocumentProcessor::new().extract(&document).unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat { .. }));
        assert!(err.to_string().contains("application/x-msdownload"));
    }

    fn wide(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect()
    }

    #[test]
    fn legacy_word_file_is_salvaged_with_a_warning() {
        let mut bytes = vec![0xd0, 0xcf, 0x11, 0xe0, 0xa1, 0xb1, 0x1a, 0xe1, 0x00, 0x00];
        bytes.extend(wide("The supplier must confirm every purchase order."));
        bytes.extend([0x0d, 0x00, 0x07, 0x01]);
        let document = RawDocument::new(bytes, "application/msword", "policy.doc");

        let processor = DocumentProcessor::new();
        assert!(processor.is_legacy_binary(&document));
        let (kind, content) = processor.extract(&document).unwrap();
        assert_eq!(kind, ContainerKind::Word);
        assert_eq!(content.raw_text, "The supplier must confirm every purchase order.");
        assert_eq!(
            content.fallback.as_deref(),
            Some("strings salvaged from legacy binary Word (.doc)")
        );
    }

    #[test]
    fn zip_named_like_a_legacy_file_is_read_as_ooxml() {
        let bytes = crate::extractors::archive::test_support::build_zip(&[(
            "word/document.xml",
            r#"<w:document xmlns:w="x"><w:body><w:p><w:r><w:t>Orders must be confirmed by email.</w:t></w:r></w:p></w:body></w:document>"#,
        )]);
        let document = RawDocument::new(bytes, "application/msword", "renamed.doc");

        let processor = DocumentProcessor::new();
        assert!(!processor.is_legacy_binary(&document));
        let (_, content) = processor.extract(&document).unwrap();
        assert!(content.fallback.is_none());
        assert!(content.raw_text.contains("Orders must be confirmed by email."));
    }

    #[test]
    fn plain_text_passes_through() {
        let document = RawDocument::new(b"Line one\nLine two".to_vec(), "text/plain", "notes.txt");
        let (kind, content) = DocumentProcessor::new().extract(&document).unwrap();
        assert_eq!(kind, ContainerKind::PlainText);
        assert_eq!(content.raw_text, "Line one\nLine two");
    }

    #[tokio::test]
    async fn read_document_infers_mime_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requirements.md");
        std::fs::write(&path, "# Scope").unwrap();
        let document = DocumentProcessor::new().read_document(&path, None).await.unwrap();
        assert_eq!(document.mime_type, "text/markdown");
        assert_eq!(document.file_name, "requirements.md");
    }
}
