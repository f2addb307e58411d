//! SpreadsheetML (`.xlsx`) reader.
//!
//! Cell grids come from `calamine`. When calamine cannot read the workbook,
//! worksheet XML is walked directly and shared-string references are resolved
//! against `xl/sharedStrings.xml`.

use std::io::{Cursor, Read, Seek};

use calamine::{Data, Reader, Xls, Xlsx};
use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use tracing::{debug, warn};

use super::archive::{self, OoxmlArchive};
use super::salvage::{salvage_binary_text, salvage_xml_text};
use super::xml_text::{self, attribute, collapse_whitespace, XmlTextLayout};
use super::{ExtractedContent, PartExtractor, TextAssembler};
use crate::error::PartFailure;

const COMMENT_LAYOUT: XmlTextLayout = XmlTextLayout {
    text: &["t"],
    paragraph: &["comment"],
    cell: &[],
    line_break: &[],
    tab: &[],
};

pub fn read(bytes: &[u8]) -> ExtractedContent {
    read_nested(bytes, 0)
}

pub(crate) fn read_nested(bytes: &[u8], depth: usize) -> ExtractedContent {
    let mut archive = match OoxmlArchive::open(bytes) {
        Ok(archive) => archive,
        Err(e) => {
            warn!(error = %e, "cannot open Excel archive, salvaging text");
            return ExtractedContent::from_fallback(salvage_xml_text(bytes), "salvaged XML text");
        }
    };

    let mut assembler = TextAssembler::default();
    let grid_found = match workbook_sheets(bytes) {
        Ok((sheets, failures)) => {
            let found = sheets.iter().any(|(_, text)| !text.trim().is_empty());
            for (name, text) in &sheets {
                assembler.push(&format!("Worksheet: {}", name), text);
            }
            failures.into_iter().for_each(|f| assembler.fail(f));
            found
        }
        Err(e) => {
            debug!(error = %e, "calamine could not read workbook");
            false
        }
    };
    if !grid_found {
        read_raw_sheets(&mut archive, &mut assembler);
    }

    let comment_parts: Vec<String> = archive
        .members("xl/", ".xml")
        .into_iter()
        .filter(|m| archive::file_name(m).starts_with("comments"))
        .collect();
    for part in comment_parts {
        let heading = format!("Comments: {}", archive::file_name(&part));
        match archive.read_xml(&part).and_then(|xml| {
            xml_text::extract_text(&xml, &COMMENT_LAYOUT).map_err(|e| PartFailure::new(part.as_str(), e))
        }) {
            Ok(text) => assembler.push(&heading, &text),
            Err(failure) => assembler.fail(failure),
        }
    }

    for (dir, label) in [("xl/drawings/", "Drawing"), ("xl/charts/", "Chart")] {
        for part in archive.members(dir, ".xml") {
            let heading = format!("{}: {}", label, archive::file_name(&part));
            assembler.push_part(&mut archive, &part, &heading, PartExtractor::OoxmlSlide);
        }
    }

    assembler.push_embedded(&mut archive, "xl/embeddings/", depth);
    assembler.finish()
}

/// Legacy binary workbook (`.xls`). Grids come from calamine; when the
/// workbook cannot be opened, printable strings are salvaged from the bytes.
pub fn read_legacy(bytes: &[u8]) -> ExtractedContent {
    match Xls::new(Cursor::new(bytes)) {
        Ok(mut workbook) => {
            let (sheets, failures) = sheet_texts(&mut workbook);
            let mut assembler = TextAssembler::default();
            for (name, text) in &sheets {
                assembler.push(&format!("Worksheet: {}", name), text);
            }
            failures.into_iter().for_each(|f| assembler.fail(f));
            assembler.finish()
        }
        Err(e) => {
            warn!(error = %e, "cannot open legacy workbook, salvaging strings");
            ExtractedContent::from_fallback(
                salvage_binary_text(bytes),
                "strings salvaged from legacy binary Excel (.xls)",
            )
        }
    }
}

type SheetTexts = Vec<(String, String)>;

fn workbook_sheets(bytes: &[u8]) -> Result<(SheetTexts, Vec<PartFailure>), calamine::XlsxError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    Ok(sheet_texts(&mut workbook))
}

/// Sheet name and row text for every sheet, in workbook order.
fn sheet_texts<RS, R>(workbook: &mut R) -> (SheetTexts, Vec<PartFailure>)
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let mut sheets = Vec::new();
    let mut failures = Vec::new();

    for sheet_name in workbook.sheet_names() {
        match workbook.worksheet_range(&sheet_name) {
            Ok(range) => {
                let rows: Vec<String> = range
                    .rows()
                    .filter_map(|row| {
                        let cells: Vec<String> = row
                            .iter()
                            .map(cell_text)
                            .filter(|text| !text.trim().is_empty())
                            .collect();
                        (!cells.is_empty()).then(|| cells.join(" | "))
                    })
                    .collect();
                sheets.push((sheet_name, rows.join("\n")));
            }
            Err(e) => failures.push(PartFailure::new(format!("worksheet '{}'", sheet_name), e)),
        }
    }
    (sheets, failures)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format!("{:?}", dt),
        Data::DateTimeIso(dt) => dt.clone(),
        Data::DurationIso(dur) => dur.clone(),
        Data::Error(e) => format!("ERROR: {:?}", e),
        Data::Empty => String::new(),
    }
}

fn read_raw_sheets(archive: &mut OoxmlArchive<'_>, assembler: &mut TextAssembler) {
    let shared = if archive.contains("xl/sharedStrings.xml") {
        match archive
            .read_xml("xl/sharedStrings.xml")
            .and_then(|xml| shared_strings(&xml).map_err(|e| PartFailure::new("xl/sharedStrings.xml", e)))
        {
            Ok(shared) => shared,
            Err(failure) => {
                assembler.fail(failure);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    for part in archive.members("xl/worksheets/", ".xml") {
        let heading = format!("Worksheet: {}", archive::file_name(&part));
        assembler.push_part(
            archive,
            &part,
            &heading,
            PartExtractor::OoxmlSheet { shared_strings: &shared },
        );
    }
}

/// Entries of the shared-string table, one per `si`, empty entries kept so
/// indices line up with cell references.
pub fn shared_strings(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = XmlReader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    // phonetic runs repeat the text in another script
    let mut in_phonetic = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_text = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(collapse_whitespace(&current)),
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(t) if in_text && !in_phonetic => current.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

/// Row texts of a worksheet part, cells joined with ` | `.
pub fn sheet_rows(xml: &str, shared: &[String]) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = XmlReader::from_str(xml);
    let mut rows = Vec::new();
    let mut cells: Vec<String> = Vec::new();
    let mut cell_type: Option<String> = None;
    let mut value = String::new();
    let mut in_value = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"c" => {
                    cell_type = attribute(&e, "t");
                    value.clear();
                }
                b"v" | b"t" => in_value = true,
                _ => {}
            },
            Event::Text(t) if in_value => value.push_str(&t.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    let text = match cell_type.as_deref() {
                        Some("s") => value
                            .trim()
                            .parse::<usize>()
                            .ok()
                            .and_then(|i| shared.get(i).cloned())
                            .unwrap_or_default(),
                        _ => collapse_whitespace(&value),
                    };
                    if !text.is_empty() {
                        cells.push(text);
                    }
                }
                b"row" => {
                    if !cells.is_empty() {
                        rows.push(cells.join(" | "));
                    }
                    cells.clear();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(rows)
}
