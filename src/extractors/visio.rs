//! Visio (`.vsdx`) reader.
//!
//! Each page is turned into a flowchart graph and re-emitted as labelled
//! lines (`Start Point: ...`, `Process Flow: ...`) so diagram content flows
//! through the same classification as prose.

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

use super::archive::{self, OoxmlArchive};
use super::salvage::salvage_xml_text;
use super::xml_text::attribute;
use super::{ExtractedContent, PartExtractor, TextAssembler};
use crate::error::{ExtractionError, PartFailure, Result};
use crate::flowchart::{FlowchartAnalyzer, FlowchartGraph, FlowchartSummary};

const MASTERS_PART: &str = "visio/masters/masters.xml";

#[derive(Debug, Clone)]
pub struct PageGraph {
    pub page: String,
    pub graph: FlowchartGraph,
}

pub fn read(bytes: &[u8]) -> ExtractedContent {
    read_nested(bytes, 0)
}

pub(crate) fn read_nested(bytes: &[u8], depth: usize) -> ExtractedContent {
    let mut archive = match OoxmlArchive::open(bytes) {
        Ok(archive) => archive,
        Err(e) => {
            warn!(error = %e, "cannot open Visio archive, salvaging text");
            return ExtractedContent::from_fallback(salvage_xml_text(bytes), "salvaged XML text");
        }
    };

    let mut assembler = TextAssembler::default();
    let (pages, failures) = collect_pages(&mut archive);
    for page in &pages {
        assembler.push(&page.page, &page.graph.to_lines().join("\n"));
    }
    for failure in failures {
        let recovered = recover_page_text(&mut archive, &failure.part);
        assembler.fail(failure);
        if let Some((heading, text)) = recovered {
            assembler.push(&heading, &text);
        }
    }
    assembler.push_embedded(&mut archive, "visio/embeddings/", depth);

    let mut content = assembler.finish();
    if !pages.is_empty() {
        let summaries: Vec<FlowchartSummary> = pages.iter().map(|p| p.graph.summary()).collect();
        content.flowchart = Some(FlowchartSummary::combine(&summaries));
    }
    content
}

/// Flowchart graph of every page, in page order.
pub fn page_graphs(bytes: &[u8], file_name: &str) -> Result<(Vec<PageGraph>, Vec<PartFailure>)> {
    let mut archive = OoxmlArchive::open(bytes).map_err(|e| ExtractionError::CorruptContainer {
        file_name: file_name.to_string(),
        detail: e.to_string(),
    })?;
    Ok(collect_pages(&mut archive))
}

fn collect_pages(archive: &mut OoxmlArchive<'_>) -> (Vec<PageGraph>, Vec<PartFailure>) {
    let mut failures = Vec::new();
    let masters = if archive.contains(MASTERS_PART) {
        match archive
            .read_xml(MASTERS_PART)
            .and_then(|xml| master_names(&xml).map_err(|e| PartFailure::new(MASTERS_PART, e)))
        {
            Ok(masters) => masters,
            Err(failure) => {
                failures.push(failure);
                BTreeMap::new()
            }
        }
    } else {
        BTreeMap::new()
    };
    debug!(masters = masters.len(), "loaded Visio master names");

    let analyzer = FlowchartAnalyzer::new(&masters);
    let mut pages = Vec::new();
    let page_parts: Vec<String> = archive
        .members("visio/pages/", ".xml")
        .into_iter()
        .filter(|m| archive::file_name(m).starts_with("page") && archive::part_number(m).is_some())
        .collect();

    for part in page_parts {
        let graph = archive
            .read_xml(&part)
            .and_then(|xml| analyzer.analyze(&xml).map_err(|e| PartFailure::new(part.as_str(), e)));
        match graph {
            Ok(graph) => {
                let page = match archive::part_number(&part) {
                    Some(n) => format!("Page {}", n),
                    None => archive::file_name(&part).to_string(),
                };
                pages.push(PageGraph { page, graph });
            }
            Err(failure) => {
                warn!(part = %failure.part, detail = %failure.detail, "skipping unreadable page");
                failures.push(failure);
            }
        }
    }
    (pages, failures)
}

/// Plain shape text of a page whose graph could not be built.
fn recover_page_text(archive: &mut OoxmlArchive<'_>, part: &str) -> Option<(String, String)> {
    let number = archive::part_number(part).filter(|_| part.starts_with("visio/pages/"))?;
    let bytes = archive.read_bytes(part).ok()?;
    let text = PartExtractor::OoxmlShape
        .extract(part, &bytes)
        .unwrap_or_else(|_| salvage_xml_text(&bytes));
    Some((format!("Page {}", number), text))
}

/// Master ID to universal name (`NameU`, else `Name`).
pub fn master_names(xml: &str) -> std::result::Result<BTreeMap<String, String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut names = BTreeMap::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Master" => {
                let name = attribute(&e, "NameU").or_else(|| attribute(&e, "Name"));
                if let (Some(id), Some(name)) = (attribute(&e, "ID"), name) {
                    names.insert(id, name);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(names)
}
