use std::io::{Cursor, Write};

use reqscan::analyzer::*;
use reqscan::extractors::visio;
use reqscan::flowchart::{FlowType, NodeRole};
use reqscan::model::{Confidence, ElementType, Priority};
use reqscan::scoring::dedup_key;
use reqscan::{ExtractionError, RawDocument};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

fn zip(members: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in members {
        writer.start_file(*name, zip::write::FileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn word_document(paragraphs: &[&str]) -> String {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    )
}

fn order_docx() -> Vec<u8> {
    zip(&[(
        "word/document.xml",
        word_document(&[
            "1. The system must validate the order total.",
            "2. The system should display a confirmation page.",
        ])
        .as_str(),
    )])
}

const VISIO_MASTERS: &str = r#"<Masters xmlns="http://schemas.microsoft.com/office/visio/2012/main">
    <Master ID="2" NameU="Start/End"/>
    <Master ID="3" NameU="Decision"/>
    <Master ID="4" NameU="Dynamic connector"/>
</Masters>"#;

const VISIO_PAGE: &str = r#"<PageContents xmlns="http://schemas.microsoft.com/office/visio/2012/main"><Shapes>
    <Shape ID="1" Master="2"><Text>Start</Text></Shape>
    <Shape ID="2" Master="3"><Text>Approve Request</Text></Shape>
    <Shape ID="3" Master="4"/>
</Shapes><Connects>
    <Connect FromSheet="3" FromCell="BeginX" ToSheet="1"/>
    <Connect FromSheet="3" FromCell="EndX" ToSheet="2"/>
</Connects></PageContents>"#;

fn approval_vsdx() -> Vec<u8> {
    zip(&[
        ("visio/masters/masters.xml", VISIO_MASTERS),
        ("visio/pages/page1.xml", VISIO_PAGE),
    ])
}

#[test]
fn test_docx_with_two_numbered_requirements() {
    let analyzer = Analyzer::new().unwrap();
    let document = RawDocument::new(order_docx(), DOCX_MIME, "orders.docx");
    let report = analyzer.analyze_document(&document).unwrap();

    assert_eq!(report.count, 2);
    assert_eq!(report.elements.len(), 2);
    for element in &report.elements {
        assert_eq!(element.element_type, ElementType::SystemRequirement);
        assert_eq!(element.section, "Main Document Content");
        assert!(element.quality_score > 0);
    }
    assert_eq!(report.format, "Word");
    assert!(report.warnings.is_empty());
    assert!(report.manual_review.is_none());
}

#[test]
fn test_truncated_docx_falls_back_without_error() {
    let analyzer = Analyzer::new().unwrap();
    let bytes = order_docx();
    let truncated = bytes[..bytes.len() / 2].to_vec();
    let document = RawDocument::new(truncated, DOCX_MIME, "broken.docx");

    let report = analyzer.analyze_document(&document).unwrap();
    assert_eq!(report.count, report.elements.len());
    assert!(report
        .warnings
        .iter()
        .any(|w| w.starts_with("Container could not be opened")));
}

#[test]
fn test_visio_flow_graph() {
    let (pages, failures) = visio::page_graphs(&approval_vsdx(), "approval.vsdx").unwrap();
    assert!(failures.is_empty());
    assert_eq!(pages.len(), 1);

    let graph = &pages[0].graph;
    let roles: Vec<NodeRole> = graph.nodes.iter().map(|n| n.role).collect();
    assert_eq!(roles, vec![NodeRole::Start, NodeRole::Decision]);
    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.edges[0].flow_type, FlowType::Start);
    assert_eq!(graph.edges[0].flow_type.label(), "Start Flow");
    assert!(graph.summary().has_decision_points);
}

#[test]
fn test_visio_document_report_carries_flowchart() {
    let analyzer = Analyzer::new().unwrap();
    let document = RawDocument::new(approval_vsdx(), "application/vnd.ms-visio.drawing", "approval.vsdx");
    let report = analyzer.analyze_document(&document).unwrap();

    let flowchart = report.flowchart.as_ref().unwrap();
    assert_eq!(flowchart.shape_count, 2);
    assert_eq!(flowchart.connector_count, 1);
    assert!(flowchart.has_decision_points);

    let decision = report
        .elements
        .iter()
        .find(|e| e.element_type == ElementType::DecisionPoint)
        .unwrap();
    assert_eq!(decision.text, "Decision Point: Approve Request");
    assert_eq!(decision.confidence, Confidence::High);
    assert_eq!(decision.section, "Page 1");
}

#[test]
fn test_identical_input_gives_identical_report() {
    let analyzer = Analyzer::new().unwrap();
    let document = RawDocument::new(order_docx(), DOCX_MIME, "orders.docx");

    let first = analyzer.analyze_document(&document).unwrap();
    let second = analyzer.analyze_document(&document).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());

    let fresh = Analyzer::new().unwrap().analyze_document(&document).unwrap();
    assert_eq!(first, fresh);
}

#[test]
fn test_duplicate_lines_keep_the_first_occurrence() {
    let analyzer = Analyzer::new().unwrap();
    let text = "The customer must sign in before checkout.\n\
                The system shall send an invoice to the customer.\n\
                the customer  must sign in before checkout.";
    let report = analyzer.analyze_text(text, "dupes.txt", "Text");

    let key = dedup_key("The customer must sign in before checkout.");
    let matching: Vec<_> = report.elements.iter().filter(|e| dedup_key(&e.text) == key).collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].line_number, 1);

    let mut keys: Vec<String> = report.elements.iter().map(|e| dedup_key(&e.text)).collect();
    let total = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), total);
}

#[test]
fn test_exact_prefix_wins_over_other_tiers() {
    let analyzer = Analyzer::new().unwrap();
    let report = analyzer.analyze_text(
        "Business Process: The customer must approve every order.",
        "process.txt",
        "Text",
    );
    assert_eq!(report.count, 1);
    let element = &report.elements[0];
    assert_eq!(element.element_type, ElementType::BusinessProcess);
    assert_eq!(element.confidence, Confidence::High);
    assert_eq!(element.priority, Priority::High);
}

#[test]
fn test_workflow_complexity_formula() {
    let analyzer = Analyzer::new().unwrap();
    let result = analyzer.workflow_complexity(
        "The gateway routes to a decision and another branch. One task follows. \
         A sequence flow and a message flow connect them.",
    );
    let expected = result.edges as i64 - result.nodes as i64 + 2;
    assert_eq!(result.cyclomatic_complexity as i64, expected.max(1));
    assert_eq!(result.cyclomatic_complexity, 3);
}

#[test]
fn test_unsupported_format_names_the_mime_type() {
    let analyzer = Analyzer::new().unwrap();
    let document = RawDocument::new(b"PK\x03\x04".to_vec(), "application/zip", "bundle.zip");
    match analyzer.analyze_document(&document) {
        Err(ExtractionError::UnsupportedFormat { mime_type, file_name }) => {
            assert_eq!(mime_type, "application/zip");
            assert_eq!(file_name, "bundle.zip");
        }
        other => panic!("expected unsupported format, got {:?}", other),
    }
}

#[test]
fn test_plain_text_passes_through() {
    let analyzer = Analyzer::new().unwrap();
    let document = RawDocument::new(
        b"# Checkout\nThe system must reject expired payment cards.".to_vec(),
        "text/plain",
        "notes.txt",
    );
    let report = analyzer.analyze_document(&document).unwrap();
    assert_eq!(report.format, "Text");
    assert_eq!(report.count, 1);
    assert_eq!(report.elements[0].section, "Checkout");
    assert_eq!(report.elements[0].line_number, 2);
}

#[test]
fn test_slides_are_sectioned() {
    let slide = r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>Customers must receive an order confirmation email.</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#;
    let bytes = zip(&[("ppt/slides/slide1.xml", slide)]);
    let analyzer = Analyzer::new().unwrap();
    let document = RawDocument::new(bytes, "application/vnd.openxmlformats-officedocument.presentationml.presentation", "deck.pptx");

    let report = analyzer.analyze_document(&document).unwrap();
    assert_eq!(report.format, "PowerPoint");
    assert!(report.count >= 1);
    assert!(report.elements.iter().all(|e| e.section == "Slide 1"));
}

#[test]
fn test_normalization_is_idempotent_and_monotonic() {
    let analyzer = Analyzer::new().unwrap();
    let raw = "# Ordering\n\
               \n\
               1. The system must validate the order total.\n\
               ORDERS\n\
               short\n\
               https://example.com/orders/catalogue/index\n\
               Managers must approve refunds above the limit.\n\
               12 13 14 15\n\
               The customer can cancel an order before dispatch.";
    let lines = analyzer.normalize(raw);
    assert_eq!(
        lines.iter().map(|l| l.line_number).collect::<Vec<_>>(),
        vec![3, 7, 9]
    );
    assert!(lines.windows(2).all(|w| w[0].line_number < w[1].line_number));

    let joined = lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n");
    let again = analyzer.normalize(&joined);
    assert_eq!(
        again.iter().map(|l| l.text.as_str()).collect::<Vec<_>>(),
        lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>()
    );
}

#[test]
fn test_sentences_opening_with_reference_words_are_extracted() {
    let analyzer = Analyzer::new().unwrap();
    for line in [
        "Contents of the invoice must include the VAT rate.",
        "Index of orders must be rebuilt every night by the system.",
        "References to customer records must be encrypted at rest.",
        "Glossary terms must be approved by the business owner.",
    ] {
        let report = analyzer.analyze_text(line, "terms.txt", "Text");
        assert_eq!(report.count, 1, "{}", line);
    }

    let toc = analyzer.analyze_text(
        "Table of Contents .......... 2\nGlossary                    27",
        "toc.txt",
        "Text",
    );
    assert_eq!(toc.count, 0);
}
