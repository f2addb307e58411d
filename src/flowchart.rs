//! Flowchart graph analysis for diagram pages.
//!
//! Shapes become typed nodes and connectors become edges between them. The
//! analysis only looks at the page XML it is given; master-shape names are
//! resolved by the caller and passed in.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::extractors::xml_text::{attribute, collapse_whitespace};

static RE_DECISION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(decision|gateway|if|condition|conditional)\b").unwrap());
static RE_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(start|begin)\b").unwrap());
static RE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(end|finish|stop)\b").unwrap());
static RE_CONNECTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(connector|\bline\b|\barrow\b)").unwrap());
static RE_MASTER_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\d+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Process,
    Decision,
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowchartNode {
    pub id: String,
    pub text: String,
    pub role: NodeRole,
    pub master_type: String,
    /// Byte offset of the shape element in the page XML.
    pub xml_position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowType {
    #[serde(rename = "Decision Flow")]
    Decision,
    #[serde(rename = "Process to Decision")]
    ProcessToDecision,
    #[serde(rename = "Start Flow")]
    Start,
    #[serde(rename = "End Flow")]
    End,
    #[serde(rename = "Standard Flow")]
    Standard,
}

impl FlowType {
    pub fn label(&self) -> &'static str {
        match self {
            FlowType::Decision => "Decision Flow",
            FlowType::ProcessToDecision => "Process to Decision",
            FlowType::Start => "Start Flow",
            FlowType::End => "End Flow",
            FlowType::Standard => "Standard Flow",
        }
    }

    fn between(from: Option<NodeRole>, to: Option<NodeRole>) -> Self {
        match (from, to) {
            (Some(NodeRole::Decision), Some(NodeRole::Process)) => FlowType::Decision,
            (Some(NodeRole::Process), Some(NodeRole::Decision)) => FlowType::ProcessToDecision,
            (Some(NodeRole::Start), _) => FlowType::Start,
            (_, Some(NodeRole::End)) => FlowType::End,
            _ => FlowType::Standard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowchartEdge {
    pub from_id: String,
    pub to_id: String,
    /// Index into `FlowchartGraph::nodes`, `None` when the shape was not classified.
    pub from_node: Option<usize>,
    pub to_node: Option<usize>,
    pub flow_type: FlowType,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowchartGraph {
    pub nodes: Vec<FlowchartNode>,
    pub edges: Vec<FlowchartEdge>,
    /// Non-connector shape elements on the page, classified or not.
    pub shape_elements: usize,
    /// Distinct connectors on the page, whether or not both ends resolved.
    pub connector_elements: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowComplexity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowchartSummary {
    pub shape_count: usize,
    pub connector_count: usize,
    pub decision_count: usize,
    pub process_count: usize,
    pub start_count: usize,
    pub end_count: usize,
    pub has_decision_points: bool,
    pub complexity: FlowComplexity,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default)]
struct PendingShape {
    id: String,
    name: String,
    master: Option<String>,
    text: String,
    position: usize,
}

impl PendingShape {
    fn from_element(element: &BytesStart<'_>, position: usize) -> Self {
        Self {
            id: attribute(element, "ID").unwrap_or_default(),
            name: attribute(element, "NameU")
                .or_else(|| attribute(element, "Name"))
                .unwrap_or_default(),
            master: attribute(element, "Master"),
            text: String::new(),
            position,
        }
    }
}

struct Connect {
    from_sheet: String,
    from_cell: String,
    to_sheet: String,
}

pub struct FlowchartAnalyzer<'a> {
    master_names: &'a BTreeMap<String, String>,
}

impl<'a> FlowchartAnalyzer<'a> {
    pub fn new(master_names: &'a BTreeMap<String, String>) -> Self {
        Self { master_names }
    }

    pub fn analyze(&self, page_xml: &str) -> Result<FlowchartGraph, quick_xml::Error> {
        let (shapes, connects) = parse_page(page_xml)?;

        let mut connector_ids: Vec<&str> = Vec::new();
        for shape in &shapes {
            if RE_CONNECTOR.is_match(&self.master_type(shape)) {
                connector_ids.push(&shape.id);
            }
        }
        for connect in &connects {
            if is_endpoint_cell(&connect.from_cell) && !connector_ids.contains(&connect.from_sheet.as_str()) {
                connector_ids.push(&connect.from_sheet);
            }
        }

        let shape_elements = shapes
            .iter()
            .filter(|shape| !connector_ids.contains(&shape.id.as_str()))
            .count();

        let mut classified: Vec<(FlowchartNode, bool)> = shapes
            .iter()
            .filter(|shape| !connector_ids.contains(&shape.id.as_str()))
            .filter_map(|shape| self.classify(shape))
            .collect();
        classified.sort_by_key(|(node, _)| node.xml_position);

        let pairs = connection_pairs(&connects);
        let nodes: Vec<FlowchartNode> = classified
            .into_iter()
            .map(|(mut node, terminator)| {
                if terminator {
                    node.role = terminator_role(&node.id, &pairs);
                }
                node
            })
            .collect();

        let edges = build_edges(&nodes, pairs);
        Ok(FlowchartGraph {
            nodes,
            edges,
            shape_elements,
            connector_elements: connector_ids.len(),
        })
    }

    fn master_type(&self, shape: &PendingShape) -> String {
        if let Some(name) = shape.master.as_ref().and_then(|id| self.master_names.get(id)) {
            return name.clone();
        }
        RE_MASTER_SUFFIX.replace(&shape.name, "").into_owned()
    }

    /// The node for `shape`, and whether its role still depends on where it
    /// sits in the graph (a combined start/end master with no keyword in its text).
    fn classify(&self, shape: &PendingShape) -> Option<(FlowchartNode, bool)> {
        let text = collapse_whitespace(&shape.text);
        let master_type = self.master_type(shape);
        let has_text = text.chars().any(|c| c.is_alphanumeric());
        if !has_text && master_type.is_empty() {
            return None;
        }

        let text_role = if has_text { role_from_keywords(&text) } else { None };
        let terminator = text_role.is_none() && RE_START.is_match(&master_type) && RE_END.is_match(&master_type);
        let role = text_role
            .or_else(|| role_from_keywords(&master_type))
            .unwrap_or(NodeRole::Process);

        let node = FlowchartNode {
            id: shape.id.clone(),
            text: if has_text { text } else { master_type.clone() },
            role,
            master_type,
            xml_position: shape.position,
        };
        Some((node, terminator))
    }
}

fn role_from_keywords(text: &str) -> Option<NodeRole> {
    if RE_DECISION.is_match(text) {
        Some(NodeRole::Decision)
    } else if RE_START.is_match(text) {
        Some(NodeRole::Start)
    } else if RE_END.is_match(text) {
        Some(NodeRole::End)
    } else {
        None
    }
}

/// End for a terminator that is reached but leads nowhere, otherwise Start.
fn terminator_role(id: &str, pairs: &[(String, String)]) -> NodeRole {
    let outgoing = pairs.iter().any(|(from, _)| from == id);
    let incoming = pairs.iter().any(|(_, to)| to == id);
    if incoming && !outgoing {
        NodeRole::End
    } else {
        NodeRole::Start
    }
}

fn is_endpoint_cell(cell: &str) -> bool {
    cell.starts_with("Begin") || cell.starts_with("End")
}

fn parse_page(xml: &str) -> Result<(Vec<PendingShape>, Vec<Connect>), quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<PendingShape> = Vec::new();
    let mut shapes = Vec::new();
    let mut connects = Vec::new();
    let mut text_depth = 0usize;

    loop {
        let position = reader.buffer_position();
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Shape" => stack.push(PendingShape::from_element(&e, position)),
                b"Text" if !stack.is_empty() => text_depth += 1,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"Shape" => shapes.push(PendingShape::from_element(&e, position)),
                b"Connect" => {
                    if let (Some(from_sheet), Some(to_sheet)) =
                        (attribute(&e, "FromSheet"), attribute(&e, "ToSheet"))
                    {
                        connects.push(Connect {
                            from_sheet,
                            from_cell: attribute(&e, "FromCell").unwrap_or_default(),
                            to_sheet,
                        });
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"Shape" => {
                    if let Some(shape) = stack.pop() {
                        shapes.push(shape);
                    }
                }
                b"Text" => text_depth = text_depth.saturating_sub(1),
                _ => {}
            },
            Event::Text(t) if text_depth > 0 => {
                if let Some(shape) = stack.last_mut() {
                    shape.text.push_str(&t.unescape()?);
                    shape.text.push(' ');
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((shapes, connects))
}

/// (from shape, to shape) for every connector with both ends glued, in order
/// of first appearance, followed by direct shape-to-shape connects.
fn connection_pairs(connects: &[Connect]) -> Vec<(String, String)> {
    // connector id -> (begin shape, end shape)
    let mut endpoints: Vec<(String, Option<String>, Option<String>)> = Vec::new();
    let mut direct: Vec<(String, String)> = Vec::new();

    for connect in connects {
        if is_endpoint_cell(&connect.from_cell) {
            let slot = match endpoints.iter().position(|(id, _, _)| *id == connect.from_sheet) {
                Some(i) => i,
                None => {
                    endpoints.push((connect.from_sheet.clone(), None, None));
                    endpoints.len() - 1
                }
            };
            if connect.from_cell.starts_with("Begin") {
                endpoints[slot].1 = Some(connect.to_sheet.clone());
            } else {
                endpoints[slot].2 = Some(connect.to_sheet.clone());
            }
        } else {
            direct.push((connect.from_sheet.clone(), connect.to_sheet.clone()));
        }
    }

    endpoints
        .into_iter()
        .filter_map(|(_, from, to)| Some((from?, to?)))
        .chain(direct)
        .collect()
}

fn build_edges(nodes: &[FlowchartNode], pairs: Vec<(String, String)>) -> Vec<FlowchartEdge> {
    pairs
        .into_iter()
        .map(|(from_id, to_id)| {
            let from_node = nodes.iter().position(|n| n.id == from_id);
            let to_node = nodes.iter().position(|n| n.id == to_id);
            let from_role = from_node.map(|i| nodes[i].role);
            let to_role = to_node.map(|i| nodes[i].role);
            let flow_type = FlowType::between(from_role, to_role);

            let label = |index: Option<usize>, id: &str| match index {
                Some(i) => nodes[i].text.clone(),
                None => format!("Shape {}", id),
            };
            let description = describe(flow_type, &label(from_node, &from_id), &label(to_node, &to_id));

            FlowchartEdge {
                from_id,
                to_id,
                from_node,
                to_node,
                flow_type,
                description,
            }
        })
        .collect()
}

fn describe(flow_type: FlowType, from: &str, to: &str) -> String {
    match flow_type {
        FlowType::Start => format!("Process starts at '{}' and continues to '{}'", from, to),
        FlowType::Decision => format!("Decision '{}' leads to '{}'", from, to),
        FlowType::ProcessToDecision => format!("'{}' leads to decision '{}'", from, to),
        FlowType::End => format!("'{}' completes the process at '{}'", from, to),
        FlowType::Standard => format!("'{}' flows to '{}'", from, to),
    }
}

impl FlowchartGraph {
    pub fn summary(&self) -> FlowchartSummary {
        FlowchartSummary::from_counts(
            self.shape_elements,
            self.connector_elements,
            self.count(NodeRole::Decision),
            self.count(NodeRole::Process),
            self.count(NodeRole::Start),
            self.count(NodeRole::End),
        )
    }

    fn count(&self, role: NodeRole) -> usize {
        self.nodes.iter().filter(|n| n.role == role).count()
    }

    /// Text form of the graph, one labelled line per node and edge.
    pub fn to_lines(&self) -> Vec<String> {
        let nodes = self.nodes.iter().map(|node| {
            let label = match node.role {
                NodeRole::Start => "Start Point",
                NodeRole::End => "End Point",
                NodeRole::Decision => "Decision Point",
                NodeRole::Process => "Process Step",
            };
            format!("{}: {}", label, node.text)
        });
        let edges = self.edges.iter().map(|edge| format!("Process Flow: {}", edge.description));
        nodes.chain(edges).collect()
    }
}

impl FlowchartSummary {
    fn from_counts(
        shape_count: usize,
        connector_count: usize,
        decision_count: usize,
        process_count: usize,
        start_count: usize,
        end_count: usize,
    ) -> Self {
        let complexity = if decision_count > 5 {
            FlowComplexity::High
        } else if decision_count > 2 {
            FlowComplexity::Medium
        } else {
            FlowComplexity::Low
        };

        let mut warnings = Vec::new();
        if shape_count > 0 {
            if start_count == 0 {
                warnings.push("No start point found in the flowchart".to_string());
            }
            if end_count == 0 {
                warnings.push("No end point found in the flowchart".to_string());
            }
            if decision_count > process_count {
                warnings.push(format!(
                    "More decision points ({}) than process steps ({})",
                    decision_count, process_count
                ));
            }
        }

        Self {
            shape_count,
            connector_count,
            decision_count,
            process_count,
            start_count,
            end_count,
            has_decision_points: decision_count > 0,
            complexity,
            warnings,
        }
    }

    /// Document-level totals across several pages.
    pub fn combine<'s>(pages: impl IntoIterator<Item = &'s FlowchartSummary>) -> Self {
        let (mut shapes, mut connectors, mut decisions, mut processes, mut starts, mut ends) = (0, 0, 0, 0, 0, 0);
        for page in pages {
            shapes += page.shape_count;
            connectors += page.connector_count;
            decisions += page.decision_count;
            processes += page.process_count;
            starts += page.start_count;
            ends += page.end_count;
        }
        Self::from_counts(shapes, connectors, decisions, processes, starts, ends)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<PageContents xmlns="http://schemas.microsoft.com/office/visio/2012/main">
  <Shapes>
    <Shape ID="1" NameU="Start/End" Type="Shape" Master="2">
      <Cell N="PinX" V="1"/>
      <Text>Start</Text>
    </Shape>
    <Shape ID="2" NameU="Decision" Type="Shape" Master="3">
      <Text>Approve Request</Text>
    </Shape>
    <Shape ID="3" NameU="Dynamic connector" Type="Shape" Master="4"/>
  </Shapes>
  <Connects>
    <Connect FromSheet="3" FromCell="BeginX" FromPart="9" ToSheet="1" ToCell="PinX" ToPart="3"/>
    <Connect FromSheet="3" FromCell="EndX" FromPart="12" ToSheet="2" ToCell="PinX" ToPart="3"/>
  </Connects>
</PageContents>"#;

    fn masters() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("2".to_string(), "Start/End".to_string()),
            ("3".to_string(), "Decision".to_string()),
            ("4".to_string(), "Dynamic connector".to_string()),
        ])
    }

    #[test]
    fn start_and_decision_connected_by_one_connector() {
        let masters = masters();
        let graph = FlowchartAnalyzer::new(&masters).analyze(PAGE).unwrap();

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].role, NodeRole::Start);
        assert_eq!(graph.nodes[1].role, NodeRole::Decision);
        assert_eq!(graph.nodes[1].text, "Approve Request");

        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].flow_type, FlowType::Start);
        assert!(graph.edges[0].description.contains("Approve Request"));

        let summary = graph.summary();
        assert!(summary.has_decision_points);
        assert_eq!(summary.connector_count, 1);
        assert_eq!(summary.complexity, FlowComplexity::Low);
        assert_eq!(summary.warnings, vec!["No end point found in the flowchart".to_string(),
            "More decision points (1) than process steps (0)".to_string()]);
    }

    #[test]
    fn text_keywords_take_precedence_over_master() {
        let masters = masters();
        let xml = r#"<PageContents><Shapes>
            <Shape ID="7" Master="2"><Text>Finish</Text></Shape>
            <Shape ID="8" NameU="Process.12"><Text>Send Invoice</Text></Shape>
        </Shapes></PageContents>"#;
        let graph = FlowchartAnalyzer::new(&masters).analyze(xml).unwrap();
        assert_eq!(graph.nodes[0].role, NodeRole::End);
        assert_eq!(graph.nodes[1].role, NodeRole::Process);
        assert_eq!(graph.nodes[1].master_type, "Process");
    }

    fn connector(id: &str, from: &str, to: &str) -> String {
        format!(
            r#"<Connect FromSheet="{id}" FromCell="BeginX" ToSheet="{from}"/><Connect FromSheet="{id}" FromCell="EndX" ToSheet="{to}"/>"#
        )
    }

    fn claim_page() -> String {
        let connects: String = [
            connector("10", "1", "2"),
            connector("11", "2", "3"),
            connector("12", "3", "4"),
            connector("13", "4", "5"),
            connector("14", "4", "6"),
            connector("15", "1", "3"),
        ]
        .concat();
        format!(
            r#"<PageContents><Shapes>
            <Shape ID="1" Master="2"><Text>Claim received</Text></Shape>
            <Shape ID="2"><Text>Review claim documents</Text></Shape>
            <Shape ID="3" Master="3"><Text>Claim valid?</Text></Shape>
            <Shape ID="4"><Text>Pay out claim</Text></Shape>
            <Shape ID="5" Master="2"><Text>Claim closed</Text></Shape>
            <Shape ID="6"><Text>Archive claim file</Text></Shape>
            <Shape ID="10" Master="4"/><Shape ID="11" Master="4"/><Shape ID="12" Master="4"/>
            <Shape ID="13" Master="4"/><Shape ID="14" Master="4"/><Shape ID="15" Master="4"/>
        </Shapes><Connects>{}</Connects></PageContents>"#,
            connects
        )
    }

    #[test]
    fn every_flow_type_is_derived_from_node_roles() {
        let masters = masters();
        let graph = FlowchartAnalyzer::new(&masters).analyze(&claim_page()).unwrap();

        let roles: Vec<NodeRole> = graph.nodes.iter().map(|n| n.role).collect();
        assert_eq!(
            roles,
            vec![
                NodeRole::Start,
                NodeRole::Process,
                NodeRole::Decision,
                NodeRole::Process,
                NodeRole::End,
                NodeRole::Process,
            ]
        );

        let flows: Vec<FlowType> = graph.edges.iter().map(|e| e.flow_type).collect();
        assert_eq!(
            flows,
            vec![
                FlowType::Start,
                FlowType::ProcessToDecision,
                FlowType::Decision,
                FlowType::End,
                FlowType::Standard,
                // start to decision
                FlowType::Start,
            ]
        );
        assert_eq!(
            graph.edges[3].description,
            "'Pay out claim' completes the process at 'Claim closed'"
        );
    }

    #[test]
    fn start_end_master_resolves_by_graph_position() {
        let masters = masters();
        let graph = FlowchartAnalyzer::new(&masters).analyze(&claim_page()).unwrap();
        assert_eq!(graph.nodes[0].master_type, "Start/End");
        assert_eq!(graph.nodes[0].role, NodeRole::Start);
        assert_eq!(graph.nodes[4].master_type, "Start/End");
        assert_eq!(graph.nodes[4].role, NodeRole::End);

        // no connections at all: the master decides
        let lone = r#"<PageContents><Shapes><Shape ID="1" Master="2"><Text>Claim closed</Text></Shape></Shapes></PageContents>"#;
        let graph = FlowchartAnalyzer::new(&masters).analyze(lone).unwrap();
        assert_eq!(graph.nodes[0].role, NodeRole::Start);
    }

    #[test]
    fn counts_cover_every_shape_and_connector_element() {
        let masters = masters();
        let xml = r#"<PageContents><Shapes>
            <Shape ID="1" Master="2"><Text>Start</Text></Shape>
            <Shape ID="2"><Text>Ship order</Text></Shape>
            <Shape ID="3"/>
            <Shape ID="8" Master="4"/>
            <Shape ID="9" Master="4"/>
        </Shapes><Connects>
            <Connect FromSheet="8" FromCell="BeginX" ToSheet="1"/>
            <Connect FromSheet="8" FromCell="EndX" ToSheet="2"/>
            <Connect FromSheet="9" FromCell="BeginX" ToSheet="2"/>
        </Connects></PageContents>"#;
        let graph = FlowchartAnalyzer::new(&masters).analyze(xml).unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);

        let summary = graph.summary();
        assert_eq!(summary.shape_count, 3);
        assert_eq!(summary.connector_count, 2);
    }

    #[test]
    fn unresolved_endpoints_keep_raw_ids() {
        let masters = BTreeMap::new();
        let xml = r#"<PageContents><Shapes>
            <Shape ID="1"><Text>Review claim documents</Text></Shape>
        </Shapes><Connects>
            <Connect FromSheet="9" FromCell="BeginX" ToSheet="1"/>
            <Connect FromSheet="9" FromCell="EndX" ToSheet="42"/>
        </Connects></PageContents>"#;
        let graph = FlowchartAnalyzer::new(&masters).analyze(xml).unwrap();
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].to_node, None);
        assert_eq!(graph.edges[0].flow_type, FlowType::Standard);
        assert!(graph.edges[0].description.contains("Shape 42"));
    }

    #[test]
    fn nodes_follow_document_order() {
        let masters = BTreeMap::new();
        let xml = r#"<PageContents><Shapes>
            <Shape ID="20"><Text>Begin intake</Text></Shape>
            <Shape ID="3"><Text>Check eligibility</Text></Shape>
            <Shape ID="11"><Text>Stop</Text></Shape>
        </Shapes></PageContents>"#;
        let graph = FlowchartAnalyzer::new(&masters).analyze(xml).unwrap();
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["20", "3", "11"]);
        assert!(graph.summary().warnings.is_empty());
    }

    #[test]
    fn complexity_label_thresholds() {
        assert_eq!(FlowchartSummary::from_counts(10, 0, 6, 4, 1, 1).complexity, FlowComplexity::High);
        assert_eq!(FlowchartSummary::from_counts(10, 0, 3, 4, 1, 1).complexity, FlowComplexity::Medium);
        assert_eq!(FlowchartSummary::from_counts(10, 0, 2, 4, 1, 1).complexity, FlowComplexity::Low);
    }

    #[test]
    fn graph_lines_use_classifier_prefixes() {
        let masters = masters();
        let graph = FlowchartAnalyzer::new(&masters).analyze(PAGE).unwrap();
        let lines = graph.to_lines();
        assert_eq!(lines[0], "Start Point: Start");
        assert_eq!(lines[1], "Decision Point: Approve Request");
        assert!(lines[2].starts_with("Process Flow: Process starts at 'Start'"));
    }
}
