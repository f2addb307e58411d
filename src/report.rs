//! The terminal artifact of an extraction run and its renderings.

use std::collections::BTreeMap;

use handlebars::{handlebars_helper, no_escape, Handlebars};
use serde::{Deserialize, Serialize};

use crate::complexity::WorkflowComplexity;
use crate::flowchart::FlowchartSummary;
use crate::model::{BusinessElement, Confidence};

const MARKDOWN_TEMPLATE: &str = r#"# Requirement Extraction Report: {{fileName}}

**Format:** {{format}}
**Requirements found:** {{count}}
{{#if manualReview}}

> **Manual review required:** {{manualReview}}
{{/if}}

## Quality Metrics

| Metric | Value |
|---|---|
| Confidence ratio | {{qualityMetrics.confidenceRatio}} |
| Testability ratio | {{qualityMetrics.testabilityRatio}} |
| Density per 1000 chars | {{qualityMetrics.densityPerK}} |
| Mean quality score | {{qualityMetrics.qualityScore}} |

## Breakdown

| Type | Count |
|---|---|
{{#each breakdown.byType}}
| {{@key}} | {{this}} |
{{/each}}

| Priority | Count |
|---|---|
{{#each breakdown.byPriority}}
| {{@key}} | {{this}} |
{{/each}}

| Complexity | Count |
|---|---|
{{#each breakdown.byComplexity}}
| {{@key}} | {{this}} |
{{/each}}

| Confidence | Count |
|---|---|
{{#each breakdown.byConfidence}}
| {{@key}} | {{this}} |
{{/each}}

| Testability | Count |
|---|---|
{{#each breakdown.byTestability}}
| {{@key}} | {{this}} |
{{/each}}

## Workflow Complexity

- Decision points: {{workflow.decisionPoints}}
- Activities: {{workflow.activities}}
- Events: {{workflow.events}}
- Connectors: {{workflow.connectors}}
- Cyclomatic complexity: {{workflow.cyclomaticComplexity}} ({{workflow.complexityLevel}})
{{#if flowchart}}

## Flowchart

- Shapes: {{flowchart.shapeCount}}, connectors: {{flowchart.connectorCount}}, decisions: {{flowchart.decisionCount}}
- Flow complexity: {{flowchart.complexity}}
{{#each flowchart.warnings}}
- Warning: {{this}}
{{/each}}
{{/if}}
{{#if warnings}}

## Warnings

{{#each warnings}}
- {{this}}
{{/each}}
{{/if}}

## Requirements
{{#each elements}}

### {{inc @index}}. {{type}} (line {{lineNumber}})

{{text}}

- Section: {{#if section}}{{section}}{{else}}-{{/if}}
- Priority: {{priority}}, confidence: {{confidence}}, complexity: {{complexity}}
- Testable: {{isTestable}}, quality score: {{qualityScore}}, cyclomatic complexity: {{cyclomaticComplexity}}
{{/each}}
"#;

handlebars_helper!(inc: |index: u64| index + 1);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub by_type: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
    pub by_confidence: BTreeMap<String, usize>,
    pub by_complexity: BTreeMap<String, usize>,
    pub by_testability: BTreeMap<String, usize>,
}

impl Breakdown {
    fn from_elements(elements: &[BusinessElement]) -> Self {
        let mut breakdown = Self::default();
        for element in elements {
            *breakdown.by_type.entry(element.element_type.to_string()).or_default() += 1;
            *breakdown.by_priority.entry(element.priority.to_string()).or_default() += 1;
            *breakdown.by_confidence.entry(element.confidence.to_string()).or_default() += 1;
            *breakdown.by_complexity.entry(element.complexity.to_string()).or_default() += 1;
            let testability = if element.is_testable { "testable" } else { "not testable" };
            *breakdown.by_testability.entry(testability.to_string()).or_default() += 1;
        }
        breakdown
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    /// Share of elements with high confidence.
    pub confidence_ratio: f64,
    pub testability_ratio: f64,
    /// Elements per 1000 characters of extracted text.
    pub density_per_k: f64,
    /// Mean quality score.
    pub quality_score: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl QualityMetrics {
    fn from_elements(elements: &[BusinessElement], text_chars: usize) -> Self {
        if elements.is_empty() {
            return Self::default();
        }
        let count = elements.len() as f64;
        let high = elements.iter().filter(|e| e.confidence == Confidence::High).count() as f64;
        let testable = elements.iter().filter(|e| e.is_testable).count() as f64;
        let total_score: u32 = elements.iter().map(|e| e.quality_score).sum();
        let density = if text_chars == 0 {
            0.0
        } else {
            count * 1000.0 / text_chars as f64
        };
        Self {
            confidence_ratio: round2(high / count),
            testability_ratio: round2(testable / count),
            density_per_k: round2(density),
            quality_score: round2(f64::from(total_score) / count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    pub file_name: String,
    pub format: String,
    pub count: usize,
    pub elements: Vec<BusinessElement>,
    pub breakdown: Breakdown,
    pub quality_metrics: QualityMetrics,
    pub workflow: WorkflowComplexity,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub flowchart: Option<FlowchartSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub manual_review: Option<String>,
}

impl ExtractionReport {
    /// Builds the report; `count` and the breakdowns always describe `elements`.
    pub fn new(
        file_name: impl Into<String>,
        format: impl Into<String>,
        elements: Vec<BusinessElement>,
        text_chars: usize,
        workflow: WorkflowComplexity,
    ) -> Self {
        let breakdown = Breakdown::from_elements(&elements);
        let quality_metrics = QualityMetrics::from_elements(&elements, text_chars);
        Self {
            file_name: file_name.into(),
            format: format.into(),
            count: elements.len(),
            elements,
            breakdown,
            quality_metrics,
            workflow,
            flowchart: None,
            warnings: Vec::new(),
            manual_review: None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn render_markdown(&self) -> Result<String, handlebars::RenderError> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(no_escape);
        handlebars.register_helper("inc", Box::new(inc));
        handlebars.render_template(MARKDOWN_TEMPLATE, self)
    }

    pub fn render_plain(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{} ({}): {} requirements\n", self.file_name, self.format, self.count));
        if let Some(note) = &self.manual_review {
            out.push_str(&format!("Manual review required: {}\n", note));
        }
        for (element_type, count) in &self.breakdown.by_type {
            out.push_str(&format!("  {}: {}\n", element_type, count));
        }
        out.push_str(&format!(
            "Workflow cyclomatic complexity: {} ({})\n",
            self.workflow.cyclomatic_complexity, self.workflow.complexity_level
        ));
        for warning in &self.warnings {
            out.push_str(&format!("Warning: {}\n", warning));
        }
        for (i, element) in self.elements.iter().enumerate() {
            out.push_str(&format!(
                "{:>3}. [{}] {} (line {}, score {})\n",
                i + 1,
                element.element_type,
                element.text,
                element.line_number,
                element.quality_score
            ));
        }
        out
    }
}
