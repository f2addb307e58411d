//! Workflow complexity estimation.
//!
//! Counts workflow vocabulary in free text and derives a cyclomatic-style
//! score, `CC = E - N + 2P`, with one connected component per text.

use serde::{Deserialize, Serialize};

use crate::patterns::CompiledPatterns;

/// Connected components assumed for a single document or requirement.
const COMPONENTS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComplexityLevel {
    #[serde(rename = "simple")]
    Simple,
    #[serde(rename = "moderate")]
    Moderate,
    #[serde(rename = "complex")]
    Complex,
    #[serde(rename = "very complex")]
    VeryComplex,
}

impl std::fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ComplexityLevel::Simple => "simple",
            ComplexityLevel::Moderate => "moderate",
            ComplexityLevel::Complex => "complex",
            ComplexityLevel::VeryComplex => "very complex",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowComplexity {
    pub decision_points: usize,
    pub activities: usize,
    pub events: usize,
    pub connectors: usize,
    pub edges: usize,
    pub nodes: usize,
    pub cyclomatic_complexity: u32,
    pub complexity_level: ComplexityLevel,
    pub workflow_detected: bool,
}

pub struct ComplexityEstimator<'a> {
    patterns: &'a CompiledPatterns,
}

impl<'a> ComplexityEstimator<'a> {
    pub fn new(patterns: &'a CompiledPatterns) -> Self {
        Self { patterns }
    }

    pub fn analyze(&self, text: &str) -> WorkflowComplexity {
        let p = self.patterns;
        let rules = &p.workflow;

        let decision_points = p.decision_points.find_iter(text).count();
        let activities = p.activities.find_iter(text).count();
        let events = p.events.find_iter(text).count();
        let connectors = p.connectors.find_iter(text).count();

        let edges = connectors + decision_points;
        let nodes = decision_points + activities + events;
        let cc = (edges as i64 - nodes as i64 + 2 * COMPONENTS).max(1);
        let cyclomatic_complexity = u32::try_from(cc).unwrap_or(u32::MAX);

        let complexity_level = if cyclomatic_complexity <= rules.simple_max {
            ComplexityLevel::Simple
        } else if cyclomatic_complexity <= rules.moderate_max {
            ComplexityLevel::Moderate
        } else if cyclomatic_complexity <= rules.complex_max {
            ComplexityLevel::Complex
        } else {
            ComplexityLevel::VeryComplex
        };

        WorkflowComplexity {
            decision_points,
            activities,
            events,
            connectors,
            edges,
            nodes,
            cyclomatic_complexity,
            complexity_level,
            workflow_detected: decision_points > 0
                || activities > rules.detection_min_activities
                || connectors > rules.detection_min_connectors,
        }
    }
}
