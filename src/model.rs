//! Core data types shared by every pipeline stage.

use serde::{Deserialize, Serialize};

/// One trimmed, filtered, section-tagged unit of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedLine {
    pub text: String,
    /// 1-based position in the unfiltered source line sequence.
    pub line_number: usize,
    /// Most recent heading seen before this line, empty if none.
    pub section: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElementType {
    #[serde(rename = "Business Process")]
    BusinessProcess,
    #[serde(rename = "Decision Point")]
    DecisionPoint,
    #[serde(rename = "Process Step")]
    ProcessStep,
    #[serde(rename = "Process Flow")]
    ProcessFlow,
    #[serde(rename = "Business Rule")]
    BusinessRule,
    #[serde(rename = "Business Logic")]
    BusinessLogic,
    #[serde(rename = "System Requirement")]
    SystemRequirement,
    #[serde(rename = "Acceptance Criteria")]
    AcceptanceCriteria,
    #[serde(rename = "Validation Requirement")]
    ValidationRequirement,
    #[serde(rename = "Process Requirement")]
    ProcessRequirement,
    #[serde(rename = "User Interaction")]
    UserInteraction,
    #[serde(rename = "Business Requirement")]
    BusinessRequirement,
}

impl ElementType {
    pub fn label(&self) -> &'static str {
        match self {
            ElementType::BusinessProcess => "Business Process",
            ElementType::DecisionPoint => "Decision Point",
            ElementType::ProcessStep => "Process Step",
            ElementType::ProcessFlow => "Process Flow",
            ElementType::BusinessRule => "Business Rule",
            ElementType::BusinessLogic => "Business Logic",
            ElementType::SystemRequirement => "System Requirement",
            ElementType::AcceptanceCriteria => "Acceptance Criteria",
            ElementType::ValidationRequirement => "Validation Requirement",
            ElementType::ProcessRequirement => "Process Requirement",
            ElementType::UserInteraction => "User Interaction",
            ElementType::BusinessRequirement => "Business Requirement",
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTag {
    Simple,
    Moderate,
    Complex,
}

impl std::fmt::Display for ComplexityTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplexityTag::Simple => write!(f, "simple"),
            ComplexityTag::Moderate => write!(f, "moderate"),
            ComplexityTag::Complex => write!(f, "complex"),
        }
    }
}

/// A classified, scored candidate requirement extracted from one line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessElement {
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub text: String,
    pub line_number: usize,
    pub section: String,
    pub priority: Priority,
    pub confidence: Confidence,
    pub complexity: ComplexityTag,
    pub is_testable: bool,
    pub quality_score: u32,
    /// Workflow cyclomatic complexity of this element's text alone.
    pub cyclomatic_complexity: u32,
}
