//! Pattern tables and tuned thresholds.
//!
//! Every keyword list, regular expression and scoring constant used by the
//! normalizer, classifier, scorer and complexity estimator lives in
//! [`PatternConfig`]. The built-in tables are the `Default` value; a YAML file
//! may override any category and the rest keep their defaults. Tables are
//! compiled once into [`CompiledPatterns`] before a document is processed.

use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{ExtractionError, Result};
use crate::model::{Confidence, ElementType, Priority};

pub const PATTERN_TABLE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub version: u32,
    pub prefixes: Vec<PrefixPattern>,
    pub structural: Vec<StructuralPattern>,
    pub keyword_families: Vec<KeywordFamily>,
    pub fallback: FallbackRules,
    pub rejection: RejectionRules,
    pub technical_lines: Vec<String>,
    pub scoring: ScoringRules,
    pub element_complexity: ElementComplexityRules,
    pub workflow: WorkflowVocabulary,
}

/// Tier 1: a case-insensitive line prefix that assigns a type directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixPattern {
    pub prefix: String,
    pub element_type: ElementType,
    /// When set, no later tier is consulted for the line.
    #[serde(default)]
    pub exclusive: bool,
}

/// Tier 2: list markers and requirement identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralPattern {
    pub pattern: String,
    pub element_type: ElementType,
}

/// Tier 3: a verb family contributing one candidate per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordFamily {
    pub name: String,
    pub pattern: String,
    pub element_type: ElementType,
    pub priority: Priority,
    pub confidence: Confidence,
}

/// Tier 4 gates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackRules {
    pub business_keywords: Vec<String>,
    pub action_keywords: Vec<String>,
    /// Lines without terminal punctuation must exceed this length.
    pub unpunctuated_min_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RejectionRules {
    pub min_length: usize,
    pub vague_support: String,
    pub vague_support_max_length: usize,
    pub page_reference: String,
    pub business_verb: String,
    pub numeric_sequence: String,
    pub reference_entries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedTerm {
    pub term: String,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPattern {
    pub name: String,
    pub pattern: String,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    /// Strongest matching term wins.
    pub action_words: Vec<WeightedTerm>,
    /// Most specific matching verb wins.
    pub specificity: Vec<WeightedTerm>,
    pub terminal_punctuation_points: i32,
    pub long_line_length: usize,
    pub long_line_points: i32,
    pub medium_line_length: usize,
    pub medium_line_points: i32,
    pub context_pairs: Vec<[String; 2]>,
    pub context_pair_points: i32,
    pub context_cap: i32,
    pub testability_bonus: i32,
    pub testability_action: Vec<String>,
    pub testability_outcome: Vec<String>,
    pub penalties: Vec<WeightedPattern>,
    pub bonuses: Vec<WeightedPattern>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementComplexityRules {
    pub conditional: Vec<String>,
    pub conjunction: Vec<String>,
    pub looping: Vec<String>,
    pub parallel: Vec<String>,
    pub error: Vec<String>,
    pub simple_max: u32,
    pub moderate_max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowVocabulary {
    pub decision_points: Vec<String>,
    pub activities: Vec<String>,
    pub events: Vec<String>,
    pub connectors: Vec<String>,
    pub simple_max: u32,
    pub moderate_max: u32,
    pub complex_max: u32,
    pub detection_min_activities: usize,
    pub detection_min_connectors: usize,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn terms(items: &[(&str, i32)]) -> Vec<WeightedTerm> {
    items
        .iter()
        .map(|(term, points)| WeightedTerm {
            term: term.to_string(),
            points: *points,
        })
        .collect()
}

fn prefix(prefix: &str, element_type: ElementType, exclusive: bool) -> PrefixPattern {
    PrefixPattern {
        prefix: prefix.to_string(),
        element_type,
        exclusive,
    }
}

fn structural(pattern: &str, element_type: ElementType) -> StructuralPattern {
    StructuralPattern {
        pattern: pattern.to_string(),
        element_type,
    }
}

fn weighted(name: &str, pattern: &str, points: i32) -> WeightedPattern {
    WeightedPattern {
        name: name.to_string(),
        pattern: pattern.to_string(),
        points,
    }
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            version: PATTERN_TABLE_VERSION,
            prefixes: vec![
                prefix("business process:", ElementType::BusinessProcess, true),
                prefix("decision point:", ElementType::DecisionPoint, true),
                prefix("process step:", ElementType::ProcessStep, true),
                prefix("process flow:", ElementType::ProcessFlow, true),
                prefix("start point:", ElementType::ProcessStep, true),
                prefix("end point:", ElementType::ProcessStep, true),
                prefix("business rule:", ElementType::BusinessRule, true),
                prefix("where ", ElementType::BusinessLogic, false),
                prefix("if ", ElementType::BusinessLogic, false),
                prefix("when ", ElementType::BusinessLogic, false),
                prefix("then ", ElementType::BusinessLogic, false),
                prefix("given ", ElementType::BusinessLogic, false),
            ],
            structural: vec![
                structural(r"^\d+[.)]\s+\S", ElementType::SystemRequirement),
                structural(r"^[a-z][.)]\s+\S", ElementType::SystemRequirement),
                structural(r"^[-*•▪◦‣]\s+\S", ElementType::SystemRequirement),
                structural(r"^scenario\s*\d+", ElementType::AcceptanceCriteria),
                structural(r"\bacceptance criteria\b", ElementType::AcceptanceCriteria),
                structural(r"^requirement\s*\d+", ElementType::SystemRequirement),
                structural(r"\bBR-\d+", ElementType::SystemRequirement),
                structural(r"\bAC-\d+", ElementType::AcceptanceCriteria),
            ],
            keyword_families: vec![
                KeywordFamily {
                    name: "validation".into(),
                    pattern: r"\b(verify|verifies|verified|check|checks|ensure|ensures|validate|validates|validated|test|tests)\b".into(),
                    element_type: ElementType::ValidationRequirement,
                    priority: Priority::High,
                    confidence: Confidence::Medium,
                },
                KeywordFamily {
                    name: "process".into(),
                    pattern: r"\b(process|processes|processed|workflow|workflows|step|steps|execute|executes|perform|performs)\b".into(),
                    element_type: ElementType::ProcessRequirement,
                    priority: Priority::Medium,
                    confidence: Confidence::Medium,
                },
                KeywordFamily {
                    name: "user_interaction".into(),
                    pattern: r"\b(users?|click|clicks|select|selects|enter|enters|submit|submits|allow|allows|enable|enables|support|supports)\b".into(),
                    element_type: ElementType::UserInteraction,
                    priority: Priority::Medium,
                    confidence: Confidence::Low,
                },
            ],
            fallback: FallbackRules::default(),
            rejection: RejectionRules::default(),
            technical_lines: strings(&[
                // ALL-CAPS header
                r"^[A-Z0-9][A-Z0-9\s\-_:./&]*$",
                // bare numeric sequence
                r"^[\d\s.,:;/\-+%]+$",
                // long opaque token
                r"^[A-Za-z0-9+/=_\-]{25,}$",
                // code-like line
                r"^(import|export|function|const|var|let|def|#include|package|using)\s",
                // URL
                r"^(https?://|www\.)\S+$",
                // brackets only
                r"^[\[\](){}<>\s]+$",
                // operators only
                r"^[=+\-*/<>!&|^%~:\s]+$",
            ]),
            scoring: ScoringRules::default(),
            element_complexity: ElementComplexityRules::default(),
            workflow: WorkflowVocabulary::default(),
        }
    }
}

impl Default for FallbackRules {
    fn default() -> Self {
        Self {
            business_keywords: strings(&[
                "customer", "user", "system", "business", "order", "account", "payment",
                "invoice", "product", "service", "report", "data", "process", "approval",
                "request", "transaction", "policy", "employee", "manager", "application",
                "record", "contract", "claim", "client", "vendor", "supplier",
            ]),
            action_keywords: strings(&[
                "must", "should", "will", "shall", "can", "need", "needs", "required",
                "verify", "ensure", "validate", "check", "allow", "provide", "create",
                "update", "delete", "display", "generate", "calculate", "send", "receive",
                "store", "approve", "reject", "notify",
            ]),
            unpunctuated_min_length: 50,
        }
    }
}

impl Default for RejectionRules {
    fn default() -> Self {
        Self {
            min_length: 20,
            vague_support: r"^(the system |system |it |we |the application )?(should |will |must |shall |to )?(also )?supports?\b".into(),
            vague_support_max_length: 60,
            page_reference: r"^(see |refer to |as described in |continued on )?(page|section|chapter|figure|table|appendix|slide)\s+[\divxlc]+(\.\d+)*\b".into(),
            business_verb: r"\b(must|should|shall|will|verify|ensure|validate|process|approve|submit|create|update|calculate|generate)\b".into(),
            numeric_sequence: r"^\d+(\s+\d+){2,}$".into(),
            reference_entries: strings(&[
                // table of contents leader dots
                r"\.{4,}\s*\d+\s*$",
                // bare reference-section titles
                r"^(table of contents|contents|index|glossary|bibliography|references|list of (figures|tables))\s*:?\s*$",
                // reference-section title followed by its page number
                r"^(table of contents|contents|index|glossary|bibliography|references|list of (figures|tables))(\s*\.{3,}\s*|\s+)\d+\s*$",
                // bibliography citation
                r"^\[\d+\]\s",
                r"\bet al\.",
                // index entry: term followed by page numbers
                r"^[A-Za-z][\w\s\-]{1,40},\s*\d+(,\s*\d+)+$",
            ]),
        }
    }
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            action_words: terms(&[
                ("must", 25),
                ("should", 20),
                ("will", 15),
                ("shall", 12),
                ("can", 8),
                ("need", 5),
                ("needs", 5),
            ]),
            specificity: terms(&[
                ("verify", 20),
                ("ensure", 20),
                ("validate", 20),
                ("create", 15),
                ("update", 15),
                ("delete", 15),
                ("display", 10),
                ("show", 10),
                ("support", 5),
            ]),
            terminal_punctuation_points: 15,
            long_line_length: 50,
            long_line_points: 10,
            medium_line_length: 30,
            medium_line_points: 5,
            context_pairs: vec![
                ["customer".into(), "can".into()],
                ["customer".into(), "must".into()],
                ["user".into(), "must".into()],
                ["user".into(), "can".into()],
                ["user".into(), "should".into()],
                ["business".into(), "process".into()],
                ["system".into(), "must".into()],
                ["system".into(), "shall".into()],
                ["order".into(), "must".into()],
            ],
            context_pair_points: 10,
            context_cap: 20,
            testability_bonus: 10,
            testability_action: strings(&["must", "should", "will", "shall"]),
            testability_outcome: strings(&["verify", "check", "ensure", "validate"]),
            penalties: vec![
                weighted("page_reference", r"\b(page|pg\.?)\s+\d+", -15),
                weighted("vague_support", r"^(the system |system |it )?(should |will |must )?supports?\b", -10),
                weighted("team_reference", r"\b(the )?(team|teams)\b", -10),
                weighted("numeric_sequence", r"\b\d+(\s+\d+){2,}\b", -15),
            ],
            bonuses: vec![
                weighted("given_when_then", r"(^(given|when|then)\b)|(\bgiven\b.*\bwhen\b.*\bthen\b)", 15),
                weighted(
                    "user_action",
                    r"\b(user|customer|admin|administrator)s?\s+(can|must|should|will|shall)?\s*(click|select|enter|submit|view|create|update|upload|download)\b",
                    10,
                ),
            ],
        }
    }
}

impl Default for ElementComplexityRules {
    fn default() -> Self {
        Self {
            conditional: strings(&["if", "when", "where", "unless"]),
            conjunction: strings(&["and", "or"]),
            looping: strings(&["each", "every", "repeat", "loop", "until", "while", "iterate"]),
            parallel: strings(&["parallel", "concurrent", "concurrently", "simultaneous", "simultaneously", "meanwhile"]),
            error: strings(&["error", "errors", "fail", "fails", "failure", "exception", "invalid", "reject", "rejected"]),
            simple_max: 2,
            moderate_max: 4,
        }
    }
}

impl Default for WorkflowVocabulary {
    fn default() -> Self {
        Self {
            decision_points: strings(&[
                "exclusive gateway", "parallel gateway", "inclusive gateway", "event-based gateway",
                "gateway", "gateways", "decision", "decisions", "xor", "branch", "branches",
                "fork", "forks", "join", "joins", "merge", "merges",
            ]),
            activities: strings(&[
                "subprocess", "subprocesses", "sub-process", "sub-processes", "user task",
                "service task", "manual task", "task", "tasks", "activity", "activities",
                "step", "steps", "procedure", "procedures",
            ]),
            events: strings(&[
                "start event", "end event", "intermediate event", "boundary event", "timer event",
                "message event", "event", "events", "trigger", "triggers", "signal", "signals",
                "timer", "timers",
            ]),
            connectors: strings(&[
                "sequence flow", "sequence flows", "message flow", "message flows", "data flow",
                "data flows", "conditional flow", "conditional flows", "default flow",
                "default flows", "association", "associations",
            ]),
            simple_max: 3,
            moderate_max: 10,
            complex_max: 20,
            detection_min_activities: 5,
            detection_min_connectors: 3,
        }
    }
}

impl PatternConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: PatternConfig = serde_yaml::from_str(content)
            .map_err(|e| ExtractionError::InvalidConfig(format!("pattern tables: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| ExtractionError::InvalidConfig(format!("pattern tables: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.version > PATTERN_TABLE_VERSION {
            return Err(ExtractionError::InvalidConfig(format!(
                "pattern table version {} is newer than supported version {}",
                self.version, PATTERN_TABLE_VERSION
            )));
        }
        if self.element_complexity.simple_max > self.element_complexity.moderate_max {
            return Err(ExtractionError::InvalidConfig(
                "element_complexity.simple_max exceeds moderate_max".into(),
            ));
        }
        let w = &self.workflow;
        if !(w.simple_max <= w.moderate_max && w.moderate_max <= w.complex_max) {
            return Err(ExtractionError::InvalidConfig(
                "workflow thresholds must be ascending".into(),
            ));
        }
        Ok(())
    }

    pub fn compile(&self) -> Result<CompiledPatterns> {
        CompiledPatterns::new(self)
    }
}

pub struct CompiledPrefix {
    pub prefix: String,
    pub element_type: ElementType,
    pub exclusive: bool,
}

pub struct CompiledFamily {
    pub name: String,
    pub regex: Regex,
    pub element_type: ElementType,
    pub priority: Priority,
    pub confidence: Confidence,
}

pub struct CompiledWeight {
    pub name: String,
    pub regex: Regex,
    pub points: i32,
}

/// Regex form of [`PatternConfig`]. All matching is case-insensitive.
pub struct CompiledPatterns {
    pub prefixes: Vec<CompiledPrefix>,
    pub structural: Vec<(Regex, ElementType)>,
    pub families: Vec<CompiledFamily>,
    pub business_keywords: Regex,
    pub action_keywords: Regex,
    pub unpunctuated_min_length: usize,
    pub min_length: usize,
    pub vague_support: Regex,
    pub vague_support_max_length: usize,
    pub page_reference: Regex,
    pub business_verb: Regex,
    pub numeric_sequence: Regex,
    pub reference_entries: Vec<Regex>,
    pub technical_lines: Vec<Regex>,
    pub action_words: Vec<CompiledWeight>,
    pub specificity: Vec<CompiledWeight>,
    pub context_pairs: Vec<(Regex, Regex)>,
    pub testability_action: Regex,
    pub testability_outcome: Regex,
    pub penalties: Vec<CompiledWeight>,
    pub bonuses: Vec<CompiledWeight>,
    pub complexity_signals: Vec<Regex>,
    pub decision_points: Regex,
    pub activities: Regex,
    pub events: Regex,
    pub connectors: Regex,
    pub scoring: ScoringRules,
    pub element_complexity: ElementComplexityRules,
    pub workflow: WorkflowVocabulary,
}

fn regex(category: &str, pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| ExtractionError::InvalidPattern {
            category: category.to_string(),
            pattern: pattern.to_string(),
            source,
        })
}

/// Whole-word alternation, longest term first so multi-word terms match once.
pub fn word_alternation(words: &[String]) -> String {
    let mut sorted: Vec<&String> = words.iter().filter(|w| !w.trim().is_empty()).collect();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    sorted.dedup();
    if sorted.is_empty() {
        // matches nothing
        return r"\b\B".to_string();
    }
    let escaped: Vec<String> = sorted.iter().map(|w| regex::escape(w.trim())).collect();
    format!(r"\b(?:{})\b", escaped.join("|"))
}

fn word_regex(category: &str, words: &[String]) -> Result<Regex> {
    regex(category, &word_alternation(words))
}

fn compile_terms(category: &str, items: &[WeightedTerm]) -> Result<Vec<CompiledWeight>> {
    items
        .iter()
        .map(|t| {
            Ok(CompiledWeight {
                name: t.term.clone(),
                regex: word_regex(category, std::slice::from_ref(&t.term))?,
                points: t.points,
            })
        })
        .collect()
}

fn compile_weighted(category: &str, items: &[WeightedPattern]) -> Result<Vec<CompiledWeight>> {
    items
        .iter()
        .map(|p| {
            Ok(CompiledWeight {
                name: p.name.clone(),
                regex: regex(category, &p.pattern)?,
                points: p.points,
            })
        })
        .collect()
}

impl CompiledPatterns {
    pub fn new(config: &PatternConfig) -> Result<Self> {
        config.validate()?;

        let prefixes = config
            .prefixes
            .iter()
            .map(|p| CompiledPrefix {
                prefix: p.prefix.to_lowercase(),
                element_type: p.element_type,
                exclusive: p.exclusive,
            })
            .collect();

        let structural = config
            .structural
            .iter()
            .map(|s| Ok((regex("structural", &s.pattern)?, s.element_type)))
            .collect::<Result<Vec<_>>>()?;

        let families = config
            .keyword_families
            .iter()
            .map(|f| {
                Ok(CompiledFamily {
                    name: f.name.clone(),
                    regex: regex(&f.name, &f.pattern)?,
                    element_type: f.element_type,
                    priority: f.priority,
                    confidence: f.confidence,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let rejection = &config.rejection;
        let reference_entries = rejection
            .reference_entries
            .iter()
            .map(|p| regex("reference_entries", p))
            .collect::<Result<Vec<_>>>()?;

        // Technical-line checks are structural, so they keep their case.
        let technical_lines = config
            .technical_lines
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|source| ExtractionError::InvalidPattern {
                    category: "technical_lines".into(),
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let scoring = &config.scoring;
        let context_pairs = scoring
            .context_pairs
            .iter()
            .map(|[a, b]| {
                Ok((
                    word_regex("context_pairs", std::slice::from_ref(a))?,
                    word_regex("context_pairs", std::slice::from_ref(b))?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let ec = &config.element_complexity;
        let complexity_signals = [&ec.conditional, &ec.conjunction, &ec.looping, &ec.parallel, &ec.error]
            .iter()
            .map(|words| word_regex("element_complexity", words))
            .collect::<Result<Vec<_>>>()?;

        let wf = &config.workflow;

        Ok(Self {
            prefixes,
            structural,
            families,
            business_keywords: word_regex("business_keywords", &config.fallback.business_keywords)?,
            action_keywords: word_regex("action_keywords", &config.fallback.action_keywords)?,
            unpunctuated_min_length: config.fallback.unpunctuated_min_length,
            min_length: rejection.min_length,
            vague_support: regex("vague_support", &rejection.vague_support)?,
            vague_support_max_length: rejection.vague_support_max_length,
            page_reference: regex("page_reference", &rejection.page_reference)?,
            business_verb: regex("business_verb", &rejection.business_verb)?,
            numeric_sequence: regex("numeric_sequence", &rejection.numeric_sequence)?,
            reference_entries,
            technical_lines,
            action_words: compile_terms("action_words", &scoring.action_words)?,
            specificity: compile_terms("specificity", &scoring.specificity)?,
            context_pairs,
            testability_action: word_regex("testability_action", &scoring.testability_action)?,
            testability_outcome: word_regex("testability_outcome", &scoring.testability_outcome)?,
            penalties: compile_weighted("penalties", &scoring.penalties)?,
            bonuses: compile_weighted("bonuses", &scoring.bonuses)?,
            complexity_signals,
            decision_points: word_regex("decision_points", &wf.decision_points)?,
            activities: word_regex("activities", &wf.activities)?,
            events: word_regex("events", &wf.events)?,
            connectors: word_regex("connectors", &wf.connectors)?,
            scoring: scoring.clone(),
            element_complexity: ec.clone(),
            workflow: wf.clone(),
        })
    }
}
