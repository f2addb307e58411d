//! Quality scoring, per-element tags and deduplication.

use std::collections::HashSet;

use tracing::trace;

use crate::classifier::Candidate;
use crate::complexity::ComplexityEstimator;
use crate::model::{BusinessElement, ComplexityTag, NormalizedLine};
use crate::patterns::{CompiledPatterns, CompiledWeight};

pub struct QualityScorer<'a> {
    patterns: &'a CompiledPatterns,
}

impl<'a> QualityScorer<'a> {
    pub fn new(patterns: &'a CompiledPatterns) -> Self {
        Self { patterns }
    }

    /// 0-100 score from action-word strength, verb specificity, completeness,
    /// business context and testability, adjusted by penalties and bonuses.
    pub fn score(&self, text: &str) -> u32 {
        let p = self.patterns;
        let rules = &p.scoring;
        let length = text.chars().count();

        let action = strongest(&p.action_words, text);
        let specificity = strongest(&p.specificity, text);

        let mut completeness = 0;
        if text.trim_end().ends_with(['.', '!', '?']) {
            completeness += rules.terminal_punctuation_points;
        }
        if length >= rules.long_line_length {
            completeness += rules.long_line_points;
        } else if length >= rules.medium_line_length {
            completeness += rules.medium_line_points;
        }

        let pairs = p
            .context_pairs
            .iter()
            .filter(|(a, b)| a.is_match(text) && b.is_match(text))
            .count() as i32;
        let context = (pairs * rules.context_pair_points).min(rules.context_cap);

        let testability = if self.is_testable(text) { rules.testability_bonus } else { 0 };

        let adjustments: i32 = p
            .penalties
            .iter()
            .chain(&p.bonuses)
            .filter(|w| w.regex.is_match(text))
            .inspect(|w| trace!(rule = %w.name, points = w.points, "score adjustment"))
            .map(|w| w.points)
            .sum();

        (action + specificity + completeness + context + testability + adjustments).clamp(0, 100) as u32
    }

    /// Has an action keyword (must/should/will/shall) or an outcome keyword
    /// (verify/check/ensure/validate).
    pub fn is_testable(&self, text: &str) -> bool {
        self.patterns.testability_action.is_match(text) || self.patterns.testability_outcome.is_match(text)
    }

    /// Starts at 1 and adds one per signal family present.
    pub fn complexity_tag(&self, text: &str) -> ComplexityTag {
        let level = 1 + self
            .patterns
            .complexity_signals
            .iter()
            .filter(|re| re.is_match(text))
            .count() as u32;
        let rules = &self.patterns.element_complexity;
        if level <= rules.simple_max {
            ComplexityTag::Simple
        } else if level <= rules.moderate_max {
            ComplexityTag::Moderate
        } else {
            ComplexityTag::Complex
        }
    }

    /// Finalizes a candidate into a scored element.
    pub fn build_element(&self, line: &NormalizedLine, candidate: &Candidate) -> BusinessElement {
        let text = line.text.trim();
        let workflow = ComplexityEstimator::new(self.patterns).analyze(text);
        BusinessElement {
            element_type: candidate.element_type,
            text: text.to_string(),
            line_number: line.line_number,
            section: line.section.clone(),
            priority: candidate.priority,
            confidence: candidate.confidence,
            complexity: self.complexity_tag(text),
            is_testable: self.is_testable(text),
            quality_score: self.score(text),
            cyclomatic_complexity: workflow.cyclomatic_complexity,
        }
    }
}

fn strongest(weights: &[CompiledWeight], text: &str) -> i32 {
    weights
        .iter()
        .filter(|w| w.regex.is_match(text))
        .map(|w| w.points)
        .max()
        .unwrap_or(0)
}

/// Lowercased, trimmed, whitespace-collapsed text used as the dedup key.
pub fn dedup_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Keeps the first element for each normalized text, in scan order.
pub fn deduplicate(elements: Vec<BusinessElement>) -> Vec<BusinessElement> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(elements.len());
    for element in elements {
        if seen.insert(dedup_key(&element.text)) {
            kept.push(element);
        }
    }
    kept
}
