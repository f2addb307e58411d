//! Business element classification.
//!
//! Every normalized line runs through four pattern tiers in a fixed order:
//! exact prefixes, structural markers, keyword families, then a generic
//! fallback. Lines failing the quality rejection rules never reach the tiers.

use tracing::trace;

use crate::error::{ExtractionError, Result};
use crate::model::{Confidence, ElementType, NormalizedLine, Priority};
use crate::patterns::CompiledPatterns;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Prefix,
    Structural,
    Keyword,
    Fallback,
}

/// A typed, prioritized guess for one line, before scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub element_type: ElementType,
    pub priority: Priority,
    pub confidence: Confidence,
    pub tier: Tier,
}

impl Candidate {
    fn new(element_type: ElementType, priority: Priority, confidence: Confidence, tier: Tier) -> Self {
        Self {
            element_type,
            priority,
            confidence,
            tier,
        }
    }
}

/// Why a line was refused before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooShort,
    VagueSupport,
    PageReference,
    NumericSequence,
    ReferenceEntry,
}

pub struct Classifier<'a> {
    patterns: &'a CompiledPatterns,
}

impl<'a> Classifier<'a> {
    pub fn new(patterns: &'a CompiledPatterns) -> Self {
        Self { patterns }
    }

    /// Candidates for `line`, highest precedence first. An empty result means
    /// the line is not a requirement.
    pub fn classify(&self, line: &NormalizedLine) -> Result<Vec<Candidate>> {
        let text = line.text.trim();
        if is_undecodable(text) {
            return Err(ExtractionError::UndecodableLine {
                line_number: line.line_number,
            });
        }
        if let Some(reason) = self.rejection(text) {
            trace!(line = line.line_number, ?reason, "rejected line");
            return Ok(Vec::new());
        }

        let lower = text.to_lowercase();
        let mut candidates = Vec::new();

        if let Some(prefix) = self.patterns.prefixes.iter().find(|p| lower.starts_with(&p.prefix)) {
            candidates.push(Candidate::new(prefix.element_type, Priority::High, Confidence::High, Tier::Prefix));
            if prefix.exclusive {
                return Ok(candidates);
            }
        }

        if let Some((_, element_type)) = self.patterns.structural.iter().find(|(re, _)| re.is_match(text)) {
            let priority = match element_type {
                ElementType::AcceptanceCriteria => Priority::High,
                _ => Priority::Medium,
            };
            candidates.push(Candidate::new(*element_type, priority, Confidence::Medium, Tier::Structural));
        }

        for family in &self.patterns.families {
            if family.regex.is_match(text) {
                trace!(line = line.line_number, family = %family.name, "keyword family matched");
                candidates.push(Candidate::new(
                    family.element_type,
                    family.priority,
                    family.confidence,
                    Tier::Keyword,
                ));
            }
        }

        if candidates.is_empty() && self.has_business_content(text) && self.is_extractable_requirement(text) {
            candidates.push(Candidate::new(
                ElementType::BusinessRequirement,
                Priority::Low,
                Confidence::Low,
                Tier::Fallback,
            ));
        }

        Ok(candidates)
    }

    /// The quality rejection rule that refuses `text`, if any.
    pub fn rejection(&self, text: &str) -> Option<Rejection> {
        let p = self.patterns;
        let length = text.chars().count();
        if length < p.min_length {
            return Some(Rejection::TooShort);
        }
        if length < p.vague_support_max_length && p.vague_support.is_match(text) {
            return Some(Rejection::VagueSupport);
        }
        if p.page_reference.is_match(text) && !p.business_verb.is_match(text) {
            return Some(Rejection::PageReference);
        }
        if p.numeric_sequence.is_match(text) {
            return Some(Rejection::NumericSequence);
        }
        if p.reference_entries.iter().any(|re| re.is_match(text)) {
            return Some(Rejection::ReferenceEntry);
        }
        None
    }

    /// Mentions a business noun and is longer than the minimum line length.
    pub fn has_business_content(&self, text: &str) -> bool {
        text.chars().count() > self.patterns.min_length && self.patterns.business_keywords.is_match(text)
    }

    /// Has an action or outcome keyword, reads like a complete statement,
    /// and is none of the known vague forms.
    pub fn is_extractable_requirement(&self, text: &str) -> bool {
        let p = self.patterns;
        let length = text.chars().count();
        let complete = text.ends_with(['.', '!', '?']) || length > p.unpunctuated_min_length;
        p.action_keywords.is_match(text)
            && complete
            && !matches!(
                self.rejection(text),
                Some(Rejection::VagueSupport | Rejection::PageReference | Rejection::NumericSequence)
            )
    }
}

/// Mostly replacement or control characters, e.g. a binary run that slipped
/// through extraction.
fn is_undecodable(text: &str) -> bool {
    let total = text.chars().count();
    let bad = text
        .chars()
        .filter(|c| *c == '\u{fffd}' || (c.is_control() && *c != '\t'))
        .count();
    total > 0 && bad * 2 > total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternConfig;

    fn classify(text: &str) -> Vec<Candidate> {
        let patterns = PatternConfig::default().compile().unwrap();
        let line = NormalizedLine {
            text: text.to_string(),
            line_number: 1,
            section: String::new(),
        };
        Classifier::new(&patterns).classify(&line).unwrap()
    }

    fn types(text: &str) -> Vec<ElementType> {
        classify(text).iter().map(|c| c.element_type).collect()
    }

    #[test]
    fn exclusive_prefix_stops_later_tiers() {
        let candidates = classify("Business Process: Order Intake");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].element_type, ElementType::BusinessProcess);
        assert_eq!(candidates[0].priority, Priority::High);
        assert_eq!(candidates[0].confidence, Confidence::High);
    }

    #[test]
    fn logic_prefix_keeps_keyword_candidates() {
        assert_eq!(
            types("When the payment fails the system must verify the card again."),
            vec![ElementType::BusinessLogic, ElementType::ValidationRequirement]
        );
    }

    #[test]
    fn numbered_line_is_system_requirement_first() {
        assert_eq!(
            types("1. The system must validate the order total."),
            vec![ElementType::SystemRequirement, ElementType::ValidationRequirement]
        );
        assert_eq!(
            types("Scenario 3: refund is issued to the original card"),
            vec![ElementType::AcceptanceCriteria]
        );
    }

    #[test]
    fn fallback_needs_both_gates() {
        assert_eq!(
            types("Invoices must carry the customer tax number."),
            vec![ElementType::BusinessRequirement]
        );
        // business noun but no action keyword
        assert!(types("The quarterly invoice archive in Zurich.").is_empty());
    }

    #[test]
    fn rejection_rules() {
        let patterns = PatternConfig::default().compile().unwrap();
        let classifier = Classifier::new(&patterns);
        assert_eq!(classifier.rejection("too short"), Some(Rejection::TooShort));
        assert_eq!(
            classifier.rejection("The system should support exports."),
            Some(Rejection::VagueSupport)
        );
        assert_eq!(classifier.rejection("See page 12 for the overview"), Some(Rejection::PageReference));
        assert_eq!(classifier.rejection("See page 12: managers must approve"), None);
        assert_eq!(classifier.rejection("10 20 30 40 50 60 70 80"), Some(Rejection::NumericSequence));
        assert_eq!(
            classifier.rejection("Order lifecycle overview ........ 14"),
            Some(Rejection::ReferenceEntry)
        );
        assert_eq!(
            classifier.rejection("Smith, J. et al. Requirements engineering handbook"),
            Some(Rejection::ReferenceEntry)
        );
    }

    #[test]
    fn reference_words_opening_a_sentence_are_kept() {
        let patterns = PatternConfig::default().compile().unwrap();
        let classifier = Classifier::new(&patterns);
        for text in [
            "Contents of the invoice must include the VAT rate.",
            "Index of orders must be rebuilt every night by the system.",
            "References to customer records must be encrypted at rest.",
            "Glossary terms must be approved by the business owner.",
            "Bibliography entries should cite the customer policy version.",
        ] {
            assert_eq!(classifier.rejection(text), None, "{}", text);
            assert!(!types(text).is_empty(), "{}", text);
        }
    }

    #[test]
    fn reference_section_entries_are_rejected() {
        let patterns = PatternConfig::default().compile().unwrap();
        let classifier = Classifier::new(&patterns);
        for text in [
            "Table of Contents ........ 3",
            "List of figures           12",
            "Bibliography .............. 48",
            "Glossary                    27",
        ] {
            assert_eq!(classifier.rejection(text), Some(Rejection::ReferenceEntry), "{}", text);
        }
    }

    fn support_line(length: usize) -> String {
        let head = "The system should support ";
        let text = format!("{}{}.", head, "x".repeat(length - head.len() - 1));
        assert_eq!(text.chars().count(), length);
        text
    }

    #[test]
    fn vague_support_cutoff_is_sixty_characters() {
        let patterns = PatternConfig::default().compile().unwrap();
        let classifier = Classifier::new(&patterns);
        assert_eq!(classifier.rejection(&support_line(59)), Some(Rejection::VagueSupport));
        assert_eq!(classifier.rejection(&support_line(60)), None);
        assert_eq!(classifier.rejection(&support_line(61)), None);
    }

    #[test]
    fn numeric_rule_needs_three_numbers() {
        let patterns = PatternConfig::default().compile().unwrap();
        let classifier = Classifier::new(&patterns);
        assert_eq!(classifier.rejection("1234567890 123456789"), None);
        assert_eq!(
            classifier.rejection("123456 1234567 12345"),
            Some(Rejection::NumericSequence)
        );
        assert_eq!(classifier.rejection("1 2 3"), Some(Rejection::TooShort));
    }

    #[test]
    fn long_support_statement_is_not_vague() {
        let text = "The system should support exporting every approved order to the finance ledger.";
        assert!(!types(text).is_empty());
    }

    #[test]
    fn undecodable_line_is_an_error() {
        let patterns = PatternConfig::default().compile().unwrap();
        let line = NormalizedLine {
            text: "\u{fffd}\u{fffd}\u{fffd}\u{fffd}\u{fffd}ab\u{fffd}\u{fffd}\u{fffd}\u{fffd}\u{fffd}".into(),
            line_number: 7,
            section: String::new(),
        };
        assert!(matches!(
            Classifier::new(&patterns).classify(&line),
            Err(ExtractionError::UndecodableLine { line_number: 7 })
        ));
    }
}
