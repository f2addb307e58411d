//! Turns extracted raw text into an ordered sequence of section-tagged lines.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::NormalizedLine;
use crate::patterns::CompiledPatterns;

static RE_MARKDOWN_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}\s+(\S.*)$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerSettings {
    pub min_line_length: usize,
    pub max_line_length: usize,
    /// ALL-CAPS lines shorter than this are treated as headings.
    pub heading_max_length: usize,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            min_line_length: 20,
            max_line_length: 500,
            heading_max_length: 15,
        }
    }
}

pub struct Normalizer<'a> {
    settings: &'a NormalizerSettings,
    patterns: &'a CompiledPatterns,
}

impl<'a> Normalizer<'a> {
    pub fn new(settings: &'a NormalizerSettings, patterns: &'a CompiledPatterns) -> Self {
        Self { settings, patterns }
    }

    pub fn normalize(&self, raw_text: &str) -> Vec<NormalizedLine> {
        let mut lines = Vec::new();
        let mut current_section = String::new();

        for (index, raw_line) in raw_text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(section) = self.heading_text(line) {
                current_section = section;
                continue;
            }

            let length = line.chars().count();
            if length < self.settings.min_line_length || length > self.settings.max_line_length {
                continue;
            }

            if self.is_technical_line(line) {
                continue;
            }

            lines.push(NormalizedLine {
                text: line.to_string(),
                line_number: index + 1,
                section: current_section.clone(),
            });
        }

        lines
    }

    /// Returns the section title when `line` is a heading.
    pub fn heading_text(&self, line: &str) -> Option<String> {
        if let Some(caps) = RE_MARKDOWN_HEADING.captures(line) {
            return Some(caps[1].trim().to_string());
        }
        if line.chars().count() < self.settings.heading_max_length && is_all_caps(line) {
            return Some(line.to_string());
        }
        None
    }

    pub fn is_technical_line(&self, line: &str) -> bool {
        self.patterns.technical_lines.iter().any(|re| re.is_match(line))
    }
}

fn is_all_caps(line: &str) -> bool {
    let mut letters = line.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(|c| !c.is_lowercase())
}
