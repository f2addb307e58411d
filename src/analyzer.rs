//! The extraction pipeline: bytes to [`ExtractionReport`].
//!
//! Stages run strictly in order (read container, normalize, classify, score,
//! deduplicate) and nothing is cached between calls, so identical input
//! always yields an identical report.

use tracing::{debug, info};

use crate::classifier::Classifier;
use crate::complexity::{ComplexityEstimator, WorkflowComplexity};
use crate::config::Config;
use crate::document_processor::{ContainerKind, DocumentProcessor, RawDocument};
use crate::error::Result;
use crate::model::{BusinessElement, NormalizedLine};
use crate::normalizer::{Normalizer, NormalizerSettings};
use crate::patterns::{CompiledPatterns, PatternConfig};
use crate::report::ExtractionReport;
use crate::scoring::{deduplicate, QualityScorer};

pub struct Analyzer {
    patterns: CompiledPatterns,
    settings: NormalizerSettings,
    processor: DocumentProcessor,
}

impl Analyzer {
    /// Analyzer with the built-in pattern tables and default line limits.
    pub fn new() -> Result<Self> {
        Self::with_patterns(&PatternConfig::default())
    }

    pub fn with_patterns(patterns: &PatternConfig) -> Result<Self> {
        Ok(Self {
            patterns: patterns.compile()?,
            settings: NormalizerSettings::default(),
            processor: DocumentProcessor::new(),
        })
    }

    pub fn with_settings(mut self, settings: NormalizerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Analyzer configured from the user's config file, loading external
    /// pattern tables when one is named.
    pub fn from_config(config: &Config) -> Result<Self> {
        let patterns = match &config.patterns_file {
            Some(path) => PatternConfig::load(path)?,
            None => PatternConfig::default(),
        };
        Ok(Self::with_patterns(&patterns)?.with_settings(config.extraction.clone()))
    }

    pub fn processor(&self) -> &DocumentProcessor {
        &self.processor
    }

    pub fn analyze_document(&self, document: &RawDocument) -> Result<ExtractionReport> {
        let (kind, content) = self.processor.extract(document)?;

        let mut report = self.analyze_text(&content.raw_text, &document.file_name, kind.label());
        report.flowchart = content.flowchart;
        if let Some(fallback) = &content.fallback {
            report
                .warnings
                .push(format!("Container could not be opened; text recovered via {}", fallback));
        }
        report.warnings.extend(content.failures.iter().map(|f| f.to_string()));

        if kind == ContainerKind::Image {
            report.manual_review = Some(format!(
                "'{}' is an image and text recognition is not performed; review its content manually.",
                document.file_name
            ));
        }

        info!(
            file = %document.file_name,
            format = %kind,
            count = report.count,
            warnings = report.warnings.len(),
            "extraction complete"
        );
        Ok(report)
    }

    /// Runs everything after the container reader over already extracted text.
    pub fn analyze_text(&self, raw_text: &str, file_name: &str, format: &str) -> ExtractionReport {
        let lines = self.normalize(raw_text);
        let elements = self.elements_from_lines(&lines);
        let normalized_text = lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n");
        let workflow = self.workflow_complexity(&normalized_text);

        let mut report = ExtractionReport::new(file_name, format, elements, raw_text.chars().count(), workflow);
        if report.count == 0 {
            report.manual_review = Some(format!(
                "No business requirements could be extracted from '{}'; manual review is required.",
                file_name
            ));
        }
        report
    }

    pub fn normalize(&self, raw_text: &str) -> Vec<NormalizedLine> {
        Normalizer::new(&self.settings, &self.patterns).normalize(raw_text)
    }

    /// Classified, scored and deduplicated elements, in line order.
    pub fn elements_from_lines(&self, lines: &[NormalizedLine]) -> Vec<BusinessElement> {
        let classifier = Classifier::new(&self.patterns);
        let scorer = QualityScorer::new(&self.patterns);

        let mut elements = Vec::new();
        for line in lines {
            match classifier.classify(line) {
                Ok(candidates) => {
                    elements.extend(candidates.iter().map(|c| scorer.build_element(line, c)));
                }
                Err(e) => debug!(error = %e, "dropping line"),
            }
        }
        let candidates = elements.len();
        let elements = deduplicate(elements);
        debug!(lines = lines.len(), candidates, kept = elements.len(), "classified lines");
        elements
    }

    pub fn workflow_complexity(&self, text: &str) -> WorkflowComplexity {
        ComplexityEstimator::new(&self.patterns).analyze(text)
    }
}
