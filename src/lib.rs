//! Deterministic extraction of business requirements from office documents.
//!
//! [`Analyzer::analyze_document`] takes the bytes of a PDF, Word, Excel,
//! PowerPoint or Visio file and returns an [`ExtractionReport`]: classified,
//! scored and deduplicated requirement elements plus workflow complexity and,
//! for drawings, a flowchart summary.

pub mod analyzer;
pub mod app;
pub mod classifier;
pub mod cli;
pub mod complexity;
pub mod config;
pub mod document_processor;
pub mod error;
pub mod error_handler;
pub mod extractors;
pub mod flowchart;
pub mod model;
pub mod normalizer;
pub mod patterns;
pub mod report;
pub mod scoring;

pub use analyzer::Analyzer;
pub use document_processor::{ContainerKind, DocumentProcessor, RawDocument};
pub use error::{ExtractionError, PartFailure, Result};
pub use model::{BusinessElement, Confidence, ElementType, Priority};
pub use report::ExtractionReport;
