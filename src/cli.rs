use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::OutputFormat;

#[derive(Parser)]
#[command(name = "reqscan")]
#[command(about = "🔍 reqscan - Business requirement extractor for office documents")]
#[command(long_about = "reqscan reads PDF, Word, Excel, PowerPoint and Visio documents and extracts
the business requirements they contain. Extraction is deterministic: the same
document always produces the same report.

QUICK START:
  reqscan extract --file requirements.docx                  # JSON report on stdout
  reqscan extract --file process.vsdx --format markdown     # Markdown report
  reqscan extract --dir ./specs --output reports            # One report per document

EXAMPLES:
  reqscan complexity \"If the order is approved then ship it, else notify the buyer\"
  reqscan flowchart --file onboarding.vsdx
  reqscan patterns --output patterns.yml
  reqscan config --validate")]
#[command(version = "1.0.0")]
pub struct Cli {
    #[arg(short, long, global = true, help = "Show debug logging on stderr")]
    pub verbose: bool,

    #[arg(short, long, global = true, conflicts_with = "verbose", help = "Only log errors")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Extract business requirements from documents")]
    #[command(long_about = "Extract business requirements from a single document or every supported
document in a directory.

INPUT OPTIONS (choose one):
  --file     Single document (.pdf, .docx, .xlsx, .pptx, .vsdx, .txt, .md)
  --dir      Directory; documents are processed concurrently and reported in path order

OUTPUT OPTIONS:
  --format   json (default), markdown or plain
  --output   File for a single document, directory for a batch run

EXAMPLES:
  reqscan extract --file brd.docx
  reqscan extract --file upload.bin --mime application/pdf
  reqscan extract --dir ./specs --parallel 4 --continue-on-error --output reports")]
    Extract {
        #[arg(short, long, help = "Document to extract from")]
        file: Option<PathBuf>,

        #[arg(short, long, help = "Directory of documents to extract from")]
        dir: Option<PathBuf>,

        #[arg(long, help = "MIME type of the document (inferred from the extension when absent)")]
        mime: Option<String>,

        #[arg(long, help = "Output format", value_enum)]
        format: Option<OutputFormat>,

        #[arg(short, long, help = "Save output to a file (or directory for --dir)")]
        output: Option<PathBuf>,

        #[arg(long, help = "Number of documents processed at once for --dir", default_value = "1")]
        parallel: usize,

        #[arg(long, help = "Continue processing on errors instead of stopping")]
        continue_on_error: bool,

        #[arg(long, help = "Skip unreadable or unsupported files during directory processing")]
        skip_invalid: bool,
    },

    #[command(about = "Estimate workflow complexity of text or a document")]
    #[command(long_about = "Count decision points, activities, events and connectors and report the
cyclomatic complexity CC = E - N + 2P.

EXAMPLES:
  reqscan complexity \"The gateway routes to a decision. One task follows.\"
  reqscan complexity --file process.pdf")]
    Complexity {
        #[arg(help = "Text to analyze (use quotes for multi-word text)")]
        text: Option<String>,

        #[arg(short, long, help = "Document to analyze")]
        file: Option<PathBuf>,
    },

    #[command(about = "Summarize the flowchart graph of a Visio drawing")]
    Flowchart {
        #[arg(short, long, help = "Visio drawing (.vsdx)")]
        file: PathBuf,
    },

    #[command(about = "Print the built-in pattern tables as YAML")]
    #[command(long_about = "Print the built-in pattern tables and thresholds as YAML. Edit the file and
point `patterns_file` in ~/.reqscan/config.yml at it to tune extraction.

EXAMPLES:
  reqscan patterns --output patterns.yml")]
    Patterns {
        #[arg(short, long, help = "Save the tables to a file")]
        output: Option<PathBuf>,
    },

    #[command(about = "Show and validate configuration")]
    #[command(long_about = "Inspect or update the configuration file.

CONFIGURATION FILE: ~/.reqscan/config.yml")]
    Config {
        #[arg(long, help = "Display current configuration values")]
        show: bool,

        #[arg(long, help = "Validate all configuration settings")]
        validate: bool,

        #[arg(long, help = "Use pattern tables from this YAML file")]
        set_patterns_file: Option<PathBuf>,

        #[arg(long, help = "Set the default output format", value_enum)]
        set_format: Option<OutputFormat>,
    },
}
