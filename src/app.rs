use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::analyzer::Analyzer;
use crate::cli::Commands;
use crate::complexity::WorkflowComplexity;
use crate::config::{Config, OutputFormat};
use crate::error::ExtractionError;
use crate::error_handler::{ErrorHandler, ProcessingError};
use crate::extractors::visio;
use crate::flowchart::FlowchartSummary;
use crate::patterns::PatternConfig;
use crate::report::ExtractionReport;

pub struct App {
    pub config: Config,
    analyzer: Arc<Analyzer>,
}

/// One document of a directory run.
#[derive(Debug)]
pub struct BatchEntry {
    pub path: PathBuf,
    pub report: ExtractionReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FlowchartPage {
    page: String,
    summary: FlowchartSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FlowchartOutput {
    file_name: String,
    pages: Vec<FlowchartPage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    combined: Option<FlowchartSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

impl App {
    pub async fn new() -> Result<Self> {
        let config = Config::load().await?;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let analyzer = Analyzer::from_config(&config).context("Failed to load pattern tables")?;
        Ok(Self {
            config,
            analyzer: Arc::new(analyzer),
        })
    }

    pub async fn run_command(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Extract {
                file,
                dir,
                mime,
                format,
                output,
                parallel,
                continue_on_error,
                skip_invalid,
            } => {
                let format = format.unwrap_or(self.config.output.format);

                if let Some(dir_path) = dir {
                    let mut handler = ErrorHandler::new(continue_on_error, skip_invalid);
                    let result = self.extract_directory(&dir_path, parallel, &mut handler).await;
                    let summary = handler.get_summary();
                    if !summary.is_empty() {
                        eprintln!("\n{}", summary);
                    }
                    let entries = result?;
                    return self.write_batch(&dir_path, &entries, format, output.as_deref()).await;
                }

                let file_path = file.ok_or_else(|| anyhow::anyhow!("No input provided. Use --file or --dir"))?;
                let report = self.extract_file(&file_path, mime.as_deref()).await?;
                let content = render(&report, format)?;
                emit(&content, output.as_deref()).await?;
            }

            Commands::Complexity { text, file } => {
                let workflow = match (text, file) {
                    (Some(text), _) => self.analyzer.workflow_complexity(&text),
                    (None, Some(file_path)) => self.document_complexity(&file_path).await?,
                    (None, None) => return Err(anyhow::anyhow!("No input provided. Use TEXT or --file")),
                };
                println!("{}", serde_json::to_string_pretty(&workflow)?);
            }

            Commands::Flowchart { file } => {
                let output = self.flowchart(&file).await?;
                println!("{}", serde_json::to_string_pretty(&output)?);
            }

            Commands::Patterns { output } => {
                let yaml = PatternConfig::default().to_yaml()?;
                emit(&yaml, output.as_deref()).await?;
            }

            Commands::Config {
                show,
                validate,
                set_patterns_file,
                set_format,
            } => {
                let mut changed = false;
                if let Some(path) = set_patterns_file {
                    self.config.set_patterns_file(path);
                    changed = true;
                }
                if let Some(format) = set_format {
                    self.config.set_output_format(format);
                    changed = true;
                }
                if changed {
                    self.config.save().await?;
                    println!("✅ Configuration saved to {}", Config::config_path()?.display());
                }

                if validate {
                    self.validate_config().await?;
                }
                if show || (!validate && !changed) {
                    self.show_config()?;
                }
            }
        }

        Ok(())
    }

    /// Reads and extracts a single document.
    pub async fn extract_file(&self, path: &Path, mime_type: Option<&str>) -> Result<ExtractionReport> {
        if !path.exists() {
            return Err(anyhow::anyhow!("File does not exist: {:?}", path));
        }
        let document = self
            .analyzer
            .processor()
            .read_document(path, mime_type)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let analyzer = Arc::clone(&self.analyzer);
        let report = tokio::task::spawn_blocking(move || analyzer.analyze_document(&document))
            .await?
            .with_context(|| format!("Failed to extract requirements from {}", path.display()))?;
        Ok(report)
    }

    /// Extracts every supported document under `dir_path`, at most `parallel`
    /// at a time. Entries come back in sorted path order whatever order the
    /// documents finish in.
    pub async fn extract_directory(
        &self,
        dir_path: &Path,
        parallel: usize,
        handler: &mut ErrorHandler,
    ) -> Result<Vec<BatchEntry>> {
        if !dir_path.exists() || !dir_path.is_dir() {
            return Err(anyhow::anyhow!("Directory does not exist: {:?}", dir_path));
        }

        let processor = self.analyzer.processor();
        let mut files: Vec<PathBuf> = WalkDir::new(dir_path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && processor.is_supported_format(e.path()))
            .map(|e| e.into_path())
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(anyhow::anyhow!("No supported documents found in {}", dir_path.display()));
        }
        info!(dir = %dir_path.display(), files = files.len(), parallel, "starting batch extraction");

        let semaphore = Arc::new(Semaphore::new(parallel.max(1)));
        let mut tasks = Vec::with_capacity(files.len());
        for path in &files {
            let semaphore = Arc::clone(&semaphore);
            let analyzer = Arc::clone(&self.analyzer);
            let path = path.clone();
            tasks.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let document = analyzer.processor().read_document(&path, None).await?;
                let report = tokio::task::spawn_blocking(move || analyzer.analyze_document(&document))
                    .await
                    .map_err(|e| ExtractionError::Io(std::io::Error::other(e.to_string())))??;
                Ok::<_, ExtractionError>(report)
            }));
        }

        let entries = drain_batch(files.into_iter().zip(tasks).collect(), handler).await?;
        info!(processed = entries.len(), "batch extraction complete");
        Ok(entries)
    }

    async fn write_batch(
        &self,
        root: &Path,
        entries: &[BatchEntry],
        format: OutputFormat,
        output: Option<&Path>,
    ) -> Result<()> {
        let Some(dir) = output else {
            let content = match format {
                OutputFormat::Json => {
                    let reports: Vec<&ExtractionReport> = entries.iter().map(|e| &e.report).collect();
                    serde_json::to_string_pretty(&reports)?
                }
                _ => entries
                    .iter()
                    .map(|e| render(&e.report, format))
                    .collect::<Result<Vec<_>>>()?
                    .join("\n---\n\n"),
            };
            println!("{}", content);
            return Ok(());
        };

        fs::create_dir_all(dir).await?;
        for entry in entries {
            let relative = entry.path.strip_prefix(root).unwrap_or(&entry.path);
            let target = dir.join(batch_file_name(relative, format));
            fs::write(&target, render(&entry.report, format)?).await?;
            info!(file = %target.display(), "report written");
        }
        eprintln!("📁 {} reports written to {}", entries.len(), dir.display());
        Ok(())
    }

    async fn document_complexity(&self, path: &Path) -> Result<WorkflowComplexity> {
        let document = self.analyzer.processor().read_document(path, None).await?;
        let (_, content) = self.analyzer.processor().extract(&document)?;
        let lines = self.analyzer.normalize(&content.raw_text);
        let text = lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n");
        Ok(self.analyzer.workflow_complexity(&text))
    }

    async fn flowchart(&self, path: &Path) -> Result<FlowchartOutput> {
        let document = self.analyzer.processor().read_document(path, None).await?;
        let (pages, failures) = visio::page_graphs(&document.bytes, &document.file_name)?;
        if pages.is_empty() {
            warn!(file = %document.file_name, "drawing has no pages");
        }

        let pages: Vec<FlowchartPage> = pages
            .iter()
            .map(|p| FlowchartPage {
                page: p.page.clone(),
                summary: p.graph.summary(),
            })
            .collect();
        let combined = if pages.is_empty() {
            None
        } else {
            Some(FlowchartSummary::combine(pages.iter().map(|p| &p.summary)))
        };

        Ok(FlowchartOutput {
            file_name: document.file_name,
            pages,
            combined,
            warnings: failures.iter().map(|f| f.to_string()).collect(),
        })
    }

    async fn validate_config(&self) -> Result<()> {
        let result = self.config.validate_all_settings().await?;
        for warning in &result.warnings {
            println!("⚠️  {}", warning);
        }
        if result.is_valid {
            println!("✅ Configuration is valid");
            Ok(())
        } else {
            for issue in &result.issues {
                println!("❌ {}", issue);
            }
            Err(anyhow::anyhow!("Configuration has {} issue(s)", result.issues.len()))
        }
    }

    fn show_config(&self) -> Result<()> {
        println!("🔧 Current reqscan Configuration");
        println!("===============================");
        println!("📁 File: {}", Config::config_path()?.display());
        println!("\n📝 Extraction Settings:");
        println!("  • Minimum line length: {}", self.config.extraction.min_line_length);
        println!("  • Maximum line length: {}", self.config.extraction.max_line_length);
        println!("  • Heading length: {}", self.config.extraction.heading_max_length);
        match &self.config.patterns_file {
            Some(path) => println!("  • Pattern tables: {}", path.display()),
            None => println!("  • Pattern tables: built-in"),
        }
        println!("\n📄 Output format: {}", self.config.output.format);
        Ok(())
    }
}

pub fn render(report: &ExtractionReport, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => report.to_json()?,
        OutputFormat::Markdown => report.render_markdown()?,
        OutputFormat::Plain => report.render_plain(),
    })
}

async fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("📁 Output saved to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// `specs/a.docx` becomes `specs_a.docx.json`, so documents sharing a stem
/// in different folders never overwrite each other.
fn batch_file_name(path: &Path, format: OutputFormat) -> String {
    let extension = match format {
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "md",
        OutputFormat::Plain => "txt",
    };
    let flattened: String = path
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("_");
    format!("{}.{}", flattened, extension)
}

type BatchTask = (PathBuf, JoinHandle<std::result::Result<ExtractionReport, ExtractionError>>);

/// Awaits batch tasks in path order. A task that panicked or was cancelled
/// counts as a failed document. When the handler stops the batch, every task
/// not yet awaited is aborted.
async fn drain_batch(tasks: Vec<BatchTask>, handler: &mut ErrorHandler) -> Result<Vec<BatchEntry>> {
    let mut entries = Vec::new();
    let mut pending = tasks.into_iter();
    while let Some((path, task)) = pending.next() {
        let outcome = task.await.unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "extraction task did not complete");
            Err(ExtractionError::Io(std::io::Error::other(e.to_string())))
        });
        match outcome {
            Ok(report) => {
                for warning in &report.warnings {
                    handler.add_warning(format!("{}: {}", path.display(), warning));
                }
                entries.push(BatchEntry { path, report });
            }
            Err(e) => {
                if !handler.handle_error(ProcessingError::from_extraction(path.clone(), &e)) {
                    for (_, task) in pending.by_ref() {
                        task.abort();
                    }
                    return Err(anyhow::Error::new(e).context(format!("Stopped at {}", path.display())));
                }
            }
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    async fn crash() -> std::result::Result<ExtractionReport, ExtractionError> {
        panic!("reader crashed")
    }

    fn panicking_task() -> JoinHandle<std::result::Result<ExtractionReport, ExtractionError>> {
        tokio::spawn(crash())
    }

    #[tokio::test]
    async fn crashed_task_stops_batch_and_aborts_the_rest() {
        let (guard, released) = oneshot::channel::<()>();
        let stuck = tokio::spawn(async move {
            let _guard = guard;
            std::future::pending::<()>().await;
            Err(ExtractionError::InvalidConfig("unreachable".into()))
        });

        let mut handler = ErrorHandler::new(false, false);
        let tasks = vec![
            (PathBuf::from("a.docx"), panicking_task()),
            (PathBuf::from("b.docx"), stuck),
        ];
        let result = drain_batch(tasks, &mut handler).await;

        assert!(result.unwrap_err().to_string().contains("Stopped at a.docx"));
        assert_eq!(handler.get_summary().total_errors, 1);
        // the aborted task drops its sender
        let dropped = tokio::time::timeout(Duration::from_secs(5), released).await;
        assert!(matches!(dropped, Ok(Err(_))));
    }

    #[tokio::test]
    async fn crashed_task_is_recorded_when_continuing() {
        let report = Analyzer::new().unwrap().analyze_text("", "b.txt", "Text");
        let done = tokio::spawn(async move { Ok(report) });

        let mut handler = ErrorHandler::new(true, false);
        let tasks = vec![
            (PathBuf::from("a.docx"), panicking_task()),
            (PathBuf::from("b.txt"), done),
        ];
        let entries = drain_batch(tasks, &mut handler).await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, PathBuf::from("b.txt"));
        assert_eq!(handler.get_summary().total_errors, 1);
    }

    #[test]
    fn batch_names_keep_folders_apart() {
        assert_eq!(
            batch_file_name(Path::new("specs/a.docx"), OutputFormat::Json),
            "specs_a.docx.json"
        );
        assert_eq!(
            batch_file_name(Path::new("./b/a.docx"), OutputFormat::Markdown),
            "b_a.docx.md"
        );
    }
}
