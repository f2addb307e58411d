use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::normalizer::NormalizerSettings;
use crate::patterns::PatternConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub extraction: NormalizerSettings,
    /// External pattern tables; built-in tables are used when unset.
    #[serde(default)]
    pub patterns_file: Option<PathBuf>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
    Plain,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Plain => write!(f, "plain"),
        }
    }
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".reqscan").join("config.yml"))
    }

    /// Loads `~/.reqscan/config.yml`, writing the defaults there on first use.
    pub async fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?).await
    }

    pub async fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path).await?;
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(config_path).await?;
            Ok(config)
        }
    }

    pub async fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?).await
    }

    pub async fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_yaml::to_string(self)?;
        fs::write(config_path, content).await?;

        Ok(())
    }

    pub fn set_patterns_file(&mut self, path: PathBuf) {
        self.patterns_file = Some(path);
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output.format = format;
    }

    pub async fn validate_all_settings(&self) -> Result<ValidationResult> {
        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        let extraction = &self.extraction;
        if extraction.min_line_length >= extraction.max_line_length {
            issues.push(format!(
                "Minimum line length ({}) must be below the maximum ({})",
                extraction.min_line_length, extraction.max_line_length
            ));
        }
        if extraction.min_line_length == 0 {
            warnings.push("Minimum line length is 0, so every non-empty line will be classified".to_string());
        }
        if extraction.heading_max_length == 0 {
            warnings.push("Heading length is 0, so only '#' headings will set sections".to_string());
        }

        if let Some(path) = &self.patterns_file {
            if !fs::try_exists(path).await.unwrap_or(false) {
                issues.push(format!("Pattern file does not exist: {}", path.display()));
            } else {
                match PatternConfig::load(path).and_then(|patterns| patterns.compile().map(|_| ())) {
                    Ok(()) => {}
                    Err(e) => issues.push(format!("Pattern file {} is invalid: {}", path.display(), e)),
                }
            }
        }

        Ok(ValidationResult {
            is_valid: issues.is_empty(),
            issues,
            warnings,
        })
    }
}

#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}
