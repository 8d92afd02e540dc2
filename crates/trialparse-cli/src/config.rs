//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use trialparse_engine::{EngineConfig, ResourceConfig};
use trialparse_pipeline::PipelineConfig;

/// CLI configuration.
///
/// `resources` and `engine` are only needed by `parse`; `decode` works
/// without any configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Dictionary locations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceConfig>,

    /// Extraction engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineConfig>,

    /// Batch policy
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Log filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Metrics only
    Summary,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".trialparse").join("config.toml"))
    }

    /// Load configuration from `explicit`, or from the default path.
    ///
    /// A missing file at the default path yields the default configuration;
    /// a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a file.
    ///
    /// Relative dictionary paths are resolved against the file's directory.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config: Config = toml::from_str(&contents)?;

        if let Some(base) = path.parent() {
            config.resources = config.resources.take().map(|r| r.resolve(base));
        }

        config.pipeline.validate().map_err(CliError::Config)?;
        Ok(config)
    }

    /// Engine settings, required by `parse`.
    pub fn engine(&self) -> Result<&EngineConfig> {
        self.engine
            .as_ref()
            .ok_or_else(|| CliError::Config("No [engine] section in configuration".into()))
    }

    /// Dictionary locations, required by `parse`.
    pub fn resources(&self) -> Result<&ResourceConfig> {
        self.resources
            .as_ref()
            .ok_or_else(|| CliError::Config("No [resources] section in configuration".into()))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            log_level: default_log_level(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_log_level() -> String {
    "warn".to_string()
}
