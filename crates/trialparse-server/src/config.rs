//! Configuration file parsing for the server.
//!
//! Loads the bind address, dictionary locations, engine settings and
//! pipeline policy from a TOML file. Relative dictionary paths are resolved
//! against the directory holding the config file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use trialparse_engine::{EngineConfig, ResourceConfig};
use trialparse_pipeline::PipelineConfig;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A section holds invalid settings
    #[error("Invalid [{section}] configuration: {message}")]
    Invalid {
        /// Offending section
        section: &'static str,
        /// What is wrong with it
        message: String,
    },
}

/// Server configuration loaded from TOML
///
/// ```toml
/// bind_address = "127.0.0.1"
/// bind_port = 8080
///
/// [resources]
/// variable_file = "resources/variables.tsv"
/// unit_file = "resources/units.tsv"
///
/// [engine]
/// kind = "command"
/// program = "/usr/local/bin/ct-extract"
///
/// [pipeline]
/// error_policy = "fail-fast"
/// max_concurrency = 4
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    pub bind_port: u16,

    /// Default log filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dictionary locations
    pub resources: ResourceConfig,

    /// Extraction engine
    pub engine: EngineConfig,

    /// Batch policy
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: ServerConfig = toml::from_str(&contents)?;

        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        config.resources = config.resources.resolve(&base);

        config.validate()?;
        Ok(config)
    }

    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine
            .validate()
            .map_err(|message| ConfigError::Invalid {
                section: "engine",
                message,
            })?;
        self.pipeline
            .validate()
            .map_err(|message| ConfigError::Invalid {
                section: "pipeline",
                message,
            })?;
        Ok(())
    }

    /// Create a default configuration for testing
    pub fn default_test_config() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
            log_level: default_log_level(),
            resources: ResourceConfig {
                variable_file: PathBuf::from("resources/variables.tsv"),
                unit_file: PathBuf::from("resources/units.tsv"),
            },
            engine: EngineConfig::command("ct-extract"),
            pipeline: PipelineConfig::default(),
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}
