//! Engine selection and settings

use crate::command::CommandEngine;
use crate::dictionary::Dictionaries;
use crate::http::{HttpEngine, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS};
use crate::{EngineError, MockEngine};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use trialparse_domain::traits::{CriteriaExtractor, ExtractorInput};

/// Which adapter reaches the extraction engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Local executable
    Command,
    /// Remote HTTP service
    Http,
}

/// Engine settings, usually the `[engine]` table of a config file
///
/// ```toml
/// [engine]
/// kind = "command"
/// program = "/usr/local/bin/ct-extract"
/// args = ["--format", "tsv"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Adapter to use
    pub kind: EngineKind,

    /// Executable for the command adapter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<PathBuf>,

    /// Extra arguments for the command adapter
    #[serde(default)]
    pub args: Vec<String>,

    /// Service URL for the HTTP adapter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Request timeout for the HTTP adapter (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per study for the HTTP adapter
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl EngineConfig {
    /// Command adapter settings
    pub fn command(program: impl Into<PathBuf>) -> Self {
        Self {
            kind: EngineKind::Command,
            program: Some(program.into()),
            args: Vec::new(),
            endpoint: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// HTTP adapter settings
    pub fn http(endpoint: impl Into<String>) -> Self {
        Self {
            kind: EngineKind::Http,
            program: None,
            args: Vec::new(),
            endpoint: Some(endpoint.into()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        match self.kind {
            EngineKind::Command if self.program.is_none() => {
                Err("command engine requires 'program'".to_string())
            }
            EngineKind::Http if self.endpoint.as_deref().map_or(true, str::is_empty) => {
                Err("http engine requires 'endpoint'".to_string())
            }
            EngineKind::Http if self.timeout_secs == 0 => {
                Err("timeout_secs must be greater than 0".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Build the configured adapter
    ///
    /// The command engine is handed the dictionary files on its command line.
    /// A remote HTTP service owns its own dictionaries, so `dictionaries` is
    /// not forwarded to it.
    pub fn build(&self, dictionaries: Arc<Dictionaries>) -> Result<Engine, EngineError> {
        self.validate().map_err(EngineError::Configuration)?;

        match self.kind {
            EngineKind::Command => {
                let program = self.program.clone().unwrap_or_default();
                Ok(Engine::Command(
                    CommandEngine::new(program, dictionaries).with_args(self.args.clone()),
                ))
            }
            EngineKind::Http => {
                let endpoint = self.endpoint.clone().unwrap_or_default();
                let engine = HttpEngine::new(endpoint, Duration::from_secs(self.timeout_secs))?
                    .with_max_retries(self.max_retries);
                Ok(Engine::Http(engine))
            }
        }
    }
}

/// Any of the available adapters
#[derive(Debug, Clone)]
pub enum Engine {
    /// Local executable
    Command(CommandEngine),
    /// Remote HTTP service
    Http(HttpEngine),
    /// Canned answers
    Mock(MockEngine),
}

impl CriteriaExtractor for Engine {
    type Error = EngineError;

    fn extract(&self, input: &ExtractorInput) -> Result<String, Self::Error> {
        match self {
            Engine::Command(engine) => engine.extract(input),
            Engine::Http(engine) => engine.extract(input),
            Engine::Mock(engine) => engine.extract(input),
        }
    }
}

impl From<MockEngine> for Engine {
    fn from(engine: MockEngine) -> Self {
        Engine::Mock(engine)
    }
}
