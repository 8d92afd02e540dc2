//! Error types for the CLI application.

use thiserror::Error;
use trialparse_domain::CodecError;
use trialparse_engine::EngineError;
use trialparse_pipeline::PipelineError;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Engine or dictionary setup failed
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Batch failed
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Protocol dump did not decode
    #[error("Decode error: {0}")]
    Codec(#[from] CodecError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
