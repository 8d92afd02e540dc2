//! Error types for the pipeline

use thiserror::Error;
use trialparse_domain::{BatchId, DomainError, StudyError};

/// Errors that abort a whole batch
#[derive(Error, Debug)]
pub enum PipelineError {
    /// An input row could not become a study; nothing was parsed
    #[error("Ingest failed: {0}")]
    Ingest(#[from] DomainError),

    /// A study failed under the fail-fast policy
    #[error("Batch {batch_id} aborted: {source}")]
    Study {
        /// Batch that was aborted
        batch_id: BatchId,
        /// Failure of the lowest-indexed failing study
        #[source]
        source: StudyError,
    },

    /// The batch deadline passed before every study finished
    #[error(
        "Batch {batch_id} timed out after {timeout_secs}s: {} completed, {} abandoned",
        .completed.len(),
        .abandoned.len()
    )]
    Timeout {
        /// Batch that timed out
        batch_id: BatchId,
        /// Configured deadline
        timeout_secs: u64,
        /// Studies that finished before the deadline, in registry order
        completed: Vec<String>,
        /// Studies still running or never started, in registry order
        abandoned: Vec<String>,
    },

    /// Invalid pipeline configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A worker task was lost
    #[error("Worker error: {0}")]
    Worker(String),
}

impl PipelineError {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Ingest(_) => "malformed_row",
            PipelineError::Study { source, .. } => source.kind(),
            PipelineError::Timeout { .. } => "timeout",
            PipelineError::Config(_) | PipelineError::Worker(_) => "internal",
        }
    }

    /// Study responsible for the failure, if a single one is
    pub fn study_id(&self) -> Option<&str> {
        match self {
            PipelineError::Study { source, .. } => Some(source.study_id()),
            _ => None,
        }
    }

    /// Input row responsible for the failure, if any
    pub fn row_index(&self) -> Option<usize> {
        match self {
            PipelineError::Ingest(e) => Some(e.row()),
            _ => None,
        }
    }
}
