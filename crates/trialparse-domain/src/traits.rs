//! Trait definitions for external interactions
//!
//! The extraction engine is an external collaborator. This module defines the
//! boundary; concrete adapters live in `trialparse-engine`.

use serde::{Deserialize, Serialize};

/// Everything the engine receives about one study
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorInput {
    /// Trial identifier
    pub nct_id: String,

    /// Trial title
    pub title: String,

    /// Condition segments in source order
    pub conditions: Vec<String>,

    /// Inclusion and exclusion criteria, concatenated and not yet split
    pub eligibility_criteria: String,
}

/// Trait for the rule-based eligibility extraction engine
///
/// Implemented by the infrastructure layer (trialparse-engine). The call is
/// synchronous; async callers move it onto a blocking worker.
pub trait CriteriaExtractor {
    /// Error type for extraction operations
    type Error;

    /// Extract relations for one study, answering in the relation record
    /// protocol (see [`crate::codec`])
    fn extract(&self, input: &ExtractorInput) -> Result<String, Self::Error>;
}
