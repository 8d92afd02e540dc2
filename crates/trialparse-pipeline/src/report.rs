//! Batch results

use crate::metrics::BatchMetrics;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Serialize as DeriveSerialize;
use trialparse_domain::{BatchId, EligibilityRelation, StudyCounts, StudyError};

/// What happened to one study of a batch
#[derive(Debug, Clone, PartialEq)]
pub enum StudyOutcome {
    /// Parsed; its relations are part of the batch output
    Parsed {
        /// Trial identifier
        study_id: String,
        /// Yield of the study
        counts: StudyCounts,
    },
    /// Failed; contributes nothing but the failure
    Failed {
        /// Trial identifier
        study_id: String,
        /// Why the parse failed
        error: StudyError,
    },
}

impl StudyOutcome {
    /// Trial identifier
    pub fn study_id(&self) -> &str {
        match self {
            StudyOutcome::Parsed { study_id, .. } | StudyOutcome::Failed { study_id, .. } => {
                study_id
            }
        }
    }

    /// Whether the study parsed
    pub fn is_parsed(&self) -> bool {
        matches!(self, StudyOutcome::Parsed { .. })
    }

    /// Failure, if the study failed
    pub fn error(&self) -> Option<&StudyError> {
        match self {
            StudyOutcome::Failed { error, .. } => Some(error),
            StudyOutcome::Parsed { .. } => None,
        }
    }
}

impl Serialize for StudyOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StudyOutcome::Parsed { study_id, counts } => {
                let mut state = serializer.serialize_struct("StudyOutcome", 5)?;
                state.serialize_field("study_id", study_id)?;
                state.serialize_field("status", "parsed")?;
                state.serialize_field("criteria", &counts.criteria)?;
                state.serialize_field("parsed_criteria", &counts.parsed_criteria)?;
                state.serialize_field("relations", &counts.relations)?;
                state.end()
            }
            StudyOutcome::Failed { study_id, error } => {
                let mut state = serializer.serialize_struct("StudyOutcome", 4)?;
                state.serialize_field("study_id", study_id)?;
                state.serialize_field("status", "failed")?;
                state.serialize_field("kind", error.kind())?;
                state.serialize_field("message", &error.to_string())?;
                state.end()
            }
        }
    }
}

/// Result of running one batch
#[derive(Debug, Clone, DeriveSerialize)]
pub struct BatchReport {
    /// Identifier assigned when the batch started
    pub batch_id: BatchId,

    /// Relations of every parsed study, in registry order
    pub relations: Vec<EligibilityRelation>,

    /// Batch yield
    pub metrics: BatchMetrics,

    /// One entry per study, in registry order
    pub outcomes: Vec<StudyOutcome>,

    /// Wall-clock time of the batch (milliseconds)
    pub elapsed_ms: u64,
}

impl BatchReport {
    /// Outcomes of the studies that failed
    pub fn failures(&self) -> impl Iterator<Item = &StudyOutcome> {
        self.outcomes.iter().filter(|o| !o.is_parsed())
    }

    /// Whether every study parsed
    pub fn is_complete(&self) -> bool {
        self.metrics.studies_failed == 0
    }
}
