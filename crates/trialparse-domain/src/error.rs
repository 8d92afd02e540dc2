//! Error types for the domain layer

use crate::study::MIN_ROW_FIELDS;
use thiserror::Error;

/// Errors raised while turning raw rows into studies
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Row has fewer fields than a study needs
    #[error("Malformed row {row}: {fields} fields, at least {} needed", MIN_ROW_FIELDS)]
    MalformedRow {
        /// Zero-based index of the row within the batch
        row: usize,
        /// Number of fields actually present
        fields: usize,
    },

    /// Row carries an empty trial identifier
    #[error("Malformed row {row}: empty trial identifier")]
    EmptyStudyId {
        /// Zero-based index of the row within the batch
        row: usize,
    },
}

impl DomainError {
    /// Index of the offending row
    pub fn row(&self) -> usize {
        match self {
            DomainError::MalformedRow { row, .. } | DomainError::EmptyStudyId { row } => *row,
        }
    }
}

/// Errors raised while decoding the relation record protocol
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The relation field of a 7-field record is not a serialized JSON object
    #[error("Malformed relation on line {line}: {reason}")]
    MalformedRelation {
        /// One-based line number within the extractor output
        line: usize,
        /// Deserializer message
        reason: String,
    },
}

/// Errors raised by a single study's parse
///
/// Cloneable because a failed parse is cached on the study and handed back
/// on every later call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StudyError {
    /// The extraction engine could not process the study
    #[error("Extraction failed for study {study_id}: {message}")]
    Extraction {
        /// Trial identifier
        study_id: String,
        /// Engine error message
        message: String,
    },

    /// The engine produced a record whose relation field does not decode
    #[error("Malformed relation output for study {study_id}: {source}")]
    MalformedRelation {
        /// Trial identifier
        study_id: String,
        /// Underlying codec failure
        #[source]
        source: CodecError,
    },
}

impl StudyError {
    /// Identifier of the study that failed
    pub fn study_id(&self) -> &str {
        match self {
            StudyError::Extraction { study_id, .. }
            | StudyError::MalformedRelation { study_id, .. } => study_id,
        }
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            StudyError::Extraction { .. } => "extraction",
            StudyError::MalformedRelation { .. } => "malformed_relation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_row_display() {
        let err = DomainError::MalformedRow { row: 3, fields: 2 };
        let msg = err.to_string();
        assert!(msg.contains("row 3"));
        assert!(msg.contains("2 fields"));
        assert!(msg.contains("at least 5"));
        assert_eq!(err.row(), 3);
    }

    #[test]
    fn test_study_error_accessors() {
        let err = StudyError::Extraction {
            study_id: "NCT001".to_string(),
            message: "engine crashed".to_string(),
        };
        assert_eq!(err.study_id(), "NCT001");
        assert_eq!(err.kind(), "extraction");

        let err = StudyError::MalformedRelation {
            study_id: "NCT002".to_string(),
            source: CodecError::MalformedRelation {
                line: 4,
                reason: "expected value".to_string(),
            },
        };
        assert_eq!(err.study_id(), "NCT002");
        assert_eq!(err.kind(), "malformed_relation");
        assert!(err.to_string().contains("line 4"));
    }
}
