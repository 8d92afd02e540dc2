//! trialparse Domain Layer
//!
//! Core model for the clinical-trial eligibility pipeline. Everything that
//! describes a batch of trials, the relations extracted from them, and the
//! text protocol spoken with the extraction engine lives here. Transport,
//! engine adapters and batch orchestration live in other crates.
//!
//! ## Key Concepts
//!
//! - **Study**: one trial's identifying data and raw eligibility text, plus
//!   the cached result of parsing it
//! - **StudyRegistry**: the ordered set of studies in one batch
//! - **EligibilityRelation**: one structured statement extracted from one
//!   criterion
//! - **Relation record protocol**: the tab/line-delimited text exchanged with
//!   the extraction engine
//!
//! ## Data Flow
//!
//! ```text
//! rows → StudyRegistry → Study::parse → CriteriaExtractor → text
//!                                     → RelationRecordCodec → relations
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod codec;
pub mod error;
pub mod registry;
pub mod relation;
pub mod study;
pub mod traits;

// Re-exports for convenience
pub use batch::BatchId;
pub use codec::{DecodeReport, RelationRecordCodec};
pub use error::{CodecError, DomainError, StudyError};
pub use registry::StudyRegistry;
pub use relation::{EligibilityRelation, EligibilityType, RelationMap};
pub use study::{ParseResult, Study, StudyCounts};
pub use traits::{CriteriaExtractor, ExtractorInput};
