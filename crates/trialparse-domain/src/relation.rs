//! Eligibility relations - the output records of the pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

/// Open-ended key/value structure describing one extracted relation
///
/// Keys are kept sorted, so serializing the same mapping twice always
/// produces the same text.
pub type RelationMap = serde_json::Map<String, serde_json::Value>;

/// Whether a criterion admits or excludes a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EligibilityType {
    /// Inclusion criterion
    Inclusion,
    /// Exclusion criterion
    Exclusion,
}

impl EligibilityType {
    /// Interpret the marker emitted by the extraction engine
    ///
    /// Returns `None` for markers the pipeline does not recognize; such
    /// relations are still passed through untouched.
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker.trim().to_ascii_lowercase().as_str() {
            "inclusion" => Some(EligibilityType::Inclusion),
            "exclusion" => Some(EligibilityType::Exclusion),
            _ => None,
        }
    }

    /// Canonical protocol marker
    pub fn as_str(&self) -> &'static str {
        match self {
            EligibilityType::Inclusion => "inclusion",
            EligibilityType::Exclusion => "exclusion",
        }
    }
}

impl fmt::Display for EligibilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured statement extracted from one eligibility criterion
///
/// Every relation traces back to exactly one study (`nct_id`) and one
/// criterion within it (`eligibility_type` + `criterion_index`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityRelation {
    /// Trial identifier
    pub nct_id: String,

    /// Inclusion/exclusion marker as emitted by the engine
    pub eligibility_type: String,

    /// Variable category the criterion constrains (e.g. "Age")
    pub variable_type: String,

    /// Criterion position within its section, kept as emitted
    pub criterion_index: String,

    /// Source text of the criterion
    pub criterion: String,

    /// Natural-language question derived from the criterion
    pub question: String,

    /// Extracted logical/semantic relation
    pub relation: RelationMap,
}

impl EligibilityRelation {
    /// Key identifying the criterion this relation came from
    pub fn criterion_key(&self) -> (&str, &str) {
        (&self.eligibility_type, &self.criterion_index)
    }

    /// Whether the engine managed to structure the criterion
    ///
    /// An empty mapping marks a criterion the engine saw but could not parse.
    pub fn has_relation(&self) -> bool {
        !self.relation.is_empty()
    }

    /// Parsed eligibility marker, if recognized
    pub fn eligibility(&self) -> Option<EligibilityType> {
        EligibilityType::from_marker(&self.eligibility_type)
    }
}
