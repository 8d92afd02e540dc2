//! Yield metrics for a batch

use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use trialparse_domain::StudyCounts;

/// Counters summed over the studies of a batch
///
/// Aggregation is additive: the metrics of a batch equal the field-wise sum of
/// the metrics of its studies taken one at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchMetrics {
    /// Studies taken into the batch, parsed or not
    pub studies_ingested: usize,

    /// Studies whose parse failed
    pub studies_failed: usize,

    /// Distinct criteria seen across all studies
    pub criteria_extracted: usize,

    /// Criteria with at least one relation
    pub criteria_parsed: usize,

    /// Relations decoded
    pub relations_found: usize,
}

impl BatchMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Metrics of a single successfully parsed study
    pub fn from_counts(counts: StudyCounts) -> Self {
        let mut metrics = Self::new();
        metrics.record_study(counts);
        metrics
    }

    /// Record a parsed study
    pub fn record_study(&mut self, counts: StudyCounts) {
        self.studies_ingested += 1;
        self.criteria_extracted += counts.criteria;
        self.criteria_parsed += counts.parsed_criteria;
        self.relations_found += counts.relations;
    }

    /// Record a study whose parse failed
    ///
    /// The study still counts as ingested.
    pub fn record_failure(&mut self) {
        self.studies_ingested += 1;
        self.studies_failed += 1;
    }

    /// Relations per extracted criterion, as a percentage
    ///
    /// `0.0` when no criteria were extracted.
    pub fn relations_per_criterion_percent(&self) -> f64 {
        if self.criteria_extracted == 0 {
            return 0.0;
        }
        100.0 * self.relations_found as f64 / self.criteria_extracted as f64
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let lines = [
            "Batch Metrics Summary".to_string(),
            "=====================".to_string(),
            format!("Ingested studies: {}", self.studies_ingested),
            format!("Failed studies: {}", self.studies_failed),
            format!("Extracted criteria: {}", self.criteria_extracted),
            format!("Parsed criteria: {}", self.criteria_parsed),
            format!("Relations: {}", self.relations_found),
            format!(
                "Relations per criterion: {:.1}%",
                self.relations_per_criterion_percent()
            ),
        ];
        lines.join("\n")
    }
}

impl fmt::Display for BatchMetrics {
    /// One-line summary used in batch log lines
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ingested studies: {}, Extracted criteria: {}, Parsed criteria: {}, Relations: {}, Relations per criteria: {:.1}%",
            self.studies_ingested,
            self.criteria_extracted,
            self.criteria_parsed,
            self.relations_found,
            self.relations_per_criterion_percent()
        )
    }
}

impl Add for BatchMetrics {
    type Output = BatchMetrics;

    fn add(self, rhs: BatchMetrics) -> BatchMetrics {
        BatchMetrics {
            studies_ingested: self.studies_ingested + rhs.studies_ingested,
            studies_failed: self.studies_failed + rhs.studies_failed,
            criteria_extracted: self.criteria_extracted + rhs.criteria_extracted,
            criteria_parsed: self.criteria_parsed + rhs.criteria_parsed,
            relations_found: self.relations_found + rhs.relations_found,
        }
    }
}

impl AddAssign for BatchMetrics {
    fn add_assign(&mut self, rhs: BatchMetrics) {
        *self = *self + rhs;
    }
}

impl Sum for BatchMetrics {
    fn sum<I: Iterator<Item = BatchMetrics>>(iter: I) -> Self {
        iter.fold(BatchMetrics::default(), Add::add)
    }
}

impl Serialize for BatchMetrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("BatchMetrics", 6)?;
        state.serialize_field("studies_ingested", &self.studies_ingested)?;
        state.serialize_field("studies_failed", &self.studies_failed)?;
        state.serialize_field("criteria_extracted", &self.criteria_extracted)?;
        state.serialize_field("criteria_parsed", &self.criteria_parsed)?;
        state.serialize_field("relations_found", &self.relations_found)?;
        state.serialize_field(
            "relations_per_criterion_percent",
            &self.relations_per_criterion_percent(),
        )?;
        state.end()
    }
}
