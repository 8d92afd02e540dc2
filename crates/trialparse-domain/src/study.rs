//! Study module - one clinical trial and the result of parsing it

use crate::codec::RelationRecordCodec;
use crate::error::{DomainError, StudyError};
use crate::relation::EligibilityRelation;
use crate::traits::{CriteriaExtractor, ExtractorInput};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::ops::{Add, AddAssign};
use tracing::debug;

/// Minimum number of fields in an input row
pub const MIN_ROW_FIELDS: usize = 5;

/// Marker separating inclusion-context from exclusion-context conditions
pub const EXCLUSION_MARKER: &str = "Exclusion Criteria: ";

/// Yield counters of one parsed study
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StudyCounts {
    /// Distinct criteria seen in the engine output
    pub criteria: usize,

    /// Criteria with at least one non-empty relation
    pub parsed_criteria: usize,

    /// Relations decoded
    pub relations: usize,
}

impl Add for StudyCounts {
    type Output = StudyCounts;

    fn add(self, rhs: StudyCounts) -> StudyCounts {
        StudyCounts {
            criteria: self.criteria + rhs.criteria,
            parsed_criteria: self.parsed_criteria + rhs.parsed_criteria,
            relations: self.relations + rhs.relations,
        }
    }
}

impl AddAssign for StudyCounts {
    fn add_assign(&mut self, rhs: StudyCounts) {
        *self = *self + rhs;
    }
}

/// Decoded engine output for one study
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    /// Relations in engine output order
    pub relations: Vec<EligibilityRelation>,

    /// Counters derived from `relations`
    pub counts: StudyCounts,
}

impl ParseResult {
    /// Build a result and derive its counters
    ///
    /// A criterion is identified by its eligibility marker and index, so
    /// inclusion criterion 0 and exclusion criterion 0 count separately.
    pub fn from_relations(relations: Vec<EligibilityRelation>) -> Self {
        let counts = {
            let mut criteria = BTreeSet::new();
            let mut parsed = BTreeSet::new();
            for relation in &relations {
                let key = relation.criterion_key();
                criteria.insert(key);
                if relation.has_relation() {
                    parsed.insert(key);
                }
            }
            StudyCounts {
                criteria: criteria.len(),
                parsed_criteria: parsed.len(),
                relations: relations.len(),
            }
        };

        Self { relations, counts }
    }
}

#[derive(Debug, Clone)]
enum ParseState {
    Pending,
    Parsed(ParseResult),
    Failed(StudyError),
}

/// A clinical trial with its raw eligibility text
///
/// Constructed once from an input row. The parse state is written by the
/// first call to [`Study::parse`] and never changes afterwards.
#[derive(Debug, Clone)]
pub struct Study {
    id: String,
    title: String,
    exclusion_flag: String,
    conditions: Vec<String>,
    eligibility_text: String,
    state: ParseState,
}

impl Study {
    /// Create a new study
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        conditions: Vec<String>,
        eligibility_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            exclusion_flag: String::new(),
            conditions,
            eligibility_text: eligibility_text.into(),
            state: ParseState::Pending,
        }
    }

    /// Build a study from a raw row
    ///
    /// A row is `[id, title, exclusion_flag, conditions, eligibility_text, ...]`;
    /// trailing fields are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use trialparse_domain::Study;
    ///
    /// let row = ["NCT001", "Title X", "false", "Cond A Exclusion Criteria: Cond B", "Inclusion Criteria: - age 18"];
    /// let study = Study::from_row(0, &row).unwrap();
    /// assert_eq!(study.conditions(), ["Cond A ", "Cond B"]);
    /// ```
    pub fn from_row<S: AsRef<str>>(row_index: usize, row: &[S]) -> Result<Self, DomainError> {
        if row.len() < MIN_ROW_FIELDS {
            return Err(DomainError::MalformedRow {
                row: row_index,
                fields: row.len(),
            });
        }

        let id = row[0].as_ref();
        if id.is_empty() {
            return Err(DomainError::EmptyStudyId { row: row_index });
        }

        let mut study = Study::new(
            id,
            row[1].as_ref(),
            split_conditions(row[3].as_ref()),
            row[4].as_ref(),
        );
        study.exclusion_flag = row[2].as_ref().to_string();
        Ok(study)
    }

    /// Trial identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Trial title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Third row field, kept verbatim
    pub fn exclusion_flag(&self) -> &str {
        &self.exclusion_flag
    }

    /// Condition segments; the first is inclusion context, the rest exclusion context
    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    /// Raw eligibility text
    pub fn eligibility_text(&self) -> &str {
        &self.eligibility_text
    }

    /// Payload handed to the extraction engine
    pub fn extractor_input(&self) -> ExtractorInput {
        ExtractorInput {
            nct_id: self.id.clone(),
            title: self.title.clone(),
            conditions: self.conditions.clone(),
            eligibility_criteria: self.eligibility_text.clone(),
        }
    }

    /// Whether parse has been invoked, successfully or not
    pub fn is_parsed(&self) -> bool {
        !matches!(self.state, ParseState::Pending)
    }

    /// Cached successful result, if any
    pub fn parse_result(&self) -> Option<&ParseResult> {
        match &self.state {
            ParseState::Parsed(result) => Some(result),
            _ => None,
        }
    }

    /// Cached failure, if any
    pub fn parse_error(&self) -> Option<&StudyError> {
        match &self.state {
            ParseState::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Counters of the parsed study; all zero before a successful parse
    pub fn counts(&self) -> StudyCounts {
        self.parse_result().map(|r| r.counts).unwrap_or_default()
    }

    /// Distinct criteria seen
    pub fn criteria_count(&self) -> usize {
        self.counts().criteria
    }

    /// Criteria with at least one relation extracted
    pub fn parsed_criteria_count(&self) -> usize {
        self.counts().parsed_criteria
    }

    /// Relations decoded
    pub fn relation_count(&self) -> usize {
        self.counts().relations
    }

    /// Run the extraction engine on this study
    ///
    /// The engine is invoked at most once. The outcome, success or failure, is
    /// cached and returned by every later call without touching the engine.
    ///
    /// # Errors
    ///
    /// - [`StudyError::Extraction`] when the engine fails
    /// - [`StudyError::MalformedRelation`] when the engine output does not decode
    pub fn parse<E>(&mut self, extractor: &E) -> Result<&ParseResult, StudyError>
    where
        E: CriteriaExtractor + ?Sized,
        E::Error: Display,
    {
        if let ParseState::Pending = self.state {
            self.state = match self.run_extractor(extractor) {
                Ok(result) => ParseState::Parsed(result),
                Err(e) => ParseState::Failed(e),
            };
        }

        match &self.state {
            ParseState::Parsed(result) => Ok(result),
            ParseState::Failed(err) => Err(err.clone()),
            ParseState::Pending => unreachable!("parse state is recorded above"),
        }
    }

    /// Consume the study, yielding its parse outcome
    ///
    /// Returns `None` if the study was never parsed.
    pub fn into_outcome(self) -> Option<Result<ParseResult, StudyError>> {
        match self.state {
            ParseState::Pending => None,
            ParseState::Parsed(result) => Some(Ok(result)),
            ParseState::Failed(err) => Some(Err(err)),
        }
    }

    fn run_extractor<E>(&self, extractor: &E) -> Result<ParseResult, StudyError>
    where
        E: CriteriaExtractor + ?Sized,
        E::Error: Display,
    {
        let raw = extractor
            .extract(&self.extractor_input())
            .map_err(|e| StudyError::Extraction {
                study_id: self.id.clone(),
                message: e.to_string(),
            })?;

        debug!("Study {}: engine output {} bytes", self.id, raw.len());

        let relations =
            RelationRecordCodec::decode(&raw).map_err(|source| StudyError::MalformedRelation {
                study_id: self.id.clone(),
                source,
            })?;

        Ok(ParseResult::from_relations(relations))
    }
}

/// Split a raw condition field on the exclusion marker
///
/// No further interpretation of the condition text happens here.
pub fn split_conditions(raw: &str) -> Vec<String> {
    raw.split(EXCLUSION_MARKER).map(str::to_string).collect()
}
