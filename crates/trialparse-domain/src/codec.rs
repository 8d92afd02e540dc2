//! Relation record protocol spoken with the extraction engine
//!
//! The engine answers each study with one text blob. Records are separated by
//! a line feed and each record carries exactly seven tab-separated fields:
//!
//! ```text
//! nct_id \t eligibility_type \t variable_type \t criterion_index \t criterion \t question \t relation_json
//! ```
//!
//! Lines with any other field count are ignored. The last field must hold a
//! serialized JSON object; anything else is a protocol break and fails the
//! decode.

use crate::error::CodecError;
use crate::relation::{EligibilityRelation, RelationMap};
use serde_json::Value;
use tracing::debug;

/// Separator between the fields of one record
pub const FIELD_SEPARATOR: char = '\t';

/// Separator between records
pub const RECORD_SEPARATOR: char = '\n';

/// Number of fields in a well-formed record
pub const FIELD_COUNT: usize = 7;

/// Result of decoding a blob, including how many lines were ignored
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodeReport {
    /// Relations in the order they appeared
    pub relations: Vec<EligibilityRelation>,

    /// Non-empty lines skipped because their field count was not 7
    pub skipped_lines: usize,
}

/// Encoder/decoder for the relation record protocol
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationRecordCodec;

impl RelationRecordCodec {
    /// Decode an extractor blob into relations
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MalformedRelation`] when a 7-field record's last
    /// field is not a JSON object.
    ///
    /// # Examples
    ///
    /// ```
    /// use trialparse_domain::RelationRecordCodec;
    ///
    /// let text = "NCT001\tinclusion\tAge\t0\tage 18\tWhat is the minimum age?\t{\"op\":\">=\",\"value\":18}\n";
    /// let relations = RelationRecordCodec::decode(text).unwrap();
    /// assert_eq!(relations.len(), 1);
    /// assert_eq!(relations[0].variable_type, "Age");
    /// ```
    pub fn decode(text: &str) -> Result<Vec<EligibilityRelation>, CodecError> {
        Self::decode_with_report(text).map(|report| report.relations)
    }

    /// Decode an extractor blob, also counting skipped lines
    pub fn decode_with_report(text: &str) -> Result<DecodeReport, CodecError> {
        let mut report = DecodeReport::default();

        for (idx, raw_line) in text.split(RECORD_SEPARATOR).enumerate() {
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
            if fields.len() != FIELD_COUNT {
                debug!(
                    "Skipping line {}: {} fields, expected {}",
                    idx + 1,
                    fields.len(),
                    FIELD_COUNT
                );
                report.skipped_lines += 1;
                continue;
            }

            let relation = decode_mapping(fields[6]).map_err(|reason| {
                CodecError::MalformedRelation {
                    line: idx + 1,
                    reason,
                }
            })?;

            report.relations.push(EligibilityRelation {
                nct_id: fields[0].to_string(),
                eligibility_type: fields[1].to_string(),
                variable_type: fields[2].to_string(),
                criterion_index: fields[3].to_string(),
                criterion: fields[4].to_string(),
                question: fields[5].to_string(),
                relation,
            });
        }

        Ok(report)
    }

    /// Encode relations into the protocol, one record per line
    ///
    /// Every record is terminated by a line feed. Field values must not
    /// contain tabs or line feeds for the output to decode back unchanged.
    pub fn encode(relations: &[EligibilityRelation]) -> String {
        let mut out = String::new();
        for relation in relations {
            out.push_str(&Self::encode_record(relation));
            out.push(RECORD_SEPARATOR);
        }
        out
    }

    /// Encode a single relation as one record, without a line terminator
    pub fn encode_record(relation: &EligibilityRelation) -> String {
        let mapping = Value::Object(relation.relation.clone()).to_string();
        [
            relation.nct_id.as_str(),
            relation.eligibility_type.as_str(),
            relation.variable_type.as_str(),
            relation.criterion_index.as_str(),
            relation.criterion.as_str(),
            relation.question.as_str(),
            mapping.as_str(),
        ]
        .join("\t")
    }
}

fn decode_mapping(field: &str) -> Result<RelationMap, String> {
    serde_json::from_str::<RelationMap>(field).map_err(|e| e.to_string())
}
