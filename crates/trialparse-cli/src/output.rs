//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use serde_json::Value;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};
use trialparse_domain::{DecodeReport, EligibilityRelation};
use trialparse_pipeline::{BatchReport, StudyOutcome};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the result of a batch run.
    pub fn format_report(&self, report: &BatchReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Table => {
                let mut sections = vec![self.relations_table(&report.relations)];
                if !report.is_complete() {
                    sections.push(self.failures_table(report));
                }
                sections.push(self.metrics_line(report));
                Ok(sections.join("\n\n"))
            }
            OutputFormat::Summary => {
                let mut lines = vec![
                    format!("Batch {}", report.batch_id),
                    report.metrics.summary(),
                    format!("Elapsed: {} ms", report.elapsed_ms),
                ];
                for outcome in report.failures() {
                    if let Some(error) = outcome.error() {
                        lines.push(self.error(&error.to_string()));
                    }
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format the result of decoding a protocol dump.
    pub fn format_decode(&self, report: &DecodeReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&report.relations)?),
            OutputFormat::Table => {
                let mut out = self.relations_table(&report.relations);
                if report.skipped_lines > 0 {
                    out.push_str("\n\n");
                    out.push_str(&self.skipped(report.skipped_lines));
                }
                Ok(out)
            }
            OutputFormat::Summary => {
                let mut lines = vec![self.info(&format!(
                    "{} relation(s) decoded",
                    report.relations.len()
                ))];
                if report.skipped_lines > 0 {
                    lines.push(self.skipped(report.skipped_lines));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format relations as a table.
    fn relations_table(&self, relations: &[EligibilityRelation]) -> String {
        if relations.is_empty() {
            return self.colorize("No relations found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record([
            "NCT ID", "Type", "Variable", "Index", "Criterion", "Question", "Relation",
        ]);

        for relation in relations {
            let mapping = Value::Object(relation.relation.clone()).to_string();
            builder.push_record([
                relation.nct_id.as_str(),
                relation.eligibility_type.as_str(),
                relation.variable_type.as_str(),
                relation.criterion_index.as_str(),
                relation.criterion.as_str(),
                relation.question.as_str(),
                mapping.as_str(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    fn failures_table(&self, report: &BatchReport) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Study", "Kind", "Error"]);

        for outcome in report.failures() {
            if let StudyOutcome::Failed { study_id, error } = outcome {
                builder.push_record([study_id.clone(), error.kind().to_string(), error.to_string()]);
            }
        }

        let mut table = builder.build();
        table.with(Style::rounded());
        format!("{}\n{}", self.colorize("Failed studies:", "red"), table)
    }

    fn metrics_line(&self, report: &BatchReport) -> String {
        self.colorize(&report.metrics.to_string(), "cyan")
    }

    fn skipped(&self, lines: usize) -> String {
        self.warning(&format!("{} line(s) skipped: not a 7-field record", lines))
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialparse_domain::{BatchId, RelationRecordCodec, StudyCounts, StudyError};
    use trialparse_pipeline::BatchMetrics;

    const DUMP: &str = "NCT001\tinclusion\tAge\t0\tage 18\tWhat is the minimum age?\t{\"op\":\">=\",\"value\":18}\n\
separator\n";

    fn create_test_report() -> BatchReport {
        let relations = RelationRecordCodec::decode(DUMP).unwrap();
        let counts = StudyCounts {
            criteria: 1,
            parsed_criteria: 1,
            relations: 1,
        };
        let mut metrics = BatchMetrics::from_counts(counts);
        metrics.record_failure();

        BatchReport {
            batch_id: BatchId::new(),
            relations,
            metrics,
            outcomes: vec![
                StudyOutcome::Parsed {
                    study_id: "NCT001".to_string(),
                    counts,
                },
                StudyOutcome::Failed {
                    study_id: "NCT002".to_string(),
                    error: StudyError::Extraction {
                        study_id: "NCT002".to_string(),
                        message: "exit status: 2".to_string(),
                    },
                },
            ],
            elapsed_ms: 12,
        }
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_report(&create_test_report()).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["relations"][0]["variable_type"], "Age");
        assert_eq!(value["metrics"]["studies_failed"], 1);
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_report(&create_test_report()).unwrap();
        assert!(output.contains("Variable"));
        assert!(output.contains("What is the minimum age?"));
        assert!(output.contains("Failed studies:"));
        assert!(output.contains("NCT002"));
        assert!(output.contains("Relations per criteria: 100.0%"));
    }

    #[test]
    fn test_summary_format() {
        let formatter = Formatter::new(OutputFormat::Summary, false);
        let output = formatter.format_report(&create_test_report()).unwrap();
        assert!(output.contains("Ingested studies: 2"));
        assert!(output.contains("Failed studies: 1"));
        assert!(output.contains("✗ Extraction failed for study NCT002"));
        assert!(!output.contains("What is the minimum age?"));
    }

    #[test]
    fn test_empty_relations() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_decode(&DecodeReport::default()).unwrap();
        assert!(output.contains("No relations found"));
    }

    #[test]
    fn test_decode_reports_skipped_lines() {
        let report = RelationRecordCodec::decode_with_report(DUMP).unwrap();
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_decode(&report).unwrap();
        assert!(output.contains("1 line(s) skipped"));

        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_decode(&report).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
    }
}
