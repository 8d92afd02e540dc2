//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trialparse_pipeline::ErrorPolicy;

/// trialparse - Extract structured eligibility relations from clinical trials.
#[derive(Debug, Parser)]
#[command(name = "trialparse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (default: ~/.trialparse/config.toml)
    #[arg(short, long, global = true, env = "TRIALPARSE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Metrics only
    Summary,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a batch of trial rows through the extraction engine
    Parse(ParseArgs),

    /// Decode a raw relation record dump
    Decode(DecodeArgs),
}

/// Arguments for the parse command.
#[derive(Debug, Parser)]
pub struct ParseArgs {
    /// JSON file holding an array of rows ("-" reads stdin)
    pub file: PathBuf,

    /// What to do when a study fails
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Number of studies parsed at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Batch deadline in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Arguments for the decode command.
#[derive(Debug, Parser)]
pub struct DecodeArgs {
    /// Relation record dump ("-" reads stdin)
    pub file: PathBuf,
}

/// Error policy options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PolicyArg {
    /// Abort the batch on the first failing study
    FailFast,
    /// Keep going and report failed studies
    SkipAndReport,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Summary => crate::config::OutputFormat::Summary,
        }
    }
}

impl From<PolicyArg> for ErrorPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::FailFast => ErrorPolicy::FailFast,
            PolicyArg::SkipAndReport => ErrorPolicy::SkipAndReport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        let cli = Cli::try_parse_from([
            "trialparse",
            "parse",
            "rows.json",
            "--policy",
            "skip-and-report",
            "--concurrency",
            "4",
        ])
        .unwrap();
        match cli.command {
            Command::Parse(args) => {
                assert_eq!(args.file, PathBuf::from("rows.json"));
                assert!(matches!(args.policy, Some(PolicyArg::SkipAndReport)));
                assert_eq!(args.concurrency, Some(4));
                assert_eq!(args.timeout, None);
            }
            _ => panic!("Expected Parse command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "trialparse",
            "decode",
            "dump.tsv",
            "--format",
            "json",
            "--no-color",
        ])
        .unwrap();
        assert!(cli.no_color);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert!(matches!(cli.command, Command::Decode(_)));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["trialparse"]).is_err());
    }

    #[test]
    fn test_policy_conversion() {
        let policy: ErrorPolicy = PolicyArg::FailFast.into();
        assert_eq!(policy, ErrorPolicy::FailFast);
    }
}
