//! Parse command implementation.

use super::read_input;
use crate::cli::ParseArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info};
use trialparse_domain::CriteriaExtractor;
use trialparse_engine::Dictionaries;
use trialparse_pipeline::{BatchReport, PipelineAggregator, PipelineConfig};

/// Execute the parse command.
pub async fn execute_parse(args: ParseArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let rows = read_rows(&args)?;
    let pipeline = pipeline_config(&args, &config.pipeline);

    let dictionaries = Arc::new(Dictionaries::load(config.resources()?)?);
    debug!(
        "Loaded {} variables and {} units",
        dictionaries.variables.len(),
        dictionaries.units.len()
    );
    let engine_config = config.engine()?;
    let engine = engine_config.build(dictionaries)?;
    debug!("Built {:?} engine", engine_config.kind);

    let report = run_batch(&rows, pipeline, engine).await?;
    println!("{}", formatter.format_report(&report)?);

    if report.is_complete() {
        eprintln!(
            "{}",
            formatter.success(&format!("{} studies parsed", report.metrics.studies_ingested))
        );
    } else {
        eprintln!(
            "{}",
            formatter.warning(&format!(
                "{} of {} studies failed",
                report.metrics.studies_failed, report.metrics.studies_ingested
            ))
        );
    }

    Ok(())
}

/// Run rows through an engine with the given policy.
pub async fn run_batch<E>(
    rows: &[Vec<String>],
    pipeline: PipelineConfig,
    engine: E,
) -> Result<BatchReport>
where
    E: CriteriaExtractor + Send + Sync + 'static,
    E::Error: Display,
{
    debug!("Running {} rows with {:?}", rows.len(), pipeline);
    let aggregator = PipelineAggregator::new(engine, pipeline)?;
    let report = aggregator.ingest(rows).await?;
    info!(
        "Batch {} finished in {} ms ({} failed)",
        report.batch_id, report.elapsed_ms, report.metrics.studies_failed
    );
    Ok(report)
}

fn read_rows(args: &ParseArgs) -> Result<Vec<Vec<String>>> {
    let json = read_input(&args.file)?;
    let rows: Vec<Vec<String>> = serde_json::from_str(&json)?;
    if rows.is_empty() {
        return Err(CliError::InvalidInput("No rows provided".to_string()));
    }
    Ok(rows)
}

/// Apply command-line overrides to the configured policy.
fn pipeline_config(args: &ParseArgs, base: &PipelineConfig) -> PipelineConfig {
    let mut config = base.clone();
    if let Some(policy) = args.policy {
        config.error_policy = policy.into();
    }
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }
    if let Some(timeout) = args.timeout {
        config.batch_timeout_secs = Some(timeout);
    }
    config
}
