//! trialparse Pipeline
//!
//! Runs a batch of clinical trials through the eligibility extraction engine
//! and merges the per-study results into one ordered relation list with yield
//! metrics.
//!
//! # Architecture
//!
//! ```text
//! rows → StudyRegistry → PipelineAggregator → Study::parse (blocking worker)
//!                                           → BatchReport { relations, metrics, outcomes }
//! ```
//!
//! # Key Features
//!
//! - **Ordered output**: relations follow registry order, whatever the
//!   completion order
//! - **Bounded parallelism**: at most `max_concurrency` engine calls in flight
//! - **Error policy**: fail the batch on the first failing study, or skip it
//!   and report
//! - **Batch deadline**: optional timeout naming completed and abandoned studies
//!
//! # Example Usage
//!
//! ```no_run
//! use trialparse_engine::MockEngine;
//! use trialparse_pipeline::{PipelineAggregator, PipelineConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = MockEngine::new("NCT001\tinclusion\tAge\t0\tage 18\tq\t{}\n");
//! let aggregator = PipelineAggregator::new(engine, PipelineConfig::parallel(4))?;
//!
//! let rows = vec![vec!["NCT001", "Title", "false", "Cond", "Inclusion Criteria: - age 18"]];
//! let report = aggregator.ingest(&rows).await?;
//!
//! println!("{}", report.metrics.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod aggregator;
mod config;
mod error;
mod metrics;
mod report;

pub use aggregator::PipelineAggregator;
pub use config::{ErrorPolicy, PipelineConfig};
pub use error::PipelineError;
pub use metrics::BatchMetrics;
pub use report::{BatchReport, StudyOutcome};
