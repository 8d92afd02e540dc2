//! Batch orchestration

use crate::config::{ErrorPolicy, PipelineConfig};
use crate::error::PipelineError;
use crate::metrics::BatchMetrics;
use crate::report::{BatchReport, StudyOutcome};
use std::fmt::Display;
use std::future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};
use trialparse_domain::{BatchId, CriteriaExtractor, ParseResult, Study, StudyError, StudyRegistry};

type Slot = Option<Result<ParseResult, StudyError>>;

/// Runs every study of a registry through the extraction engine and merges
/// the results into one batch
///
/// Studies are dispatched in registry order, at most `max_concurrency` at a
/// time. Engine calls block, so each runs on a blocking worker. The batch
/// output is always in registry order regardless of completion order.
pub struct PipelineAggregator<E> {
    extractor: Arc<E>,
    config: PipelineConfig,
}

impl<E> PipelineAggregator<E>
where
    E: CriteriaExtractor + Send + Sync + 'static,
    E::Error: Display,
{
    /// Create a new aggregator
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the configuration is invalid.
    pub fn new(extractor: E, config: PipelineConfig) -> Result<Self, PipelineError> {
        Self::from_shared(Arc::new(extractor), config)
    }

    /// Create an aggregator over an engine shared with other owners
    pub fn from_shared(extractor: Arc<E>, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;
        Ok(Self { extractor, config })
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build a registry from raw rows and run it
    ///
    /// A malformed row fails the batch before any study is parsed.
    pub async fn ingest<R, S>(&self, rows: &[R]) -> Result<BatchReport, PipelineError>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let registry = StudyRegistry::from_rows(rows)?;
        self.run(registry).await
    }

    /// Parse every study and aggregate the results
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Study`] under [`ErrorPolicy::FailFast`], naming the
    ///   lowest-indexed failing study
    /// - [`PipelineError::Timeout`] if the batch deadline passes
    /// - [`PipelineError::Worker`] if a worker task is lost
    pub async fn run(&self, registry: StudyRegistry) -> Result<BatchReport, PipelineError> {
        let batch_id = BatchId::new();
        let started = Instant::now();
        let studies = registry.into_studies();
        let ids: Vec<String> = studies.iter().map(|s| s.id().to_string()).collect();

        info!(
            "Starting batch {}: {} studies, policy {:?}, concurrency {}",
            batch_id,
            ids.len(),
            self.config.error_policy,
            self.config.max_concurrency
        );

        let fail_fast = self.config.error_policy == ErrorPolicy::FailFast;
        let deadline = self.config.batch_timeout().map(|limit| started + limit);
        let timer = async {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => future::pending::<()>().await,
            }
        };
        tokio::pin!(timer);

        let mut slots: Vec<Slot> = vec![None; studies.len()];
        let mut pending = studies.into_iter().enumerate();
        let mut tasks = JoinSet::new();
        let mut lowest_failure: Option<usize> = None;

        loop {
            // Dispatch in registry order; once a failure is seen under
            // fail-fast every lower index is already in flight.
            while tasks.len() < self.config.max_concurrency {
                if fail_fast && lowest_failure.is_some() {
                    break;
                }
                let Some((index, study)) = pending.next() else {
                    break;
                };
                self.dispatch(&mut tasks, index, study);
            }

            if tasks.is_empty() {
                break;
            }

            tokio::select! {
                joined = tasks.join_next() => {
                    let Some(joined) = joined else { break };
                    let (index, outcome) =
                        joined.map_err(|e| PipelineError::Worker(e.to_string()))?;
                    if let Err(e) = &outcome {
                        warn!("Study {} failed: {}", e.study_id(), e);
                        if fail_fast {
                            lowest_failure = Some(lowest_failure.map_or(index, |l| l.min(index)));
                        }
                    }
                    slots[index] = Some(outcome);
                }
                _ = &mut timer => {
                    tasks.abort_all();
                    let (completed, abandoned): (Vec<_>, Vec<_>) = ids
                        .into_iter()
                        .zip(&slots)
                        .partition(|(_, slot)| slot.is_some());
                    let err = PipelineError::Timeout {
                        batch_id,
                        timeout_secs: self.config.batch_timeout_secs.unwrap_or_default(),
                        completed: completed.into_iter().map(|(id, _)| id).collect(),
                        abandoned: abandoned.into_iter().map(|(id, _)| id).collect(),
                    };
                    warn!("{}", err);
                    return Err(err);
                }
            }
        }

        if let Some(index) = lowest_failure {
            if let Some(Some(Err(source))) = slots.into_iter().nth(index) {
                warn!("Batch {} aborted by study {}", batch_id, source.study_id());
                return Err(PipelineError::Study { batch_id, source });
            }
            return Err(PipelineError::Worker(format!(
                "failure at index {} was not recorded",
                index
            )));
        }

        let mut relations = Vec::new();
        let mut metrics = BatchMetrics::new();
        let mut outcomes = Vec::with_capacity(slots.len());

        for (study_id, slot) in ids.into_iter().zip(slots) {
            match slot {
                Some(Ok(result)) => {
                    metrics.record_study(result.counts);
                    outcomes.push(StudyOutcome::Parsed {
                        study_id,
                        counts: result.counts,
                    });
                    relations.extend(result.relations);
                }
                Some(Err(error)) => {
                    metrics.record_failure();
                    outcomes.push(StudyOutcome::Failed { study_id, error });
                }
                None => {
                    return Err(PipelineError::Worker(format!(
                        "study {} was never parsed",
                        study_id
                    )))
                }
            }
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!("Batch {} complete in {}ms: {}", batch_id, elapsed_ms, metrics);

        Ok(BatchReport {
            batch_id,
            relations,
            metrics,
            outcomes,
            elapsed_ms,
        })
    }

    fn dispatch(
        &self,
        tasks: &mut JoinSet<(usize, Result<ParseResult, StudyError>)>,
        index: usize,
        mut study: Study,
    ) {
        let extractor = Arc::clone(&self.extractor);
        let study_id = study.id().to_string();
        debug!("Dispatching study {} (index {})", study_id, index);

        tasks.spawn(async move {
            let joined = tokio::task::spawn_blocking(move || {
                // the outcome is cached on the study either way
                let _ = study.parse(extractor.as_ref());
                study.into_outcome()
            })
            .await;

            let outcome = match joined {
                Ok(Some(outcome)) => outcome,
                Ok(None) => Err(StudyError::Extraction {
                    study_id,
                    message: "study was not parsed".to_string(),
                }),
                Err(e) => Err(StudyError::Extraction {
                    study_id,
                    message: format!("extraction worker failed: {}", e),
                }),
            };
            (index, outcome)
        });
    }
}
