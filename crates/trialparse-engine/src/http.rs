//! Remote extraction service
//!
//! Posts each study as JSON to a service that answers with relation record
//! protocol text in the response body.
//!
//! # Features
//!
//! - Configurable endpoint and request timeout
//! - Retry with exponential backoff on transport errors and 5xx answers
//! - Client errors (4xx) are returned immediately
//!
//! `extract` blocks. Inside a tokio runtime it must run on a blocking worker
//! (`spawn_blocking`), which is how the pipeline calls it.

use crate::EngineError;
use std::time::Duration;
use tracing::warn;
use trialparse_domain::traits::{CriteriaExtractor, ExtractorInput};

/// Default timeout for one extraction request (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts per study
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Engine backed by a remote HTTP service
#[derive(Debug, Clone)]
pub struct HttpEngine {
    endpoint: String,
    client: reqwest::Client,
    max_retries: u32,
    backoff: Duration,
}

impl HttpEngine {
    /// Create a new HTTP engine
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: Duration::from_secs(1),
        })
    }

    /// Set the maximum number of attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the delay before the second attempt; later attempts double it
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Service endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post one study, retrying transient failures
    pub async fn extract_async(&self, input: &ExtractorInput) -> Result<String, EngineError> {
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.client.post(&self.endpoint).json(input).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.text().await.map_err(|e| {
                            EngineError::InvalidResponse(format!("Failed to read body: {}", e))
                        });
                    }

                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    if status.is_client_error() {
                        return Err(EngineError::InvalidResponse(format!(
                            "HTTP {}: {}",
                            status, body
                        )));
                    }
                    last_error = Some(EngineError::Communication(format!(
                        "HTTP {}: {}",
                        status, body
                    )));
                }
                Err(e) => {
                    last_error = Some(EngineError::Communication(format!(
                        "Request failed: {}",
                        e
                    )));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                let delay = self.backoff * 2u32.pow(attempts - 1);
                warn!(
                    "Extraction request for {} failed (attempt {}/{}), retrying in {:?}",
                    input.nct_id, attempts, self.max_retries, delay
                );
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| EngineError::Communication("Max retries exceeded".to_string())))
    }
}

impl CriteriaExtractor for HttpEngine {
    type Error = EngineError;

    fn extract(&self, input: &ExtractorInput) -> Result<String, Self::Error> {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle.block_on(self.extract_async(input)),
            Err(_) => tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
                .block_on(self.extract_async(input)),
        }
    }
}
