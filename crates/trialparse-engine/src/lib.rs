//! trialparse Engine Adapters
//!
//! Implementations of the `CriteriaExtractor` trait from `trialparse-domain`.
//! The rule-based extraction engine is an external program or service; this
//! crate only knows how to reach it and how to hand it its dictionaries.
//!
//! # Adapters
//!
//! - `MockEngine`: deterministic canned output for testing
//! - `CommandEngine`: runs an extractor executable once per study
//! - `HttpEngine`: posts each study to a remote extraction service
//!
//! # Examples
//!
//! ```
//! use trialparse_engine::MockEngine;
//! use trialparse_domain::{CriteriaExtractor, ExtractorInput};
//!
//! let engine = MockEngine::new("NCT001\tinclusion\tAge\t0\tage 18\tq\t{}\n");
//! let input = ExtractorInput {
//!     nct_id: "NCT001".to_string(),
//!     title: "Title".to_string(),
//!     conditions: vec![],
//!     eligibility_criteria: "Inclusion Criteria: - age 18".to_string(),
//! };
//! assert!(engine.extract(&input).unwrap().starts_with("NCT001"));
//! ```

#![warn(missing_docs)]

pub mod command;
pub mod config;
pub mod dictionary;
pub mod http;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use trialparse_domain::traits::{CriteriaExtractor, ExtractorInput};

pub use command::CommandEngine;
pub use config::{Engine, EngineConfig, EngineKind};
pub use dictionary::{Dictionaries, Dictionary, ResourceConfig};
pub use http::HttpEngine;

/// Errors that can occur while reaching the extraction engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Dictionaries or engine settings are unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The extractor process could not be started
    #[error("Failed to start extractor: {0}")]
    Spawn(String),

    /// The extractor process exited unsuccessfully
    #[error("Extractor exited with {status}: {stderr}")]
    Process {
        /// Exit status description
        status: String,
        /// Captured standard error
        stderr: String,
    },

    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Engine answered with something that is not protocol text
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error
    #[error("Engine error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Serialization(e.to_string())
    }
}

#[derive(Debug, Clone)]
enum MockResponse {
    Output(String),
    Error,
}

#[derive(Debug, Default)]
struct MockState {
    responses: HashMap<String, MockResponse>,
    delays: HashMap<String, Duration>,
    calls: Vec<String>,
}

/// Mock engine for deterministic testing
///
/// Returns pre-configured protocol text per study without running anything.
/// Clones share their configuration and call log.
///
/// # Examples
///
/// ```
/// use trialparse_engine::MockEngine;
/// use trialparse_domain::{CriteriaExtractor, ExtractorInput};
///
/// let mut engine = MockEngine::default();
/// engine.add_response("NCT001", "NCT001\tinclusion\tAge\t0\tage\tq\t{}\n");
/// engine.add_error("NCT002");
///
/// let input = |id: &str| ExtractorInput {
///     nct_id: id.to_string(),
///     title: String::new(),
///     conditions: vec![],
///     eligibility_criteria: String::new(),
/// };
/// assert!(engine.extract(&input("NCT001")).is_ok());
/// assert!(engine.extract(&input("NCT002")).is_err());
/// assert_eq!(engine.call_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockEngine {
    default_response: String,
    state: Arc<Mutex<MockState>>,
}

impl MockEngine {
    /// Create a new MockEngine answering every study with the same text
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Answer a specific study with the given text
    pub fn add_response(&mut self, nct_id: impl Into<String>, response: impl Into<String>) {
        self.state()
            .responses
            .insert(nct_id.into(), MockResponse::Output(response.into()));
    }

    /// Fail extraction for a specific study
    pub fn add_error(&mut self, nct_id: impl Into<String>) {
        self.state()
            .responses
            .insert(nct_id.into(), MockResponse::Error);
    }

    /// Sleep before answering a specific study
    pub fn add_delay(&mut self, nct_id: impl Into<String>, delay: Duration) {
        self.state().delays.insert(nct_id.into(), delay);
    }

    /// Number of times extract was called
    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    /// Study ids in the order extract was called
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new("")
    }
}

impl CriteriaExtractor for MockEngine {
    type Error = EngineError;

    fn extract(&self, input: &ExtractorInput) -> Result<String, Self::Error> {
        let (response, delay) = {
            let mut state = self.state();
            state.calls.push(input.nct_id.clone());
            (
                state.responses.get(&input.nct_id).cloned(),
                state.delays.get(&input.nct_id).copied(),
            )
        };

        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        match response {
            Some(MockResponse::Output(text)) => Ok(text),
            Some(MockResponse::Error) => Err(EngineError::Other(format!(
                "Mock error for {}",
                input.nct_id
            ))),
            None => Ok(self.default_response.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: &str) -> ExtractorInput {
        ExtractorInput {
            nct_id: id.to_string(),
            title: "Title".to_string(),
            conditions: vec!["Cond".to_string()],
            eligibility_criteria: "Inclusion Criteria: - adults".to_string(),
        }
    }

    #[test]
    fn test_mock_engine_default() {
        let engine = MockEngine::new("fixed");
        assert_eq!(engine.extract(&input("A")).unwrap(), "fixed");
    }

    #[test]
    fn test_mock_engine_specific_responses() {
        let mut engine = MockEngine::default();
        engine.add_response("A", "alpha");
        engine.add_response("B", "beta");

        assert_eq!(engine.extract(&input("A")).unwrap(), "alpha");
        assert_eq!(engine.extract(&input("B")).unwrap(), "beta");
        assert_eq!(engine.extract(&input("C")).unwrap(), "");
    }

    #[test]
    fn test_mock_engine_call_log() {
        let engine = MockEngine::new("x");
        assert_eq!(engine.call_count(), 0);

        engine.extract(&input("B")).unwrap();
        engine.extract(&input("A")).unwrap();
        assert_eq!(engine.calls(), ["B", "A"]);
        assert_eq!(engine.clone().call_count(), 2);
    }

    #[test]
    fn test_mock_engine_error() {
        let mut engine = MockEngine::default();
        engine.add_error("bad");

        let err = engine.extract(&input("bad")).unwrap_err();
        assert!(matches!(err, EngineError::Other(_)));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_mock_engine_clone_shares_state() {
        let engine1 = MockEngine::new("x");
        let mut engine2 = engine1.clone();
        engine2.add_response("A", "shared");

        assert_eq!(engine1.extract(&input("A")).unwrap(), "shared");
        assert_eq!(engine2.call_count(), 1);
    }
}
