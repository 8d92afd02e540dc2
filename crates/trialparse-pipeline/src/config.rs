//! Configuration for the pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a batch does when one study fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Abort the whole batch and name the failing study
    #[default]
    FailFast,
    /// Keep going and report each study's outcome
    SkipAndReport,
}

/// Configuration for the PipelineAggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Behavior on per-study failure
    #[serde(default)]
    pub error_policy: ErrorPolicy,

    /// Maximum studies parsed at once; 1 parses strictly in registry order
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Deadline for a whole batch (seconds); unset means no deadline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_timeout_secs: Option<u64>,
}

fn default_max_concurrency() -> usize {
    1
}

impl Default for PipelineConfig {
    /// Sequential, fail-fast, no deadline
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::FailFast,
            max_concurrency: 1,
            batch_timeout_secs: None,
        }
    }
}

impl PipelineConfig {
    /// Sequential fail-fast preset
    pub fn sequential() -> Self {
        Self::default()
    }

    /// Parse up to `workers` studies at once
    pub fn parallel(workers: usize) -> Self {
        Self {
            max_concurrency: workers,
            ..Self::default()
        }
    }

    /// Skip failing studies and report them
    pub fn best_effort() -> Self {
        Self {
            error_policy: ErrorPolicy::SkipAndReport,
            ..Self::default()
        }
    }

    /// Batch deadline as a Duration
    pub fn batch_timeout(&self) -> Option<Duration> {
        self.batch_timeout_secs.map(Duration::from_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".to_string());
        }
        if self.batch_timeout_secs == Some(0) {
            return Err("batch_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
