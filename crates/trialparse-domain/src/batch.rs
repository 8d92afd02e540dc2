//! Batch identifiers

use serde::{Serialize, Serializer};
use std::fmt;

/// Unique identifier for one pipeline run, based on UUIDv7
///
/// Attached to log lines, reports and error bodies so everything produced by
/// one request can be correlated. UUIDv7 keeps identifiers sortable by
/// creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchId(u128);

impl BatchId {
    /// Generate a new UUIDv7-based BatchId
    ///
    /// # Examples
    ///
    /// ```
    /// use trialparse_domain::BatchId;
    ///
    /// let id = BatchId::new();
    /// assert_eq!(id.to_string().len(), 36);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl Serialize for BatchId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
