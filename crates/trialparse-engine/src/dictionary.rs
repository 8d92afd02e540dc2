//! Variable and unit dictionaries used by the extraction engine
//!
//! Both dictionaries are loaded once at startup into an immutable
//! [`Dictionaries`] value and shared with engine adapters. A missing,
//! unreadable or empty dictionary is a configuration error.
//!
//! File format: one entry per line, tab-separated, first column is the entry
//! key. Blank lines and lines starting with `#` are ignored.

use crate::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Locations of the dictionary files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Variable dictionary file
    pub variable_file: PathBuf,

    /// Unit dictionary file
    pub unit_file: PathBuf,
}

impl ResourceConfig {
    /// Resolve relative paths against a base directory
    ///
    /// Used to make paths in a config file relative to that file.
    pub fn resolve(&self, base: &Path) -> Self {
        let resolve = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };
        Self {
            variable_file: resolve(&self.variable_file),
            unit_file: resolve(&self.unit_file),
        }
    }
}

/// One loaded dictionary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    name: String,
    source: PathBuf,
    entries: BTreeMap<String, Vec<String>>,
}

impl Dictionary {
    /// Load a dictionary from a file
    pub fn load(name: &str, path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Configuration(format!(
                "Failed to read {} dictionary {}: {}",
                name,
                path.display(),
                e
            ))
        })?;
        Self::parse(name, path, &contents)
    }

    /// Parse dictionary contents
    pub fn parse(name: &str, source: &Path, contents: &str) -> Result<Self, EngineError> {
        let mut entries = BTreeMap::new();

        for (idx, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut columns = line.split('\t').map(str::trim);
            let key = columns.next().unwrap_or_default();
            if key.is_empty() {
                warn!("{} dictionary line {}: empty key, skipped", name, idx + 1);
                continue;
            }

            let values: Vec<String> = columns.map(str::to_string).collect();
            if entries.contains_key(key) {
                warn!("{} dictionary line {}: duplicate key '{}'", name, idx + 1, key);
                continue;
            }
            entries.insert(key.to_string(), values);
        }

        if entries.is_empty() {
            return Err(EngineError::Configuration(format!(
                "{} dictionary {} has no entries",
                name,
                source.display()
            )));
        }

        Ok(Self {
            name: name.to_string(),
            source: source.to_path_buf(),
            entries,
        })
    }

    /// Dictionary name ("variables" or "units")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the dictionary was loaded from
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Columns following the key, if the key exists
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Whether the key exists
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

/// The dictionaries an engine needs, loaded once per process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionaries {
    /// Variable dictionary
    pub variables: Dictionary,

    /// Unit dictionary
    pub units: Dictionary,
}

impl Dictionaries {
    /// Load both dictionaries
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if either file is missing,
    /// unreadable or empty.
    pub fn load(config: &ResourceConfig) -> Result<Self, EngineError> {
        let variables = Dictionary::load("variables", &config.variable_file)?;
        let units = Dictionary::load("units", &config.unit_file)?;

        info!(
            "Loaded dictionaries: {} variables, {} units",
            variables.len(),
            units.len()
        );

        Ok(Self { variables, units })
    }
}
