//! Whole-library snapshot persistence

use crate::component::LibraryComponent;
use octofhir_measure_diagnostics::{CQM0401, CQM0402, ErrorCode};
use octofhir_measure_model::Measure;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading or writing snapshots
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Filesystem failure
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid snapshot document
    #[error("snapshot format invalid: {0}")]
    Format(#[from] serde_json::Error),
}

impl SnapshotError {
    /// The diagnostic code for this error
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => CQM0401,
            Self::Format(_) => CQM0402,
        }
    }
}

/// A complete library state: every component and every measure
///
/// Round-tripping a snapshot preserves every id string, so links between
/// trees and components survive save and restore unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// All components, archived ones included
    #[serde(default)]
    pub components: Vec<LibraryComponent>,
    /// All measures
    #[serde(default)]
    pub measures: Vec<Measure>,
}

impl Snapshot {
    /// Build a snapshot from components and measures
    pub fn new(components: Vec<LibraryComponent>, measures: Vec<Measure>) -> Self {
        Self {
            components,
            measures,
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the snapshot to a file
    pub fn save_to(&self, path: &Path) -> Result<(), SnapshotError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a snapshot from a file
    pub fn load_from(path: &Path) -> Result<Self, SnapshotError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
