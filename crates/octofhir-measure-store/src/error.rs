//! Store error types

use octofhir_measure_diagnostics::{CQM0100, CQM0101, CQM0102, CQM0304, CQM0400, ErrorCode};
use octofhir_measure_types::{ComponentId, MeasureId};
use std::fmt;
use thiserror::Error;

/// The mutation the in-use guard refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedOperation {
    /// A `delete_component` call
    Delete,
    /// An `archive_component` call
    Archive,
}

impl fmt::Display for GuardedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delete => write!(f, "deletion"),
            Self::Archive => write!(f, "archival"),
        }
    }
}

/// Errors raised by component store operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// A component with this id already exists
    #[error("component '{id}' already exists")]
    DuplicateComponent {
        /// Offending id
        id: ComponentId,
    },

    /// No component with this id
    #[error("component '{id}' not found")]
    ComponentNotFound {
        /// Missing id
        id: ComponentId,
    },

    /// The operation is not allowed on an archived component
    #[error("component '{id}' is archived")]
    ComponentArchived {
        /// Archived id
        id: ComponentId,
    },

    /// The in-use guard refused a delete or archive
    #[error("{operation} of component '{id}' refused: used by {} measure(s)", measure_ids.len())]
    ComponentInUse {
        /// Guarded id
        id: ComponentId,
        /// What the guard refused
        operation: GuardedOperation,
        /// Consuming measures at the time of the refusal
        measure_ids: Vec<MeasureId>,
    },
}

impl StoreError {
    /// The diagnostic code for this error
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::DuplicateComponent { .. } => CQM0400,
            Self::ComponentNotFound { .. } => CQM0304,
            Self::ComponentArchived { .. } => CQM0102,
            Self::ComponentInUse {
                operation: GuardedOperation::Delete,
                ..
            } => CQM0100,
            Self::ComponentInUse {
                operation: GuardedOperation::Archive,
                ..
            } => CQM0101,
        }
    }
}
