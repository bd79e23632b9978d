//! Clinical quality measure library synchronization for Rust
//!
//! This crate keeps many independent measure documents consistent with a
//! single normalized library of reusable criteria components, covering:
//! - Automatic linking of criteria elements to approved components
//! - Merging overlapping components with cross-set code deduplication
//! - Edit propagation across shared components (update-all or fork)
//! - Usage indexing, in-use guards, and bounded remote-sync retry
//! - Referential integrity auditing
//!
//! # Example
//!
//! ```ignore
//! use octofhir_measure::MeasureLibrary;
//!
//! let mut library = MeasureLibrary::new();
//! library.add_component(component)?;
//!
//! let links = library.ingest_measure(measure);
//! let findings = library.validate();
//! assert!(findings.is_empty());
//! ```

// Re-export all public APIs from internal crates
pub use octofhir_measure_diagnostics as diagnostics;
pub use octofhir_measure_engine as engine;
pub use octofhir_measure_model as model;
pub use octofhir_measure_store as store;
pub use octofhir_measure_types as types;

// Convenience re-exports
pub use octofhir_measure_diagnostics::{AuditFinding, ErrorCode, FindingKind, Severity};
pub use octofhir_measure_engine::{
    AutoLinker, ComponentEdit, EditPlan, IntegrityValidator, LinkMap, LinkTarget, MergeEngine,
    MergeOptions, SyncPropagator,
};
pub use octofhir_measure_model::{CriteriaNode, DataElement, LogicalClause, Measure, Population};
pub use octofhir_measure_store::{
    ComponentStore, LibraryComponent, PendingSyncTracker, RemoteStore, Snapshot,
    TerminologyProvider,
};
pub use octofhir_measure_types::{CodeReference, TimingExpression, ValueSet};

pub mod service;
pub use service::{LibraryError, MeasureLibrary, MergeReport, SharedLibrary, shared};

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
