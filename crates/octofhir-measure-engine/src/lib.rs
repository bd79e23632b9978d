//! Measure/Library Synchronization Engines
//!
//! This crate houses the four engines that keep measure criteria and the
//! shared component library consistent with each other:
//!
//! - **Auto-linker**: scores library components against unlinked data
//!   elements (OID match, normalized-name match, timing agreement) and
//!   stamps confident winners
//! - **Merge engine**: combines overlapping components into one
//!   deduplicated successor, archives the inputs, and rewrites every
//!   measure reference
//! - **Sync propagator**: routes criterion edits by the usage decision
//!   rule (direct apply for sole consumers, update-all or fork for shared
//!   components)
//! - **Integrity validator**: read-only audit of element links against the
//!   store's usage index
//!
//! # Example
//!
//! ```ignore
//! use octofhir_measure_engine::{AutoLinker, IntegrityValidator};
//!
//! let linker = AutoLinker::new();
//! let links = linker.link(&measure, &store);
//! AutoLinker::stamp(&mut measure, &links);
//!
//! let findings = IntegrityValidator::validate(&measures, &store);
//! assert!(findings.is_empty());
//! ```
//!
//! # Mutation discipline
//!
//! Every engine validates before it mutates. Multi-step rewrites (merge,
//! update-all) either complete locally in full or fail before touching
//! anything; only remote persistence can partially fail, and those
//! failures land in the pending ledger rather than rolling back local
//! state.

pub mod linker;
pub mod merge;
pub mod propagate;
pub mod validate;

// Re-export main types
pub use linker::{AutoLinker, DEFAULT_MIN_CONFIDENCE, LinkMap, LinkOptions, LinkTarget};
pub use merge::{MergeEngine, MergeError, MergeOptions, MergeOutcome, ReferenceRewrite};
pub use propagate::{
    ComponentEdit, DirectApplyOutcome, EditPlan, SyncError, SyncPropagator, UpdateAllReport,
};
pub use validate::IntegrityValidator;
