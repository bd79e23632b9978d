//! Error codes and audit findings for the measure library engine
//!
//! This crate provides:
//! - Structured error codes with range-based categories
//! - Severity levels for reported conditions
//! - `AuditFinding`, the record produced by the referential integrity validator

mod error_code;
mod finding;

pub use error_code::*;
pub use finding::*;
