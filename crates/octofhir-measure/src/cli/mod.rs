//! CLI functionality for the measure library tool
//!
//! This module contains all CLI-related functionality including:
//! - Snapshot auditing
//! - Usage reporting
//! - Component merging
//! - Output formatting

#[cfg(feature = "cli")]
pub mod merge;
#[cfg(feature = "cli")]
pub mod output;
#[cfg(feature = "cli")]
pub mod usage;
#[cfg(feature = "cli")]
pub mod validate;
