//! Common test utilities for synchronization scenarios
//!
//! This module provides shared testing infrastructure including:
//! - Fixture builders for components and measures
//! - Remote persistence doubles with configurable failure budgets

pub mod fixtures;
pub mod remotes;

pub use fixtures::*;
pub use remotes::*;
