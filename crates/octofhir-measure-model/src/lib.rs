//! Measure and criteria tree model
//!
//! This crate provides:
//! - Data elements, the criteria tree leaves carrying terminology and timing
//! - Logical clauses and the recursive criteria tree
//! - Populations and measures
//! - A single tree fold reused by linking, merging, and propagation

pub mod clause;
pub mod element;
pub mod measure;

pub use clause::*;
pub use element::*;
pub use measure::*;
