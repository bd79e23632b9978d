//! Library component store
//!
//! This crate provides:
//! - Component records with version history and derived usage
//! - The component registry with in-use lifecycle guards
//! - The usage index: full rebuild plus incremental fast path
//! - The pending-sync ledger replaying failed remote writes
//! - Remote store and terminology boundary traits
//! - Whole-library snapshot persistence

pub mod component;
pub mod error;
pub mod pending;
pub mod remote;
pub mod snapshot;
pub mod store;

pub use component::*;
pub use error::*;
pub use pending::*;
pub use remote::*;
pub use snapshot::*;
pub use store::*;
