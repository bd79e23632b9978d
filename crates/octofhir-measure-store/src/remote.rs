//! External persistence and terminology boundaries
//!
//! Local mutation always succeeds first; these traits model the remote
//! mirror and terminology source behind it. A remote failure never rolls
//! back local state, it only lands in the pending-sync ledger.

use crate::component::LibraryComponent;
use crate::pending::SyncOperation;
use async_trait::async_trait;
use octofhir_measure_model::Measure;
use octofhir_measure_types::{CodeReference, ValueSet};
use thiserror::Error;

/// Errors surfaced by remote boundaries
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The remote rejected or failed a persistence call
    #[error("remote persistence failed: {0}")]
    Persistence(String),

    /// The terminology source failed an expansion
    #[error("terminology expansion failed for {oid}: {reason}")]
    Terminology {
        /// OID being expanded
        oid: String,
        /// What went wrong
        reason: String,
    },

    /// The remote could not be reached
    #[error("remote unavailable: {0}")]
    Unavailable(String),
}

/// The remote mirror of the component library
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Persist a component create, update, or archive
    async fn persist_component(
        &self,
        operation: SyncOperation,
        component: &LibraryComponent,
    ) -> Result<(), RemoteError>;

    /// Delete a component remotely
    async fn delete_component(&self, component_id: &str) -> Result<(), RemoteError>;

    /// Persist a measure after its criteria trees changed
    async fn persist_measure(&self, measure: &Measure) -> Result<(), RemoteError>;
}

/// Remote that accepts everything; local-only mode
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRemote;

#[async_trait]
impl RemoteStore for NullRemote {
    async fn persist_component(
        &self,
        _operation: SyncOperation,
        _component: &LibraryComponent,
    ) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn delete_component(&self, _component_id: &str) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn persist_measure(&self, _measure: &Measure) -> Result<(), RemoteError> {
        Ok(())
    }
}

/// A source of value set expansions, e.g. VSAC
#[async_trait]
pub trait TerminologyProvider: Send + Sync {
    /// Expand an OID into its member codes
    ///
    /// An empty expansion is a valid, if degraded, result.
    async fn expand(&self, oid: &str) -> Result<Vec<CodeReference>, RemoteError>;
}

/// Hydrate a thin value set from a terminology source
///
/// Returns whether the set was hydrated. Sets that already carry codes, or
/// carry no OID to expand, are left untouched.
pub async fn hydrate_value_set(
    value_set: &mut ValueSet,
    provider: &dyn TerminologyProvider,
) -> Result<bool, RemoteError> {
    if !value_set.is_thin() {
        return Ok(false);
    }
    let Some(oid) = value_set.oid.clone() else {
        return Ok(false);
    };
    let codes = provider.expand(&oid).await?;
    value_set.total_code_count = Some(codes.len());
    value_set.codes = codes;
    value_set.verified = true;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider(Vec<CodeReference>);

    #[async_trait]
    impl TerminologyProvider for FixedProvider {
        async fn expand(&self, _oid: &str) -> Result<Vec<CodeReference>, RemoteError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_hydrates_thin_set() {
        let provider = FixedProvider(vec![CodeReference::new("LOINC", "4548-4")]);
        let mut vs = ValueSet::new("vs-1", "HbA1c").with_oid("2.16.840.1.113883.3.464.1003.198");
        assert!(vs.is_thin());

        let hydrated = hydrate_value_set(&mut vs, &provider).await.unwrap();
        assert!(hydrated);
        assert!(vs.verified);
        assert_eq!(vs.code_count(), 1);
        assert_eq!(vs.total_code_count, Some(1));
    }

    #[tokio::test]
    async fn test_skips_already_hydrated() {
        let provider = FixedProvider(vec![CodeReference::new("LOINC", "4548-4")]);
        let mut vs = ValueSet::new("vs-1", "HbA1c")
            .with_oid("2.16.840.1.113883.3.464.1003.198")
            .with_code(CodeReference::new("LOINC", "17856-6"));

        let hydrated = hydrate_value_set(&mut vs, &provider).await.unwrap();
        assert!(!hydrated);
        assert_eq!(vs.codes[0].code, "17856-6");
    }

    #[tokio::test]
    async fn test_empty_expansion_is_valid() {
        let provider = FixedProvider(Vec::new());
        let mut vs = ValueSet::new("vs-1", "HbA1c").with_oid("2.16.840.1.113883.3.464.1003.198");

        let hydrated = hydrate_value_set(&mut vs, &provider).await.unwrap();
        assert!(hydrated);
        assert!(vs.codes.is_empty());
        assert_eq!(vs.total_code_count, Some(0));
    }
}
