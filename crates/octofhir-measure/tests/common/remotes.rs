//! Remote persistence doubles with configurable failure budgets

use async_trait::async_trait;
use octofhir_measure::model::Measure;
use octofhir_measure::store::{LibraryComponent, RemoteError, RemoteStore, SyncOperation};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Remote that fails a configured number of times per entity, then succeeds
///
/// Attempts are counted per entity id so tests can assert exactly which
/// writes were retried and how often.
pub struct FlakyRemote {
    budgets: RwLock<HashMap<String, usize>>,
    attempts: RwLock<HashMap<String, usize>>,
}

impl FlakyRemote {
    pub fn new() -> Self {
        Self {
            budgets: RwLock::new(HashMap::new()),
            attempts: RwLock::new(HashMap::new()),
        }
    }

    /// Make the next `failures` writes for this entity fail
    pub fn fail_times(self, entity_id: impl Into<String>, failures: usize) -> Self {
        self.budgets.write().insert(entity_id.into(), failures);
        self
    }

    /// How many writes this entity has seen
    pub fn attempts(&self, entity_id: &str) -> usize {
        self.attempts.read().get(entity_id).copied().unwrap_or(0)
    }

    fn attempt(&self, entity_id: &str) -> Result<(), RemoteError> {
        *self
            .attempts
            .write()
            .entry(entity_id.to_string())
            .or_insert(0) += 1;
        let mut budgets = self.budgets.write();
        match budgets.get_mut(entity_id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(RemoteError::Unavailable(format!(
                    "injected failure for {entity_id}"
                )))
            }
            _ => Ok(()),
        }
    }
}

impl Default for FlakyRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for FlakyRemote {
    async fn persist_component(
        &self,
        _operation: SyncOperation,
        component: &LibraryComponent,
    ) -> Result<(), RemoteError> {
        self.attempt(&component.id)
    }

    async fn delete_component(&self, component_id: &str) -> Result<(), RemoteError> {
        self.attempt(component_id)
    }

    async fn persist_measure(&self, measure: &Measure) -> Result<(), RemoteError> {
        self.attempt(&measure.id)
    }
}
