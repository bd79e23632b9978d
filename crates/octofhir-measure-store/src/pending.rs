//! Pending-sync ledger for failed remote writes

use crate::remote::RemoteStore;
use crate::store::ComponentStore;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use octofhir_measure_model::Measure;
use octofhir_measure_types::MeasureId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Retry attempts allowed per entry before it is parked as exhausted
pub const MAX_SYNC_RETRIES: u32 = 3;

/// What kind of remote write is outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncOperation {
    CreateComponent,
    UpdateComponent,
    ArchiveComponent,
    DeleteComponent,
    UpdateMeasure,
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CreateComponent => "create component",
            Self::UpdateComponent => "update component",
            Self::ArchiveComponent => "archive component",
            Self::DeleteComponent => "delete component",
            Self::UpdateMeasure => "update measure",
        };
        write!(f, "{label}")
    }
}

/// One outstanding remote write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSync {
    /// Operation to replay
    pub operation: SyncOperation,
    /// Retries performed so far; the original failed attempt is not counted
    pub retry_count: u32,
    /// Most recent failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// When the entry was first recorded
    pub recorded_at: DateTime<Utc>,
}

/// Outcome of one [`PendingSyncTracker::retry_pending`] round
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RetryReport {
    /// Entries synced this round, or resolved because the local entity is gone
    pub resolved: Vec<String>,
    /// Entries retried and failed again, still under the cap
    pub failed: Vec<String>,
    /// Entries parked at the retry cap; an explicit reset is required
    pub exhausted: Vec<String>,
}

impl RetryReport {
    /// Whether every entry was resolved
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.exhausted.is_empty()
    }
}

/// Ledger of remote writes that failed and await replay
///
/// Local mutation always succeeds first; a failed remote write lands here
/// keyed by the entity id. Entries at the retry cap stay visible as failed
/// rather than being dropped, so a component can never silently exist
/// locally while missing remotely.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSyncTracker {
    entries: IndexMap<String, PendingSync>,
}

impl PendingSyncTracker {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed remote write
    ///
    /// A repeated failure for the same entity bumps its retry count and
    /// keeps the newest operation, which persists the full entity state
    /// anyway.
    pub fn record_failure(
        &mut self,
        entity_id: impl Into<String>,
        operation: SyncOperation,
        error: impl Into<String>,
    ) {
        let entity_id = entity_id.into();
        match self.entries.get_mut(&entity_id) {
            Some(entry) => {
                entry.retry_count += 1;
                entry.operation = operation;
                entry.last_error = Some(error.into());
            }
            None => {
                self.entries.insert(
                    entity_id,
                    PendingSync {
                        operation,
                        retry_count: 0,
                        last_error: Some(error.into()),
                        recorded_at: Utc::now(),
                    },
                );
            }
        }
    }

    /// Remove an entry after a successful remote write
    pub fn mark_synced(&mut self, entity_id: &str) {
        self.entries.shift_remove(entity_id);
    }

    /// Whether an entry has used up its retries
    pub fn is_exhausted(&self, entity_id: &str) -> bool {
        self.entries
            .get(entity_id)
            .is_some_and(|e| e.retry_count >= MAX_SYNC_RETRIES)
    }

    /// Reset an entry's retry counter for an explicit user-triggered retry
    pub fn reset(&mut self, entity_id: &str) {
        if let Some(entry) = self.entries.get_mut(entity_id) {
            entry.retry_count = 0;
        }
    }

    /// Look up an entry
    pub fn get(&self, entity_id: &str) -> Option<&PendingSync> {
        self.entries.get(entity_id)
    }

    /// All outstanding entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PendingSync)> {
        self.entries.iter()
    }

    /// Number of outstanding entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replay every outstanding entry under the retry cap, once each
    ///
    /// Each entry is independently awaited; a success removes it, a failure
    /// bumps its counter. Entries over the cap are skipped and reported as
    /// exhausted. Entries whose local entity no longer exists are resolved,
    /// since there is nothing left to mirror.
    pub async fn retry_pending(
        &mut self,
        remote: &dyn RemoteStore,
        store: &ComponentStore,
        measures: &IndexMap<MeasureId, Measure>,
    ) -> RetryReport {
        let mut report = RetryReport::default();

        let snapshot: Vec<(String, SyncOperation)> = self
            .entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.operation))
            .collect();

        for (entity_id, operation) in snapshot {
            if self.is_exhausted(&entity_id) {
                report.exhausted.push(entity_id);
                continue;
            }

            let outcome = match operation {
                SyncOperation::CreateComponent
                | SyncOperation::UpdateComponent
                | SyncOperation::ArchiveComponent => match store.get(&entity_id) {
                    Some(component) => remote.persist_component(operation, component).await,
                    None => {
                        self.mark_synced(&entity_id);
                        report.resolved.push(entity_id);
                        continue;
                    }
                },
                SyncOperation::DeleteComponent => remote.delete_component(&entity_id).await,
                SyncOperation::UpdateMeasure => match measures.get(&entity_id) {
                    Some(measure) => remote.persist_measure(measure).await,
                    None => {
                        self.mark_synced(&entity_id);
                        report.resolved.push(entity_id);
                        continue;
                    }
                },
            };

            match outcome {
                Ok(()) => {
                    self.mark_synced(&entity_id);
                    report.resolved.push(entity_id);
                }
                Err(err) => {
                    self.record_failure(&entity_id, operation, err.to_string());
                    if self.is_exhausted(&entity_id) {
                        log::warn!("sync retries exhausted for {entity_id}");
                        report.exhausted.push(entity_id);
                    } else {
                        report.failed.push(entity_id);
                    }
                }
            }
        }

        log::debug!(
            "retry pass: {} resolved, {} failed, {} exhausted",
            report.resolved.len(),
            report.failed.len(),
            report.exhausted.len()
        );
        report
    }
}
