//! Pending-sync ledger replay against a mocked remote

use indexmap::IndexMap;
use mockall::mock;
use octofhir_measure_model::Measure;
use octofhir_measure_store::{
    AtomicCriteria, ComponentStore, LibraryComponent, MAX_SYNC_RETRIES, PendingSyncTracker,
    RemoteError, RemoteStore, SyncOperation,
};
use octofhir_measure_types::{CodeReference, MeasureId, TimingExpression, ValueSet};

mock! {
    Remote {}

    #[async_trait::async_trait]
    impl RemoteStore for Remote {
        async fn persist_component(
            &self,
            operation: SyncOperation,
            component: &LibraryComponent,
        ) -> Result<(), RemoteError>;

        async fn delete_component(&self, component_id: &str) -> Result<(), RemoteError>;

        async fn persist_measure(&self, measure: &Measure) -> Result<(), RemoteError>;
    }
}

fn store_with_component(id: &str) -> ComponentStore {
    let mut store = ComponentStore::new();
    store
        .insert(LibraryComponent::atomic(
            id,
            "HbA1c Test",
            AtomicCriteria::new(
                ValueSet::new("vs-1", "HbA1c").with_code(CodeReference::new("LOINC", "4548-4")),
                TimingExpression::anytime(),
            ),
        ))
        .unwrap();
    store
}

fn no_measures() -> IndexMap<MeasureId, Measure> {
    IndexMap::new()
}

#[tokio::test]
async fn retry_resolves_after_transient_failures() {
    let store = store_with_component("comp-1");
    let measures = no_measures();

    let mut tracker = PendingSyncTracker::new();
    tracker.record_failure("comp-1", SyncOperation::UpdateComponent, "initial failure");

    let mut remote = MockRemote::new();
    let mut seq = mockall::Sequence::new();
    remote
        .expect_persist_component()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Err(RemoteError::Unavailable("still down".into())));
    remote
        .expect_persist_component()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));

    let first = tracker.retry_pending(&remote, &store, &measures).await;
    assert_eq!(first.failed, vec!["comp-1".to_string()]);
    assert_eq!(tracker.get("comp-1").unwrap().retry_count, 1);

    let second = tracker.retry_pending(&remote, &store, &measures).await;
    assert_eq!(second.resolved, vec!["comp-1".to_string()]);
    assert!(second.is_clean());
    assert!(tracker.is_empty());
}

#[tokio::test]
async fn retry_cap_parks_entry_without_further_calls() {
    let store = store_with_component("comp-1");
    let measures = no_measures();

    let mut tracker = PendingSyncTracker::new();
    tracker.record_failure("comp-1", SyncOperation::UpdateComponent, "initial failure");

    // exactly MAX_SYNC_RETRIES calls reach the remote, then the entry is parked
    let mut remote = MockRemote::new();
    remote
        .expect_persist_component()
        .times(MAX_SYNC_RETRIES as usize)
        .returning(|_, _| Err(RemoteError::Unavailable("down".into())));

    for round in 1..=MAX_SYNC_RETRIES {
        let report = tracker.retry_pending(&remote, &store, &measures).await;
        if round < MAX_SYNC_RETRIES {
            assert_eq!(report.failed, vec!["comp-1".to_string()]);
        } else {
            assert_eq!(report.exhausted, vec!["comp-1".to_string()]);
        }
    }

    // the parked entry stays visible and is skipped, not retried
    let report = tracker.retry_pending(&remote, &store, &measures).await;
    assert_eq!(report.exhausted, vec!["comp-1".to_string()]);
    assert_eq!(tracker.len(), 1);
}

#[tokio::test]
async fn reset_reenables_parked_entry() {
    let store = store_with_component("comp-1");
    let measures = no_measures();

    let mut tracker = PendingSyncTracker::new();
    tracker.record_failure("comp-1", SyncOperation::UpdateComponent, "down");
    for _ in 0..MAX_SYNC_RETRIES {
        tracker.record_failure("comp-1", SyncOperation::UpdateComponent, "down");
    }
    assert!(tracker.is_exhausted("comp-1"));

    let mut remote = MockRemote::new();
    remote
        .expect_persist_component()
        .times(1)
        .returning(|_, _| Ok(()));

    tracker.reset("comp-1");
    let report = tracker.retry_pending(&remote, &store, &measures).await;
    assert_eq!(report.resolved, vec!["comp-1".to_string()]);
    assert!(tracker.is_empty());
}

#[tokio::test]
async fn orphaned_entry_resolves_without_remote_call() {
    // component was deleted locally after the failure was recorded
    let store = ComponentStore::new();
    let measures = no_measures();

    let mut tracker = PendingSyncTracker::new();
    tracker.record_failure("comp-gone", SyncOperation::UpdateComponent, "down");

    let remote = MockRemote::new();
    let report = tracker.retry_pending(&remote, &store, &measures).await;
    assert_eq!(report.resolved, vec!["comp-gone".to_string()]);
    assert!(tracker.is_empty());
}

#[tokio::test]
async fn measure_entries_replay_against_measure_endpoint() {
    let store = ComponentStore::new();
    let mut measures = IndexMap::new();
    measures.insert(
        "m-1".to_string(),
        Measure::new("m-1", "Diabetes Care"),
    );

    let mut tracker = PendingSyncTracker::new();
    tracker.record_failure("m-1", SyncOperation::UpdateMeasure, "down");

    let mut remote = MockRemote::new();
    remote
        .expect_persist_measure()
        .times(1)
        .withf(|measure| measure.id == "m-1")
        .returning(|_| Ok(()));

    let report = tracker.retry_pending(&remote, &store, &measures).await;
    assert!(report.is_clean());
    assert_eq!(report.resolved, vec!["m-1".to_string()]);
}

#[tokio::test]
async fn delete_entries_replay_against_delete_endpoint() {
    let store = ComponentStore::new();
    let measures = no_measures();

    let mut tracker = PendingSyncTracker::new();
    tracker.record_failure("comp-1", SyncOperation::DeleteComponent, "down");

    let mut remote = MockRemote::new();
    remote
        .expect_delete_component()
        .times(1)
        .withf(|id| id == "comp-1")
        .returning(|_| Ok(()));

    let report = tracker.retry_pending(&remote, &store, &measures).await;
    assert!(report.is_clean());
    assert!(tracker.is_empty());
}
