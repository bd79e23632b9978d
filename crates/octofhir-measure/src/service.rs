//! Embedder-facing service owning the library, the measures, and the sync ledger

use indexmap::IndexMap;
use octofhir_measure_diagnostics::AuditFinding;
use octofhir_measure_engine::{
    AutoLinker, ComponentEdit, DirectApplyOutcome, EditPlan, IntegrityValidator, LinkMap,
    LinkOptions, MergeEngine, MergeError, MergeOptions, ReferenceRewrite, SyncError,
    SyncPropagator, UpdateAllReport,
};
use octofhir_measure_model::Measure;
use octofhir_measure_store::{
    ComponentStore, LibraryComponent, PendingSyncTracker, RemoteStore, RetryReport, Snapshot,
    SnapshotError, StoreError, SyncOperation,
};
use octofhir_measure_types::{ComponentId, MeasureId};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the service
#[derive(Debug, Error)]
pub enum LibraryError {
    /// No measure with this id
    #[error("measure '{0}' not found")]
    MeasureNotFound(MeasureId),

    /// A store guard or lookup failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A merge precondition or merge-side failure
    #[error(transparent)]
    Merge(#[from] MergeError),

    /// A propagation failure
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Snapshot persistence failure
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Everything a merge did, including the post-merge audit
#[derive(Debug, Clone)]
pub struct MergeReport {
    /// Id of the merged component
    pub component_id: ComponentId,
    /// Input ids archived as superseded
    pub archived: Vec<ComponentId>,
    /// How many measures and elements were retargeted
    pub rewrite: ReferenceRewrite,
    /// Validator findings after rewrite and rebuild; empty means converged
    pub findings: Vec<AuditFinding>,
}

/// The measure library service
///
/// Owns the component store, the measure forest, and the pending-sync
/// ledger, and routes every cross-collection mutation through the engine
/// APIs so the two collections can never be edited past each other. Element
/// links and usage entries change only through these methods.
#[derive(Debug, Default)]
pub struct MeasureLibrary {
    store: ComponentStore,
    measures: IndexMap<MeasureId, Measure>,
    pending: PendingSyncTracker,
    linker: AutoLinker,
}

impl MeasureLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty library with explicit linker options
    pub fn with_link_options(options: LinkOptions) -> Self {
        Self {
            linker: AutoLinker::with_options(options),
            ..Self::default()
        }
    }

    /// Look up a component
    pub fn component(&self, component_id: &str) -> Option<&LibraryComponent> {
        self.store.get(component_id)
    }

    /// All components in insertion order, archived ones included
    pub fn components(&self) -> impl Iterator<Item = &LibraryComponent> {
        self.store.iter()
    }

    /// Number of components, archived ones included
    pub fn component_count(&self) -> usize {
        self.store.len()
    }

    /// Look up a measure
    pub fn measure(&self, measure_id: &str) -> Option<&Measure> {
        self.measures.get(measure_id)
    }

    /// All measures in ingestion order
    pub fn measures(&self) -> impl Iterator<Item = &Measure> {
        self.measures.values()
    }

    /// Number of measures
    pub fn measure_count(&self) -> usize {
        self.measures.len()
    }

    /// Distinct measures using a component, per the usage index
    pub fn usage_count(&self, component_id: &str) -> usize {
        self.store.usage_count(component_id)
    }

    /// Measure ids using a component, per the usage index
    pub fn measures_using(&self, component_id: &str) -> Vec<MeasureId> {
        self.store.measures_using(component_id)
    }

    /// The outstanding remote-persistence ledger
    pub fn pending_sync(&self) -> &PendingSyncTracker {
        &self.pending
    }

    /// Add an authored component to the library
    pub fn add_component(&mut self, component: LibraryComponent) -> Result<(), LibraryError> {
        self.store.insert(component)?;
        Ok(())
    }

    /// Seed components from an external source, skipping ones already present
    ///
    /// A candidate is dropped when its id is taken or a live component
    /// already carries one of its OIDs. Returns how many were added.
    pub fn seed_components(
        &mut self,
        components: impl IntoIterator<Item = LibraryComponent>,
    ) -> usize {
        let mut added = 0;
        for component in components {
            if self.store.contains(&component.id) {
                continue;
            }
            let oid_taken = component
                .oid()
                .is_some_and(|oid| self.store.find_by_oid(oid).is_some());
            if oid_taken {
                continue;
            }
            if self.store.insert(component).is_ok() {
                added += 1;
            }
        }
        added
    }

    /// Ingest a freshly parsed measure
    ///
    /// Runs the auto-linker once, stamps the confident links onto the tree,
    /// and rebuilds the usage index. The returned map includes `NeedsCodes`
    /// sentinels for elements whose best match had no codes. Re-ingesting a
    /// measure id replaces the previous version.
    pub fn ingest_measure(&mut self, measure: Measure) -> LinkMap {
        let links = self.linker.link(&measure, &self.store);
        let mut measure = measure;
        AutoLinker::stamp(&mut measure, &links);
        self.measures.insert(measure.id.clone(), measure);
        self.store.rebuild_usage_index(self.measures.values());
        links
    }

    /// Run the auto-linker again over one measure
    ///
    /// Useful after seeding new components. Linking is idempotent, so
    /// already-linked elements are untouched and a second run right after
    /// the first returns an empty map.
    pub fn relink_measure(&mut self, measure_id: &str) -> Result<LinkMap, LibraryError> {
        let measure = self
            .measures
            .get(measure_id)
            .ok_or_else(|| LibraryError::MeasureNotFound(measure_id.to_string()))?;
        let links = self.linker.link(measure, &self.store);
        let measure = self
            .measures
            .get_mut(measure_id)
            .ok_or_else(|| LibraryError::MeasureNotFound(measure_id.to_string()))?;
        let stamped = AutoLinker::stamp(measure, &links);
        if stamped > 0 {
            self.store.rebuild_usage_index(self.measures.values());
        }
        Ok(links)
    }

    /// Remove a measure, releasing its usage entries
    pub fn remove_measure(&mut self, measure_id: &str) -> Option<Measure> {
        let removed = self.measures.shift_remove(measure_id);
        if removed.is_some() {
            self.store.rebuild_usage_index(self.measures.values());
        }
        removed
    }

    /// Decide how an edit to one element should proceed
    pub fn propose_edit(
        &self,
        measure_id: &str,
        element_id: &str,
        edit: &ComponentEdit,
    ) -> Result<EditPlan, LibraryError> {
        Ok(SyncPropagator::propose_edit(
            &self.store,
            &self.measures,
            measure_id,
            element_id,
            edit,
        )?)
    }

    /// Apply an edit the decision rule cleared for direct application
    pub fn apply_direct(
        &mut self,
        measure_id: &str,
        element_id: &str,
        edit: &ComponentEdit,
    ) -> Result<DirectApplyOutcome, LibraryError> {
        let measure = self
            .measures
            .get_mut(measure_id)
            .ok_or_else(|| LibraryError::MeasureNotFound(measure_id.to_string()))?;
        Ok(SyncPropagator::apply_direct(
            &mut self.store,
            measure,
            element_id,
            edit,
        )?)
    }

    /// Apply an edit to a shared component and every consuming measure
    pub async fn apply_update_all(
        &mut self,
        component_id: &str,
        edit: ComponentEdit,
        remote: &dyn RemoteStore,
    ) -> Result<UpdateAllReport, LibraryError> {
        Ok(SyncPropagator::apply_update_all(
            &mut self.store,
            &mut self.measures,
            component_id,
            edit,
            remote,
            &mut self.pending,
        )
        .await?)
    }

    /// Fork a shared component for one measure and apply the edit to the fork
    pub fn fork_for_measure(
        &mut self,
        measure_id: &str,
        element_id: &str,
        component_id: &str,
        edit: &ComponentEdit,
    ) -> Result<ComponentId, LibraryError> {
        let measure = self
            .measures
            .get_mut(measure_id)
            .ok_or_else(|| LibraryError::MeasureNotFound(measure_id.to_string()))?;
        Ok(SyncPropagator::apply_fork_new_version(
            &mut self.store,
            measure,
            component_id,
            element_id,
            edit,
        )?)
    }

    /// Merge components, retarget every reference, rebuild, and audit
    ///
    /// Merge and reference rewrite remain two checkpoints under the hood; a
    /// merge failure leaves everything untouched, and the report's findings
    /// confirm whether the rewrite converged.
    pub fn merge_components(
        &mut self,
        component_ids: &[ComponentId],
        options: MergeOptions,
    ) -> Result<MergeReport, LibraryError> {
        let outcome = MergeEngine::merge(&mut self.store, component_ids, options)?;
        let rewrite = MergeEngine::update_measure_references_after_merge(
            self.measures.values_mut(),
            &outcome.archived,
            &outcome.component.id,
        );
        self.store.rebuild_usage_index(self.measures.values());
        let findings = IntegrityValidator::validate(&self.measures, &self.store);
        Ok(MergeReport {
            component_id: outcome.component.id,
            archived: outcome.archived,
            rewrite,
            findings,
        })
    }

    /// Delete a never-used component, subject to the in-use guard
    pub fn delete_component(
        &mut self,
        component_id: &str,
    ) -> Result<LibraryComponent, LibraryError> {
        Ok(self.store.delete_component(component_id)?)
    }

    /// Archive a component, subject to the in-use guard
    pub fn archive_component(&mut self, component_id: &str) -> Result<(), LibraryError> {
        Ok(self.store.archive_component(component_id)?)
    }

    /// Record a failed remote write reported by the embedder's transport
    pub fn record_sync_failure(
        &mut self,
        entity_id: impl Into<String>,
        operation: SyncOperation,
        error: impl Into<String>,
    ) {
        self.pending.record_failure(entity_id, operation, error);
    }

    /// Retry every outstanding remote write, up to the per-entity cap
    pub async fn retry_pending_sync(&mut self, remote: &dyn RemoteStore) -> RetryReport {
        self.pending
            .retry_pending(remote, &self.store, &self.measures)
            .await
    }

    /// Re-enable retries for an entity that exhausted its attempts
    pub fn reset_pending_sync(&mut self, entity_id: &str) {
        self.pending.reset(entity_id);
    }

    /// Audit every measure/component relationship
    pub fn validate(&self) -> Vec<AuditFinding> {
        IntegrityValidator::validate(&self.measures, &self.store)
    }

    /// Recompute the usage index from the measure forest
    pub fn rebuild_usage_index(&mut self) {
        self.store.rebuild_usage_index(self.measures.values());
    }

    /// Capture the full library state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.store.to_components(),
            self.measures.values().cloned().collect(),
        )
    }

    /// Write the full library state to a file
    pub fn save_to(&self, path: &Path) -> Result<(), LibraryError> {
        Ok(self.snapshot().save_to(path)?)
    }

    /// Rebuild a library from a snapshot
    ///
    /// The usage index is recomputed from the loaded measures rather than
    /// trusted from the file.
    pub fn restore(snapshot: Snapshot) -> Result<Self, LibraryError> {
        let mut library = Self {
            store: ComponentStore::from_components(snapshot.components)?,
            measures: snapshot
                .measures
                .into_iter()
                .map(|measure| (measure.id.clone(), measure))
                .collect(),
            ..Self::default()
        };
        library.store.rebuild_usage_index(library.measures.values());
        Ok(library)
    }

    /// Read a library from a snapshot file
    pub fn load_from(path: &Path) -> Result<Self, LibraryError> {
        Self::restore(Snapshot::load_from(path)?)
    }
}

/// Handle for embedders that share one library across tasks
///
/// Engine operations cross-reference components and measures by id with no
/// optimistic-concurrency checks, so parallel embedders must serialize
/// writers over the whole library. One lock around the service is that
/// serialization.
pub type SharedLibrary = Arc<RwLock<MeasureLibrary>>;

/// Wrap a library for shared use
pub fn shared(library: MeasureLibrary) -> SharedLibrary {
    Arc::new(RwLock::new(library))
}
