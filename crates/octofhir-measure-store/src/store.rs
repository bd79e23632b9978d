//! Component registry, usage index, and lifecycle guards

use crate::component::LibraryComponent;
use crate::error::{GuardedOperation, StoreError};
use chrono::Utc;
use indexmap::IndexMap;
use octofhir_measure_model::Measure;
use octofhir_measure_types::{ApprovalStatus, ComponentId, MeasureId};

/// The library component registry
///
/// Holds every component ever created, archived ones included, keyed by
/// their immutable ids. The usage index on each component is derived from
/// the measure forest: [`ComponentStore::rebuild_usage_index`] is the single
/// authoritative recomputation, with [`ComponentStore::note_link`] /
/// [`ComponentStore::note_unlink`] as the incremental fast path after a
/// known single-element change. Multi-element rewrites must finish before
/// the rebuild runs, never mid-way.
#[derive(Debug, Default, Clone)]
pub struct ComponentStore {
    components: IndexMap<ComponentId, LibraryComponent>,
}

impl ComponentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new component
    pub fn insert(&mut self, component: LibraryComponent) -> Result<(), StoreError> {
        debug_assert!(!component.id.is_empty(), "component id must be non-empty");
        if self.components.contains_key(&component.id) {
            return Err(StoreError::DuplicateComponent {
                id: component.id.clone(),
            });
        }
        self.components.insert(component.id.clone(), component);
        Ok(())
    }

    /// Look up a component
    pub fn get(&self, component_id: &str) -> Option<&LibraryComponent> {
        self.components.get(component_id)
    }

    /// Look up a component mutably
    pub fn get_mut(&mut self, component_id: &str) -> Option<&mut LibraryComponent> {
        self.components.get_mut(component_id)
    }

    /// Whether a component id resolves
    pub fn contains(&self, component_id: &str) -> bool {
        self.components.contains_key(component_id)
    }

    /// Number of components, archived included
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// All components in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &LibraryComponent> {
        self.components.values()
    }

    /// First non-archived atomic component carrying the given OID
    pub fn find_by_oid(&self, oid: &str) -> Option<&LibraryComponent> {
        self.components.values().find(|component| {
            !component.is_archived()
                && component
                    .as_atomic()
                    .is_some_and(|a| a.value_sets.iter().any(|vs| vs.oid.as_deref() == Some(oid)))
        })
    }

    /// Approved atomic components, the link candidate pool
    pub fn approved_atomics(&self) -> impl Iterator<Item = &LibraryComponent> {
        self.components
            .values()
            .filter(|c| c.is_approved() && c.is_atomic())
    }

    /// Number of distinct measures using a component, zero when unknown
    pub fn usage_count(&self, component_id: &str) -> usize {
        self.components
            .get(component_id)
            .map_or(0, |c| c.usage.usage_count())
    }

    /// Measures currently using a component, per the usage index
    pub fn measures_using(&self, component_id: &str) -> Vec<MeasureId> {
        self.components
            .get(component_id)
            .map(|c| c.usage.measure_ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Delete a never-used component outright
    ///
    /// Refused when the component is archived (archived components stay
    /// resolvable for audit) or when any measure still uses it.
    pub fn delete_component(&mut self, component_id: &str) -> Result<LibraryComponent, StoreError> {
        let component = self
            .components
            .get(component_id)
            .ok_or_else(|| StoreError::ComponentNotFound {
                id: component_id.to_string(),
            })?;
        if component.is_archived() {
            return Err(StoreError::ComponentArchived {
                id: component_id.to_string(),
            });
        }
        if component.usage.usage_count() > 0 {
            return Err(StoreError::ComponentInUse {
                id: component_id.to_string(),
                operation: GuardedOperation::Delete,
                measure_ids: component.usage.measure_ids.iter().cloned().collect(),
            });
        }
        // shift_remove keeps the remaining insertion order intact
        self.components
            .shift_remove(component_id)
            .ok_or_else(|| StoreError::ComponentNotFound {
                id: component_id.to_string(),
            })
    }

    /// Archive a component explicitly
    ///
    /// Refused while any measure still uses it. Archiving an already
    /// archived component is a no-op.
    pub fn archive_component(&mut self, component_id: &str) -> Result<(), StoreError> {
        let component =
            self.components
                .get_mut(component_id)
                .ok_or_else(|| StoreError::ComponentNotFound {
                    id: component_id.to_string(),
                })?;
        if component.is_archived() {
            return Ok(());
        }
        if component.usage.usage_count() > 0 {
            return Err(StoreError::ComponentInUse {
                id: component_id.to_string(),
                operation: GuardedOperation::Archive,
                measure_ids: component.usage.measure_ids.iter().cloned().collect(),
            });
        }
        component.version.status = ApprovalStatus::Archived;
        component.record_history("archived");
        Ok(())
    }

    /// Archive a component superseded by a merge
    ///
    /// Bypasses the in-use guard: the merge immediately retargets every
    /// reference to the successor, so live usage is expected here.
    pub fn archive_superseded(
        &mut self,
        component_id: &str,
        successor_id: &str,
    ) -> Result<(), StoreError> {
        let component =
            self.components
                .get_mut(component_id)
                .ok_or_else(|| StoreError::ComponentNotFound {
                    id: component_id.to_string(),
                })?;
        component.version.status = ApprovalStatus::Archived;
        component.record_history(format!("superseded by {successor_id}"));
        Ok(())
    }

    /// Rebuild every component's usage index from the measure forest
    ///
    /// The single authoritative recomputation: clears all usage entries,
    /// then rescans every measure's criteria trees. Dangling element
    /// references are skipped here and reported by the validator.
    pub fn rebuild_usage_index<'a, I>(&mut self, measures: I)
    where
        I: IntoIterator<Item = &'a Measure>,
    {
        for component in self.components.values_mut() {
            component.usage.measure_ids.clear();
        }
        for measure in measures {
            for component_id in measure.linked_component_ids() {
                if let Some(component) = self.components.get_mut(&component_id) {
                    component.usage.measure_ids.insert(measure.id.clone());
                }
            }
        }
        log::debug!("usage index rebuilt across {} components", self.components.len());
    }

    /// Incremental usage update after linking one element
    ///
    /// Returns whether the index changed. Only valid after a single-element
    /// change; multi-element operations must end with a full rebuild.
    pub fn note_link(&mut self, component_id: &str, measure_id: &str) -> bool {
        let Some(component) = self.components.get_mut(component_id) else {
            return false;
        };
        let inserted = component.usage.measure_ids.insert(measure_id.to_string());
        if inserted {
            component.usage.last_used_at = Some(Utc::now());
        }
        inserted
    }

    /// Incremental usage update after unlinking the last element of a measure
    ///
    /// Returns whether the index changed. The caller is responsible for
    /// checking that no other element of the measure still references the
    /// component; when in doubt, rebuild.
    pub fn note_unlink(&mut self, component_id: &str, measure_id: &str) -> bool {
        let Some(component) = self.components.get_mut(component_id) else {
            return false;
        };
        component.usage.measure_ids.shift_remove(measure_id)
    }

    /// Drain all components, oldest first, for snapshotting
    pub fn to_components(&self) -> Vec<LibraryComponent> {
        self.components.values().cloned().collect()
    }

    /// Build a store from snapshot components
    pub fn from_components(
        components: impl IntoIterator<Item = LibraryComponent>,
    ) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for component in components {
            store.insert(component)?;
        }
        Ok(store)
    }
}
