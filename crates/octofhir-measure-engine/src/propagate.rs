//! Propagating criterion edits between measures and shared components

use indexmap::IndexMap;
use octofhir_measure_diagnostics::{
    CQM0302, CQM0303, CQM0304, CQM0305, CQM0306, ErrorCode,
};
use octofhir_measure_model::{DataElement, Measure};
use octofhir_measure_store::{
    ComponentKind, ComponentStore, LibraryComponent, PendingSyncTracker, RemoteStore, StoreError,
    SyncOperation, generate_component_id,
};
use octofhir_measure_types::{
    ApprovalStatus, CodeReference, ComponentId, MeasureId, TimingExpression, TimingRelation,
    TimingWindow,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One editable field of a criterion
///
/// Every variant maps to the subset of element and component fields it
/// affects. Measure-specific overrides with no component counterpart, such
/// as a narrative override, are not routed through the propagator at all;
/// callers apply those to the element directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum ComponentEdit {
    /// Replace the timing expression
    Timing(TimingExpression),
    /// Replace only the timing window
    Window(TimingWindow),
    /// Replace the primary value set's codes
    Codes(Vec<CodeReference>),
    /// Replace the primary value set's OID
    Oid(String),
    /// Rename the primary value set
    ValueSetName(String),
    /// Set negation
    Negation(bool),
    /// Replace the description
    Description(String),
}

impl fmt::Display for ComponentEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Timing(_) => "timing",
            Self::Window(_) => "timing window",
            Self::Codes(_) => "codes",
            Self::Oid(_) => "OID",
            Self::ValueSetName(_) => "value set name",
            Self::Negation(_) => "negation",
            Self::Description(_) => "description",
        };
        write!(f, "{label}")
    }
}

/// What the decision rule says about a proposed edit
#[derive(Debug, Clone, PartialEq)]
pub enum EditPlan {
    /// Apply with no prompt: the element is unlinked, its link dangles, the
    /// edit has no component counterpart, or the component serves at most
    /// this one measure
    DirectApply,
    /// The component is shared; the edit is held until the caller picks
    /// update-all or fork-new-version
    RequiresDecision {
        /// The shared component
        component_id: ComponentId,
        /// Measures currently using it
        usage_count: usize,
        /// Their ids, for the caller's prompt
        consuming_measures: Vec<MeasureId>,
    },
}

/// What a direct apply actually touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectApplyOutcome {
    /// Whether the linked component was updated alongside the element
    pub component_updated: bool,
}

/// Outcome of an update-all propagation
///
/// Local rewrites always complete in full; only the remote mirror can
/// partially fail. Failed measures stay listed here and in the pending
/// ledger, so a retry covers exactly the remainder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateAllReport {
    /// The edited component
    pub component_id: ComponentId,
    /// Elements rewritten across all consuming measures
    pub elements_rewritten: usize,
    /// Whether the component itself reached the remote
    pub component_synced: bool,
    /// Measures persisted remotely
    pub synced_measures: Vec<MeasureId>,
    /// Measures whose remote write failed
    pub failed_measures: Vec<MeasureId>,
}

impl UpdateAllReport {
    /// Whether everything reached the remote
    pub fn is_fully_synced(&self) -> bool {
        self.component_synced && self.failed_measures.is_empty()
    }
}

/// Errors raised by the propagator
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyncError {
    /// No measure with this id
    #[error("measure '{0}' not found")]
    MeasureNotFound(MeasureId),

    /// No element with this id in the measure
    #[error("element '{element_id}' not found in measure '{measure_id}'")]
    ElementNotFound {
        /// Measure searched
        measure_id: MeasureId,
        /// Missing element
        element_id: String,
    },

    /// No component with this id
    #[error("component '{0}' not found")]
    ComponentNotFound(ComponentId),

    /// The edit has no counterpart on this component kind
    #[error("{edit} edit is not representable on component '{component_id}'")]
    EditNotRepresentable {
        /// Target component
        component_id: ComponentId,
        /// Edit field label
        edit: String,
    },

    /// The component is shared and the edit was held, not applied
    #[error(
        "edit held: component '{component_id}' is used by {usage_count} measures and requires a decision"
    )]
    EditHeld {
        /// The shared component
        component_id: ComponentId,
        /// Its usage count at refusal time
        usage_count: usize,
    },

    /// A store-level failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    /// The diagnostic code for this error
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::MeasureNotFound(_) => CQM0302,
            Self::ElementNotFound { .. } => CQM0303,
            Self::ComponentNotFound(_) => CQM0304,
            Self::EditNotRepresentable { .. } => CQM0305,
            Self::EditHeld { .. } => CQM0306,
            Self::Store(err) => err.error_code(),
        }
    }
}

/// Routes criterion edits by the usage decision rule
///
/// An edit to an element whose component serves at most one measure applies
/// immediately to both sides. An edit to a shared component is held until
/// the caller decides between update-all and fork-new-version, so one
/// measure's author can never silently rewrite another measure's criteria.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyncPropagator;

impl SyncPropagator {
    /// Decide how an edit to one element should proceed
    pub fn propose_edit(
        store: &ComponentStore,
        measures: &IndexMap<MeasureId, Measure>,
        measure_id: &str,
        element_id: &str,
        edit: &ComponentEdit,
    ) -> Result<EditPlan, SyncError> {
        let measure = measures
            .get(measure_id)
            .ok_or_else(|| SyncError::MeasureNotFound(measure_id.to_string()))?;
        let element = measure
            .find_element(element_id)
            .ok_or_else(|| SyncError::ElementNotFound {
                measure_id: measure_id.to_string(),
                element_id: element_id.to_string(),
            })?;

        let Some(component_id) = element.library_component_id.as_deref() else {
            return Ok(EditPlan::DirectApply);
        };
        // a dangling link reads as unlinked
        let Some(component) = store.get(component_id) else {
            return Ok(EditPlan::DirectApply);
        };
        // edits with no component counterpart bypass the component entirely
        if !edit_representable(&component.kind, edit) || component.is_archived() {
            return Ok(EditPlan::DirectApply);
        }

        let usage_count = component.usage.usage_count();
        if usage_count <= 1 {
            Ok(EditPlan::DirectApply)
        } else {
            Ok(EditPlan::RequiresDecision {
                component_id: component_id.to_string(),
                usage_count,
                consuming_measures: component.usage.measure_ids.iter().cloned().collect(),
            })
        }
    }

    /// Apply an edit under a [`EditPlan::DirectApply`] plan
    ///
    /// The element is always updated; the linked component is updated only
    /// when it is non-archived, the edit is representable on it, and it
    /// serves at most this one measure. A shared component refuses the
    /// whole edit with [`SyncError::EditHeld`], so a stale plan can never
    /// widen the blast radius.
    pub fn apply_direct(
        store: &mut ComponentStore,
        measure: &mut Measure,
        element_id: &str,
        edit: &ComponentEdit,
    ) -> Result<DirectApplyOutcome, SyncError> {
        let linked = measure
            .find_element(element_id)
            .ok_or_else(|| SyncError::ElementNotFound {
                measure_id: measure.id.clone(),
                element_id: element_id.to_string(),
            })?
            .library_component_id
            .clone();

        let mut update_component = false;
        if let Some(component_id) = &linked {
            if let Some(component) = store.get(component_id) {
                let representable = edit_representable(&component.kind, edit);
                if representable && !component.is_archived() {
                    let usage_count = component.usage.usage_count();
                    if usage_count > 1 {
                        return Err(SyncError::EditHeld {
                            component_id: component_id.clone(),
                            usage_count,
                        });
                    }
                    update_component = true;
                }
            }
        }

        let measure_id = measure.id.clone();
        let element = measure
            .find_element_mut(element_id)
            .ok_or_else(|| SyncError::ElementNotFound {
                measure_id,
                element_id: element_id.to_string(),
            })?;
        apply_edit_to_element(element, edit);

        if update_component {
            if let Some(component_id) = &linked {
                if let Some(component) = store.get_mut(component_id) {
                    apply_edit_to_component(component, edit);
                    component.record_history(format!("{edit} edited directly"));
                }
            }
        }

        Ok(DirectApplyOutcome {
            component_updated: update_component,
        })
    }

    /// Apply an edit to a shared component and every consuming measure
    ///
    /// The component and all matching elements, possibly several per
    /// measure, are rewritten in one local pass; the usage index is rebuilt
    /// once afterwards, never mid-pass. Remote persistence follows: a
    /// failed write lands in the pending ledger and in the report's failed
    /// list, while local state keeps the completed rewrite.
    pub async fn apply_update_all(
        store: &mut ComponentStore,
        measures: &mut IndexMap<MeasureId, Measure>,
        component_id: &str,
        edit: ComponentEdit,
        remote: &dyn RemoteStore,
        pending: &mut PendingSyncTracker,
    ) -> Result<UpdateAllReport, SyncError> {
        {
            let component = store
                .get(component_id)
                .ok_or_else(|| SyncError::ComponentNotFound(component_id.to_string()))?;
            if !edit_representable(&component.kind, &edit) {
                return Err(SyncError::EditNotRepresentable {
                    component_id: component_id.to_string(),
                    edit: edit.to_string(),
                });
            }
        }

        let component = store
            .get_mut(component_id)
            .ok_or_else(|| SyncError::ComponentNotFound(component_id.to_string()))?;
        apply_edit_to_component(component, &edit);
        component.record_history(format!("{edit} updated across all measures"));

        let mut touched: Vec<MeasureId> = Vec::new();
        let mut elements_rewritten = 0;
        for (measure_id, measure) in measures.iter_mut() {
            let mut hits = 0;
            measure.for_each_element_mut(&mut |element| {
                if element.library_component_id.as_deref() == Some(component_id) {
                    apply_edit_to_element(element, &edit);
                    hits += 1;
                }
            });
            if hits > 0 {
                touched.push(measure_id.clone());
                elements_rewritten += hits;
            }
        }

        store.rebuild_usage_index(measures.values());

        let mut report = UpdateAllReport {
            component_id: component_id.to_string(),
            elements_rewritten,
            ..UpdateAllReport::default()
        };

        let component = store
            .get(component_id)
            .ok_or_else(|| SyncError::ComponentNotFound(component_id.to_string()))?;
        match remote
            .persist_component(SyncOperation::UpdateComponent, component)
            .await
        {
            Ok(()) => {
                report.component_synced = true;
                pending.mark_synced(component_id);
            }
            Err(err) => {
                log::warn!("remote update of component {component_id} failed: {err}");
                pending.record_failure(
                    component_id,
                    SyncOperation::UpdateComponent,
                    err.to_string(),
                );
            }
        }

        for measure_id in &touched {
            let Some(measure) = measures.get(measure_id) else {
                continue;
            };
            match remote.persist_measure(measure).await {
                Ok(()) => {
                    report.synced_measures.push(measure_id.clone());
                    pending.mark_synced(measure_id);
                }
                Err(err) => {
                    report.failed_measures.push(measure_id.clone());
                    pending.record_failure(
                        measure_id,
                        SyncOperation::UpdateMeasure,
                        err.to_string(),
                    );
                }
            }
        }

        log::debug!(
            "update-all for {component_id}: {} elements rewritten across {} measures",
            report.elements_rewritten,
            touched.len()
        );
        Ok(report)
    }

    /// Fork a shared component for one measure and apply the edit to the fork
    ///
    /// The fork is a new identity in draft state whose history links back
    /// to the source; only the originating element is retargeted, so every
    /// other consuming measure keeps the unchanged source component.
    pub fn apply_fork_new_version(
        store: &mut ComponentStore,
        measure: &mut Measure,
        component_id: &str,
        element_id: &str,
        edit: &ComponentEdit,
    ) -> Result<ComponentId, SyncError> {
        let source = store
            .get(component_id)
            .ok_or_else(|| SyncError::ComponentNotFound(component_id.to_string()))?;
        if !edit_representable(&source.kind, edit) {
            return Err(SyncError::EditNotRepresentable {
                component_id: component_id.to_string(),
                edit: edit.to_string(),
            });
        }
        if measure.find_element(element_id).is_none() {
            return Err(SyncError::ElementNotFound {
                measure_id: measure.id.clone(),
                element_id: element_id.to_string(),
            });
        }

        let mut fork = source.clone();
        let new_id = generate_component_id();
        fork.id = new_id.clone();
        fork.version.version_id = format!("{}-fork", fork.version.version_id);
        fork.version.status = ApprovalStatus::Draft;
        fork.usage.measure_ids.clear();
        fork.usage.last_used_at = None;
        fork.metadata.source = Some(format!("fork:{component_id}"));
        fork.record_history(format!("forked from {component_id}"));
        apply_edit_to_component(&mut fork, edit);
        store.insert(fork)?;

        let measure_id = measure.id.clone();
        let element = measure
            .find_element_mut(element_id)
            .ok_or_else(|| SyncError::ElementNotFound {
                measure_id,
                element_id: element_id.to_string(),
            })?;
        apply_edit_to_element(element, edit);
        element.library_component_id = Some(new_id.clone());

        // single-element change: the incremental usage path is valid here
        if !measure.references_component(component_id) {
            store.note_unlink(component_id, &measure.id);
        }
        store.note_link(&new_id, &measure.id);

        Ok(new_id)
    }
}

/// Whether an edit has a counterpart on this component kind
fn edit_representable(kind: &ComponentKind, edit: &ComponentEdit) -> bool {
    match kind {
        ComponentKind::Atomic(_) => true,
        ComponentKind::Composite(_) => matches!(edit, ComponentEdit::Description(_)),
    }
}

/// Apply an edit to the element side
fn apply_edit_to_element(element: &mut DataElement, edit: &ComponentEdit) {
    match edit {
        ComponentEdit::Timing(timing) => {
            element.timing = Some(timing.clone());
            element.timing_override = None;
        }
        ComponentEdit::Window(window) => {
            if let Some(timing) = element
                .timing_override
                .as_mut()
                .or(element.timing.as_mut())
            {
                timing.window = Some(*window);
            } else {
                element.timing =
                    Some(TimingExpression::new(TimingRelation::During).with_window(*window));
            }
        }
        ComponentEdit::Codes(codes) => {
            if let Some(set) = element.primary_value_set_mut() {
                set.codes = codes.clone();
                set.total_code_count = Some(codes.len());
            }
        }
        ComponentEdit::Oid(oid) => {
            if let Some(set) = element.primary_value_set_mut() {
                set.oid = Some(oid.clone());
            }
        }
        ComponentEdit::ValueSetName(name) => {
            if let Some(set) = element.primary_value_set_mut() {
                set.name = name.clone();
            }
        }
        ComponentEdit::Negation(negation) => element.negation = *negation,
        ComponentEdit::Description(description) => element.description = description.clone(),
    }
}

/// Apply an edit to the component side; the caller has checked representability
fn apply_edit_to_component(component: &mut LibraryComponent, edit: &ComponentEdit) {
    if let ComponentEdit::Description(description) = edit {
        component.description = Some(description.clone());
        return;
    }
    let Some(atomic) = component.as_atomic_mut() else {
        return;
    };
    match edit {
        ComponentEdit::Timing(timing) => {
            atomic.timing = timing.clone();
        }
        ComponentEdit::Window(window) => {
            atomic.timing.window = Some(*window);
        }
        ComponentEdit::Codes(codes) => {
            if let Some(set) = atomic.value_sets.first_mut() {
                set.codes = codes.clone();
                set.total_code_count = Some(codes.len());
            }
        }
        ComponentEdit::Oid(oid) => {
            if let Some(set) = atomic.value_sets.first_mut() {
                set.oid = Some(oid.clone());
            }
        }
        ComponentEdit::ValueSetName(name) => {
            if let Some(set) = atomic.value_sets.first_mut() {
                set.name = name.clone();
            }
        }
        ComponentEdit::Negation(negation) => {
            atomic.negation = *negation;
        }
        ComponentEdit::Description(_) => {}
    }
    atomic.recompute_complexity();
}
