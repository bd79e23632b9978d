//! Merging library components and rewriting measure references

use indexmap::IndexSet;
use octofhir_measure_diagnostics::{CQM0200, CQM0201, CQM0202, ErrorCode};
use octofhir_measure_model::Measure;
use octofhir_measure_store::{
    AtomicCriteria, ComponentKind, ComponentStore, LibraryComponent, StoreError,
    generate_component_id,
};
use octofhir_measure_types::{CodeKey, ComponentId, TimingExpression, ValueSet};
use thiserror::Error;

/// Errors raised by the merge step
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MergeError {
    /// Fewer than two distinct inputs
    #[error("merge requires at least two distinct components, got {0}")]
    InsufficientInputs(usize),

    /// An input id does not resolve in the store
    #[error("merge input '{0}' not found")]
    InputNotFound(ComponentId),

    /// An input is already archived
    #[error("merge input '{0}' is already archived")]
    InputArchived(ComponentId),

    /// The store rejected a merge-side mutation
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MergeError {
    /// The diagnostic code for this error
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InsufficientInputs(_) => CQM0200,
            Self::InputNotFound(_) => CQM0201,
            Self::InputArchived(_) => CQM0202,
            Self::Store(err) => err.error_code(),
        }
    }
}

/// Inputs to a merge beyond the component ids
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOptions {
    /// Name of the merged component
    pub name: String,
    /// Optional narrative
    pub description: Option<String>,
    /// Caller-supplied value sets to merge instead of collecting from inputs
    pub value_sets: Option<Vec<ValueSet>>,
}

impl MergeOptions {
    /// Options with just a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            value_sets: None,
        }
    }

    /// Set the narrative
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Use these value sets instead of collecting from the inputs
    pub fn with_value_sets(mut self, value_sets: Vec<ValueSet>) -> Self {
        self.value_sets = Some(value_sets);
        self
    }
}

/// Result of a successful merge
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// The newly created component, as inserted into the store
    pub component: LibraryComponent,
    /// Input ids archived as superseded, in input order
    pub archived: Vec<ComponentId>,
}

/// Result of the reference-rewrite checkpoint after a merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceRewrite {
    /// Measures with at least one rewritten element
    pub measures_updated: usize,
    /// Elements retargeted to the merged component
    pub elements_rewritten: usize,
}

/// Combines components into one, deduplicating codes across value sets
///
/// Merge and reference rewrite are two separate checkpoints: `merge` never
/// touches a measure tree, so a failed merge leaves every measure exactly
/// as it was, and a failed rewrite after a successful merge surfaces as
/// partial success rather than a half-migrated library.
#[derive(Debug, Default, Clone, Copy)]
pub struct MergeEngine;

impl MergeEngine {
    /// Merge two or more components into a new one, archiving the inputs
    ///
    /// Every value set of every input is preserved as a separate named set;
    /// codes are deduplicated across all of them by `(system, code)`,
    /// keeping the first occurrence in input order. The merged component is
    /// a fresh identity in draft state with zero usage; callers retarget
    /// tree references and rebuild the usage index afterwards.
    ///
    /// All preconditions are checked before any mutation: on error, no
    /// component is created and nothing is archived.
    pub fn merge(
        store: &mut ComponentStore,
        component_ids: &[ComponentId],
        options: MergeOptions,
    ) -> Result<MergeOutcome, MergeError> {
        let inputs: IndexSet<ComponentId> = component_ids.iter().cloned().collect();
        if inputs.len() < 2 {
            return Err(MergeError::InsufficientInputs(inputs.len()));
        }
        for id in &inputs {
            match store.get(id) {
                None => return Err(MergeError::InputNotFound(id.clone())),
                Some(component) if component.is_archived() => {
                    return Err(MergeError::InputArchived(id.clone()));
                }
                Some(_) => {}
            }
        }

        let (collected, first_atomic) = collect_from_inputs(store, &inputs);
        let mut value_sets = match options.value_sets {
            Some(sets) => sets,
            None => collected,
        };
        dedup_across_sets(&mut value_sets);

        let (timing, negation) =
            first_atomic.unwrap_or_else(|| (TimingExpression::anytime(), false));
        let mut criteria = AtomicCriteria {
            value_sets,
            timing,
            negation,
            complexity: Default::default(),
        };
        criteria.recompute_complexity();

        let new_id = generate_component_id();
        let mut component =
            LibraryComponent::atomic(new_id.clone(), options.name, criteria).with_source("merge");
        if let Some(description) = options.description {
            component = component.with_description(description);
        }
        let input_list: Vec<&str> = inputs.iter().map(String::as_str).collect();
        component.record_history(format!("merged from {}", input_list.join(", ")));

        store.insert(component.clone())?;
        let archived: Vec<ComponentId> = inputs.into_iter().collect();
        for id in &archived {
            store.archive_superseded(id, &new_id)?;
        }
        log::debug!("merged {} inputs into component {new_id}", archived.len());

        Ok(MergeOutcome {
            component,
            archived,
        })
    }

    /// Retarget every element referencing an archived input to the new id
    ///
    /// The second checkpoint after [`MergeEngine::merge`]. The caller
    /// rebuilds the usage index once this pass has covered every measure.
    pub fn update_measure_references_after_merge<'a, I>(
        measures: I,
        archived: &[ComponentId],
        new_id: &str,
    ) -> ReferenceRewrite
    where
        I: IntoIterator<Item = &'a mut Measure>,
    {
        let mut rewrite = ReferenceRewrite::default();
        for measure in measures {
            let mut rewritten_here = 0;
            measure.for_each_element_mut(&mut |element| {
                if let Some(current) = &element.library_component_id {
                    if archived.iter().any(|a| a == current) {
                        element.library_component_id = Some(new_id.to_string());
                        rewritten_here += 1;
                    }
                }
            });
            if rewritten_here > 0 {
                rewrite.measures_updated += 1;
                rewrite.elements_rewritten += rewritten_here;
            }
        }
        rewrite
    }
}

/// Collect value sets from the inputs in order, descending into composites
///
/// Returns the collected sets and the timing/negation of the first atomic
/// encountered, which seeds the merged component. A visited set guards
/// against composite cycles.
fn collect_from_inputs(
    store: &ComponentStore,
    inputs: &IndexSet<ComponentId>,
) -> (Vec<ValueSet>, Option<(TimingExpression, bool)>) {
    let mut sets = Vec::new();
    let mut first_atomic = None;
    let mut visited = IndexSet::new();
    for id in inputs {
        collect_component(store, id, &mut visited, &mut sets, &mut first_atomic);
    }
    (sets, first_atomic)
}

fn collect_component(
    store: &ComponentStore,
    component_id: &ComponentId,
    visited: &mut IndexSet<ComponentId>,
    sets: &mut Vec<ValueSet>,
    first_atomic: &mut Option<(TimingExpression, bool)>,
) {
    if !visited.insert(component_id.clone()) {
        return;
    }
    let Some(component) = store.get(component_id) else {
        return;
    };
    match &component.kind {
        ComponentKind::Atomic(atomic) => {
            sets.extend(atomic.value_sets.iter().cloned());
            if first_atomic.is_none() {
                *first_atomic = Some((atomic.timing.clone(), atomic.negation));
            }
        }
        ComponentKind::Composite(composite) => {
            for child in &composite.children {
                collect_component(store, child, visited, sets, first_atomic);
            }
        }
    }
}

/// Deduplicate codes across sets by `(system, code)`, first occurrence wins
///
/// Sets emptied by deduplication are kept: a named set that contributed
/// nothing new still records where its codes came from.
fn dedup_across_sets(value_sets: &mut [ValueSet]) {
    let mut seen: IndexSet<CodeKey> = IndexSet::new();
    for set in value_sets.iter_mut() {
        set.codes.retain(|code| seen.insert(code.key()));
    }
}
