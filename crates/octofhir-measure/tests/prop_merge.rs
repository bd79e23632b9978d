//! Properties of cross-set code deduplication in merges

use indexmap::IndexSet;
use octofhir_measure::engine::{MergeEngine, MergeOptions};
use octofhir_measure::store::{AtomicCriteria, ComponentStore, LibraryComponent};
use octofhir_measure::types::{
    ApprovalStatus, CodeReference, TimingExpression, TimingRelation, ValueSet,
};
use proptest::collection::vec;
use proptest::prelude::*;

fn code_key() -> impl Strategy<Value = (String, String)> {
    (
        prop_oneof![
            Just("SNOMEDCT".to_string()),
            Just("ICD10CM".to_string()),
            Just("LOINC".to_string()),
        ],
        (0u32..30u32).prop_map(|n| n.to_string()),
    )
}

/// One approved atomic component per code list, inserted in order
fn store_from_code_lists(code_lists: &[Vec<(String, String)>]) -> (ComponentStore, Vec<String>) {
    let mut store = ComponentStore::new();
    let mut ids = Vec::new();
    for (index, codes) in code_lists.iter().enumerate() {
        let mut set = ValueSet::new(format!("vs-{index}"), format!("Set {index}"));
        for (system, code) in codes {
            set = set.with_code(CodeReference::new(system.clone(), code.clone()));
        }
        let id = format!("comp-{index}");
        store
            .insert(
                LibraryComponent::atomic(
                    &id,
                    format!("Component {index}"),
                    AtomicCriteria::new(set, TimingExpression::new(TimingRelation::During)),
                )
                .with_status(ApprovalStatus::Approved),
            )
            .unwrap();
        ids.push(id);
    }
    (store, ids)
}

proptest! {
    /// The merged component carries exactly the union of the input keys:
    /// never more than the raw occurrence count, never fewer than the union.
    #[test]
    fn merged_codes_equal_union_of_inputs(
        code_lists in vec(vec(code_key(), 0..8), 2..=5),
    ) {
        let (mut store, ids) = store_from_code_lists(&code_lists);
        let union: IndexSet<(String, String)> =
            code_lists.iter().flatten().cloned().collect();
        let occurrences: usize = code_lists.iter().map(Vec::len).sum();

        let outcome =
            MergeEngine::merge(&mut store, &ids, MergeOptions::new("Merged")).unwrap();
        let atomic = outcome.component.as_atomic().unwrap();

        prop_assert_eq!(atomic.distinct_code_keys().len(), union.len());
        let kept: usize = atomic.value_sets.iter().map(ValueSet::code_count).sum();
        prop_assert_eq!(kept, union.len());
        prop_assert!(kept <= occurrences);
        // every input set survives as a named set even when emptied by dedup
        prop_assert_eq!(atomic.value_sets.len(), code_lists.len());
    }

    /// Deduplication keeps the first occurrence, so merged key order is the
    /// first-seen order across the inputs.
    #[test]
    fn dedup_keeps_first_occurrence_order(
        code_lists in vec(vec(code_key(), 1..6), 2..=4),
    ) {
        let (mut store, ids) = store_from_code_lists(&code_lists);
        let expected: Vec<(String, String)> = {
            let mut seen = IndexSet::new();
            for codes in &code_lists {
                for key in codes {
                    seen.insert(key.clone());
                }
            }
            seen.into_iter().collect()
        };

        let outcome =
            MergeEngine::merge(&mut store, &ids, MergeOptions::new("Merged")).unwrap();
        let got: Vec<(String, String)> = outcome
            .component
            .as_atomic()
            .unwrap()
            .distinct_code_keys()
            .iter()
            .map(|key| (key.system.clone(), key.code.clone()))
            .collect();

        prop_assert_eq!(got, expected);
    }
}
