//! Automatic linking of criteria elements to library components

use indexmap::IndexMap;
use octofhir_measure_model::{DataElement, Measure};
use octofhir_measure_store::{ComponentStore, LibraryComponent};
use octofhir_measure_types::{ComponentId, ElementId, ValueSet, normalize_name};
use serde::{Deserialize, Serialize};

/// Default confidence floor below which no link is proposed
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.7;

const OID_MATCH_SCORE: f32 = 1.0;
const NAME_MATCH_BASE: f32 = 0.75;
const TIMING_AGREEMENT_BONUS: f32 = 0.1;
const UNVERIFIED_PENALTY: f32 = 0.1;
const SCORE_EPSILON: f32 = 1e-6;

/// Proposed link target for one element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkTarget {
    /// Link to this component
    Component(ComponentId),
    /// The best match would resolve to zero codes; do not link yet
    NeedsCodes,
}

/// Proposed links per element id
pub type LinkMap = IndexMap<ElementId, LinkTarget>;

/// Linker tuning knobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkOptions {
    /// Confidence floor; candidates scoring below it are dropped
    pub min_confidence: f32,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

/// Proposes links from unlinked criteria elements to approved components
///
/// Linking is pure with respect to both the measure and the store: `link`
/// computes a map and [`AutoLinker::stamp`] writes it onto the tree as a
/// separate step. Both are idempotent, so running the pass twice yields the
/// same map and no additional mutation. The caller owns the usage index
/// rebuild after stamping.
#[derive(Debug, Default, Clone)]
pub struct AutoLinker {
    options: LinkOptions,
}

impl AutoLinker {
    /// Create a linker with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a linker with explicit options
    pub fn with_options(options: LinkOptions) -> Self {
        Self { options }
    }

    /// Compute proposed links for every unlinked element carrying terminology
    ///
    /// Ambiguity never fails the pass: a tie between best candidates, or no
    /// candidate above the floor, resolves to no entry, and the element stays
    /// unlinked, which is always safe.
    pub fn link(&self, measure: &Measure, store: &ComponentStore) -> LinkMap {
        let mut map = LinkMap::new();
        measure.for_each_element(&mut |element| {
            if element.is_linked() || !element.has_terminology() {
                return;
            }
            if let Some(winner) = self.best_candidate(element, store) {
                let target = if winner.distinct_code_count() == 0 {
                    LinkTarget::NeedsCodes
                } else {
                    LinkTarget::Component(winner.id.clone())
                };
                map.insert(element.id.clone(), target);
            }
        });
        map
    }

    /// Write a link map onto the tree, returning how many elements were linked
    ///
    /// Already-linked elements and `NeedsCodes` entries are skipped, so
    /// stamping the same map twice changes nothing.
    pub fn stamp(measure: &mut Measure, map: &LinkMap) -> usize {
        let mut stamped = 0;
        measure.for_each_element_mut(&mut |element| {
            if element.is_linked() {
                return;
            }
            if let Some(LinkTarget::Component(component_id)) = map.get(&element.id) {
                element.library_component_id = Some(component_id.clone());
                stamped += 1;
            }
        });
        stamped
    }

    fn best_candidate<'a>(
        &self,
        element: &DataElement,
        store: &'a ComponentStore,
    ) -> Option<&'a LibraryComponent> {
        let element_set = element.primary_value_set()?;

        let mut best: Option<(f32, &LibraryComponent)> = None;
        let mut tied = false;
        for component in store.approved_atomics() {
            let Some(score) = score_candidate(element, element_set, component) else {
                continue;
            };
            if score < self.options.min_confidence {
                continue;
            }
            match best {
                Some((best_score, _)) if (score - best_score).abs() < SCORE_EPSILON => {
                    tied = true;
                }
                Some((best_score, _)) if score > best_score => {
                    best = Some((score, component));
                    tied = false;
                }
                Some(_) => {}
                None => best = Some((score, component)),
            }
        }

        if tied { None } else { best.map(|(_, c)| c) }
    }
}

/// Score one approved atomic component against an element
///
/// An exact OID match is authoritative. Otherwise a normalized-name match
/// applies, constrained by timing compatibility, with a bonus when both
/// sides state compatible timing and a penalty for unverified candidate
/// sets. `None` means no match at all.
fn score_candidate(
    element: &DataElement,
    element_set: &ValueSet,
    component: &LibraryComponent,
) -> Option<f32> {
    let atomic = component.as_atomic()?;

    if let Some(oid) = element_set.oid.as_deref() {
        if atomic
            .value_sets
            .iter()
            .any(|vs| vs.oid.as_deref() == Some(oid))
        {
            return Some(OID_MATCH_SCORE);
        }
    }

    let element_name = normalize_name(&element_set.name);
    if element_name.is_empty() {
        return None;
    }
    let name_matches = normalize_name(&component.name) == element_name
        || atomic
            .value_sets
            .iter()
            .any(|vs| normalize_name(&vs.name) == element_name);
    if !name_matches {
        return None;
    }

    let timing_agreement = match element.effective_timing() {
        Some(timing) => {
            if !timing.is_compatible_with(&atomic.timing) {
                return None;
            }
            true
        }
        None => false,
    };

    let mut score = NAME_MATCH_BASE;
    if timing_agreement {
        score += TIMING_AGREEMENT_BONUS;
    }
    if atomic.value_sets.first().is_some_and(|vs| !vs.verified) {
        score -= UNVERIFIED_PENALTY;
    }
    Some(score)
}
