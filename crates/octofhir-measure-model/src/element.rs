//! Criteria tree leaf elements

use octofhir_measure_types::{
    ComponentId, ElementId, ResourceType, ReviewStatus, TimingExpression, ValueSet,
};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Numeric bounds attached to an element, e.g. a lab result range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    /// Inclusive lower bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    /// Inclusive upper bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    /// Unit the bounds are expressed in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// A criteria tree leaf: one clinical criterion
///
/// Elements are created when a measure is ingested or a component is added to
/// a population, mutated by inline edits or sync propagation, and destroyed
/// only by explicit removal from their parent clause or at merge time.
///
/// `library_component_id` is the only edge from a measure into the component
/// library. It is a lookup key, not an owning pointer: the target may be
/// archived or missing, and readers must render such elements as unlinked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataElement {
    /// Element id, unique within its measure
    pub id: ElementId,
    /// FHIR resource type this criterion queries
    pub resource_type: ResourceType,
    /// Human-readable criterion text
    pub description: String,
    /// Primary value set, when the criterion carries terminology inline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_set: Option<ValueSet>,
    /// Additional value sets, populated for post-merge criteria
    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub value_sets: SmallVec<[ValueSet; 1]>,
    /// Timing captured at ingest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingExpression>,
    /// Measure-specific timing override; wins over `timing`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_override: Option<TimingExpression>,
    /// Numeric thresholds, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Thresholds>,
    /// Weak reference into the component library; may dangle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_component_id: Option<ComponentId>,
    /// Review state
    #[serde(default)]
    pub review_status: ReviewStatus,
    /// Whether the criterion is negated ("absence of ...")
    #[serde(default)]
    pub negation: bool,
}

impl DataElement {
    /// Create an element with no terminology or timing
    pub fn new(
        id: impl Into<ElementId>,
        resource_type: ResourceType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            resource_type,
            description: description.into(),
            value_set: None,
            value_sets: SmallVec::new(),
            timing: None,
            timing_override: None,
            thresholds: None,
            library_component_id: None,
            review_status: ReviewStatus::default(),
            negation: false,
        }
    }

    /// Set the primary value set
    pub fn with_value_set(mut self, value_set: ValueSet) -> Self {
        self.value_set = Some(value_set);
        self
    }

    /// Replace the additional value sets
    pub fn with_value_sets(mut self, value_sets: impl IntoIterator<Item = ValueSet>) -> Self {
        self.value_sets = value_sets.into_iter().collect();
        self
    }

    /// Set the ingest timing
    pub fn with_timing(mut self, timing: TimingExpression) -> Self {
        self.timing = Some(timing);
        self
    }

    /// Set the measure-specific timing override
    pub fn with_timing_override(mut self, timing: TimingExpression) -> Self {
        self.timing_override = Some(timing);
        self
    }

    /// Set the thresholds
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    /// Link to a library component
    pub fn with_component(mut self, component_id: impl Into<ComponentId>) -> Self {
        self.library_component_id = Some(component_id.into());
        self
    }

    /// Set negation
    pub fn with_negation(mut self, negation: bool) -> Self {
        self.negation = negation;
        self
    }

    /// The value set this element is judged by: the inline set, or the
    /// first of `value_sets`
    pub fn primary_value_set(&self) -> Option<&ValueSet> {
        self.value_set.as_ref().or_else(|| self.value_sets.first())
    }

    /// Mutable access to the primary value set
    pub fn primary_value_set_mut(&mut self) -> Option<&mut ValueSet> {
        if self.value_set.is_some() {
            self.value_set.as_mut()
        } else {
            self.value_sets.first_mut()
        }
    }

    /// All value sets on this element, primary first
    pub fn all_value_sets(&self) -> impl Iterator<Item = &ValueSet> {
        self.value_set.iter().chain(self.value_sets.iter())
    }

    /// The timing in effect: the override when present, else the ingest timing
    pub fn effective_timing(&self) -> Option<&TimingExpression> {
        self.timing_override.as_ref().or(self.timing.as_ref())
    }

    /// Whether any value set on this element carries terminology
    pub fn has_terminology(&self) -> bool {
        self.all_value_sets().any(ValueSet::has_terminology)
    }

    /// Whether this element references a library component
    pub fn is_linked(&self) -> bool {
        self.library_component_id.is_some()
    }
}
