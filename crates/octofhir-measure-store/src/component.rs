//! Library component records and version history

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use octofhir_measure_types::{
    ApprovalStatus, CodeKey, CodeReference, Complexity, ComponentId, LogicalOperator, MeasureId,
    TimingExpression, ValueSet,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Generate a fresh component id
pub fn generate_component_id() -> ComponentId {
    format!("comp-{}", Uuid::new_v4())
}

/// An atomic criterion: value sets plus timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtomicCriteria {
    /// Value sets, each kept as a separate named set; post-merge components
    /// carry one per merge input
    #[serde(default)]
    pub value_sets: Vec<ValueSet>,
    /// Timing constraint
    pub timing: TimingExpression,
    /// Whether the criterion is negated
    #[serde(default)]
    pub negation: bool,
    /// Derived complexity class
    #[serde(default)]
    pub complexity: Complexity,
}

impl AtomicCriteria {
    /// Create an atomic criterion around one value set
    pub fn new(value_set: ValueSet, timing: TimingExpression) -> Self {
        let mut criteria = Self {
            value_sets: vec![value_set],
            timing,
            negation: false,
            complexity: Complexity::Simple,
        };
        criteria.recompute_complexity();
        criteria
    }

    /// Set negation and recompute complexity
    pub fn with_negation(mut self, negation: bool) -> Self {
        self.negation = negation;
        self.recompute_complexity();
        self
    }

    /// Distinct `(system, code)` keys across all value sets
    pub fn distinct_code_keys(&self) -> IndexSet<CodeKey> {
        self.value_sets
            .iter()
            .flat_map(|vs| vs.codes.iter())
            .map(CodeReference::key)
            .collect()
    }

    /// All codes across all value sets, in set order
    pub fn all_codes(&self) -> impl Iterator<Item = &CodeReference> {
        self.value_sets.iter().flat_map(|vs| vs.codes.iter())
    }

    /// Re-derive the complexity class from the current shape
    pub fn recompute_complexity(&mut self) {
        self.complexity = Complexity::score(
            self.distinct_code_keys().len(),
            self.timing.window.is_some(),
            self.negation,
        );
    }
}

/// A composite criterion combining other components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeCriteria {
    /// Operator joining the children
    pub operator: LogicalOperator,
    /// Component ids of the children
    pub children: Vec<ComponentId>,
}

/// The criterion payload of a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ComponentKind {
    /// Single criterion
    Atomic(AtomicCriteria),
    /// Combination of other components
    Composite(CompositeCriteria),
}

/// One entry in a component's version history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    /// Version id at the time of the change
    pub version_id: String,
    /// When the change happened
    pub timestamp: DateTime<Utc>,
    /// Status at the time of the change
    pub status: ApprovalStatus,
    /// What changed
    pub summary: String,
}

/// Version id, approval status, and history of a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    /// Current version id
    pub version_id: String,
    /// Current approval status
    pub status: ApprovalStatus,
    /// Append-only change history, oldest first
    #[serde(default)]
    pub history: Vec<VersionEntry>,
}

impl VersionInfo {
    /// Initial version info for a newly created component
    pub fn initial() -> Self {
        Self {
            version_id: "1".to_string(),
            status: ApprovalStatus::Draft,
            history: Vec::new(),
        }
    }
}

/// Derived usage of a component across measures
///
/// `measure_ids` is an index rebuilt from the measure forest; the count is
/// always derived from it, never stored separately where it could drift.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentUsage {
    /// Measures whose criteria trees reference this component
    #[serde(default)]
    pub measure_ids: IndexSet<MeasureId>,
    /// When the component was last linked into a measure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

impl ComponentUsage {
    /// Number of distinct consuming measures
    pub fn usage_count(&self) -> usize {
        self.measure_ids.len()
    }
}

/// Provenance fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMetadata {
    /// Where the component came from: "authored", "merge", "seed", a fork source id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A reusable criterion shared across measures
///
/// The id is immutable and unique for the store's lifetime, even after
/// archival: archived components stay resolvable so historical measure
/// links remain auditable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryComponent {
    /// Component id
    pub id: ComponentId,
    /// Display name
    pub name: String,
    /// Optional narrative
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Criterion payload
    #[serde(flatten)]
    pub kind: ComponentKind,
    /// Version and approval state
    pub version: VersionInfo,
    /// Derived usage index
    #[serde(default)]
    pub usage: ComponentUsage,
    /// Provenance
    #[serde(default)]
    pub metadata: ComponentMetadata,
}

impl LibraryComponent {
    /// Create an atomic component in draft state
    pub fn atomic(
        id: impl Into<ComponentId>,
        name: impl Into<String>,
        criteria: AtomicCriteria,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            kind: ComponentKind::Atomic(criteria),
            version: VersionInfo::initial(),
            usage: ComponentUsage::default(),
            metadata: ComponentMetadata {
                source: None,
                created_at: Some(Utc::now()),
            },
        }
    }

    /// Create a composite component in draft state
    pub fn composite(
        id: impl Into<ComponentId>,
        name: impl Into<String>,
        criteria: CompositeCriteria,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            kind: ComponentKind::Composite(criteria),
            version: VersionInfo::initial(),
            usage: ComponentUsage::default(),
            metadata: ComponentMetadata {
                source: None,
                created_at: Some(Utc::now()),
            },
        }
    }

    /// Set the narrative
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the approval status
    pub fn with_status(mut self, status: ApprovalStatus) -> Self {
        self.version.status = status;
        self
    }

    /// Set the provenance source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.metadata.source = Some(source.into());
        self
    }

    /// The atomic payload, if this is an atomic component
    pub fn as_atomic(&self) -> Option<&AtomicCriteria> {
        match &self.kind {
            ComponentKind::Atomic(criteria) => Some(criteria),
            ComponentKind::Composite(_) => None,
        }
    }

    /// Mutable atomic payload
    pub fn as_atomic_mut(&mut self) -> Option<&mut AtomicCriteria> {
        match &mut self.kind {
            ComponentKind::Atomic(criteria) => Some(criteria),
            ComponentKind::Composite(_) => None,
        }
    }

    /// The composite payload, if this is a composite component
    pub fn as_composite(&self) -> Option<&CompositeCriteria> {
        match &self.kind {
            ComponentKind::Atomic(_) => None,
            ComponentKind::Composite(criteria) => Some(criteria),
        }
    }

    /// Whether this is an atomic component
    pub fn is_atomic(&self) -> bool {
        matches!(self.kind, ComponentKind::Atomic(_))
    }

    /// Whether the component is archived
    pub fn is_archived(&self) -> bool {
        self.version.status.is_archived()
    }

    /// Whether the component may be offered as a link target
    pub fn is_approved(&self) -> bool {
        self.version.status.is_approved()
    }

    /// First value set of an atomic component
    pub fn primary_value_set(&self) -> Option<&ValueSet> {
        self.as_atomic().and_then(|a| a.value_sets.first())
    }

    /// OID of the primary value set
    pub fn oid(&self) -> Option<&str> {
        self.primary_value_set().and_then(|vs| vs.oid.as_deref())
    }

    /// Distinct `(system, code)` count of an atomic component, zero otherwise
    pub fn distinct_code_count(&self) -> usize {
        self.as_atomic()
            .map_or(0, |a| a.distinct_code_keys().len())
    }

    /// Append a history entry capturing the current version and status
    pub fn record_history(&mut self, summary: impl Into<String>) {
        self.version.history.push(VersionEntry {
            version_id: self.version.version_id.clone(),
            timestamp: Utc::now(),
            status: self.version.status,
            summary: summary.into(),
        });
    }
}

impl fmt::Display for LibraryComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            ComponentKind::Atomic(_) => "atomic",
            ComponentKind::Composite(_) => "composite",
        };
        write!(
            f,
            "{} '{}' ({kind}, {}, used by {})",
            self.id,
            self.name,
            self.version.status,
            self.usage.usage_count()
        )
    }
}
