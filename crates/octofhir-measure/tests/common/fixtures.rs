//! Fixture builders for components and measures

use octofhir_measure::model::{DataElement, LogicalClause, Measure, Population, PopulationKind};
use octofhir_measure::store::{AtomicCriteria, LibraryComponent};
use octofhir_measure::types::{
    ApprovalStatus, CodeReference, LogicalOperator, ResourceType, TimingExpression,
    TimingRelation, ValueSet,
};

/// An approved atomic component with one OID-bearing value set
pub fn approved_component(id: &str, oid: &str, codes: &[&str]) -> LibraryComponent {
    let mut set = ValueSet::new(format!("vs-{id}"), format!("Set {id}")).with_oid(oid);
    for code in codes {
        set = set.with_code(CodeReference::new("SNOMEDCT", *code));
    }
    LibraryComponent::atomic(
        id,
        format!("Component {id}"),
        AtomicCriteria::new(
            set,
            TimingExpression::new(TimingRelation::During).with_anchor("Measurement Period"),
        ),
    )
    .with_status(ApprovalStatus::Approved)
}

/// A single-population measure whose elements carry the given OIDs, unlinked
///
/// Each entry is `(element_id, oid)`; the auto-linker resolves them against
/// the library at ingest time.
pub fn measure_with_oids(measure_id: &str, elements: &[(&str, &str)]) -> Measure {
    let mut clause = LogicalClause::new("root", LogicalOperator::And);
    for (element_id, oid) in elements {
        clause = clause.with_element(
            DataElement::new(*element_id, ResourceType::Condition, format!("Criterion {oid}"))
                .with_value_set(
                    ValueSet::new(format!("vs-{element_id}"), "Criterion").with_oid(*oid),
                ),
        );
    }
    Measure::new(measure_id, format!("Measure {measure_id}")).with_population(Population::new(
        "pop",
        PopulationKind::InitialPopulation,
        clause,
    ))
}

/// A single-population measure with elements pre-linked to components
///
/// Each entry is `(element_id, component_id)`.
pub fn measure_linking(measure_id: &str, links: &[(&str, &str)]) -> Measure {
    let mut clause = LogicalClause::new("root", LogicalOperator::And);
    for (element_id, component_id) in links {
        clause = clause.with_element(
            DataElement::new(*element_id, ResourceType::Condition, "criterion")
                .with_value_set(ValueSet::new(format!("vs-{element_id}"), "Criterion"))
                .with_component(*component_id),
        );
    }
    Measure::new(measure_id, format!("Measure {measure_id}")).with_population(Population::new(
        "pop",
        PopulationKind::InitialPopulation,
        clause,
    ))
}

/// Every `(element_id, component_id)` pair in a measure, for assertions
pub fn element_component_ids(measure: &Measure) -> Vec<(String, Option<String>)> {
    measure
        .elements()
        .into_iter()
        .map(|element| (element.id.clone(), element.library_component_id.clone()))
        .collect()
}
