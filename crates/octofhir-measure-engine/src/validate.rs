//! Referential integrity audit across measures and the component library

use indexmap::IndexMap;
use octofhir_measure_diagnostics::AuditFinding;
use octofhir_measure_model::Measure;
use octofhir_measure_store::ComponentStore;
use octofhir_measure_types::MeasureId;

/// Cross-checks element links against the store and the usage index
///
/// The validator only reads. It never repairs: a finding names the exact
/// ids involved so the caller can decide between relinking, rebuilding the
/// usage index, or unarchiving. An empty report means the two sides agree.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntegrityValidator;

impl IntegrityValidator {
    /// Audit every measure/component relationship
    pub fn validate(
        measures: &IndexMap<MeasureId, Measure>,
        store: &ComponentStore,
    ) -> Vec<AuditFinding> {
        let mut findings = Vec::new();

        // element -> component direction
        for measure in measures.values() {
            measure.for_each_element(&mut |element| {
                if let Some(component_id) = element.library_component_id.as_deref() {
                    if !store.contains(component_id) {
                        findings.push(AuditFinding::dangling_reference(
                            &measure.id,
                            &element.id,
                            component_id,
                        ));
                    }
                }
            });
        }

        // component -> measure direction, re-derived from the criteria trees
        for component in store.iter() {
            for measure_id in &component.usage.measure_ids {
                match measures.get(measure_id) {
                    Some(measure) if measure.references_component(&component.id) => {}
                    Some(_) => {
                        findings.push(AuditFinding::stale_usage(&component.id, measure_id));
                    }
                    None => {
                        findings.push(AuditFinding::unknown_measure(&component.id, measure_id));
                    }
                }
            }
            if component.is_archived() && component.usage.usage_count() > 0 {
                findings.push(AuditFinding::archived_in_use(
                    &component.id,
                    component.usage.usage_count(),
                ));
            }
        }

        findings
    }
}
