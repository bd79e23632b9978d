//! Report snapshots for the audit validator and the merge engine

mod common;

use common::{approved_component, measure_linking};
use indexmap::IndexMap;
use insta::assert_yaml_snapshot;
use octofhir_measure::MeasureLibrary;
use octofhir_measure::engine::{IntegrityValidator, MergeOptions};
use octofhir_measure::model::Measure;
use octofhir_measure::store::{AtomicCriteria, ComponentStore, LibraryComponent};
use octofhir_measure::types::{
    ApprovalStatus, CodeReference, MeasureId, TimingExpression, TimingRelation, ValueSet,
};
use serde::Serialize;

#[test]
fn snapshot_audit_findings() {
    let mut store = ComponentStore::new();
    store
        .insert(approved_component(
            "comp-shared",
            "2.16.840.1.113883.3.464.1003.103",
            &["44054006"],
        ))
        .unwrap();
    let mut retired = approved_component(
        "comp-retired",
        "2.16.840.1.113883.3.464.1003.101.12.1001",
        &["99213"],
    );
    retired.version.status = ApprovalStatus::Archived;
    store.insert(retired).unwrap();

    // el-dx points nowhere; el-retired legitimately uses the archived component
    let mut measures: IndexMap<MeasureId, Measure> = IndexMap::new();
    measures.insert(
        "m-alpha".to_string(),
        measure_linking(
            "m-alpha",
            &[("el-dx", "comp-missing"), ("el-retired", "comp-retired")],
        ),
    );
    measures.insert("m-beta".to_string(), measure_linking("m-beta", &[]));

    // tamper with the usage index so every finding kind shows up once
    store.note_link("comp-shared", "m-beta");
    store.note_link("comp-shared", "m-ghost");
    store.note_link("comp-retired", "m-alpha");

    let findings = IntegrityValidator::validate(&measures, &store);
    assert_yaml_snapshot!("audit_findings", findings);
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MergedComponentReport {
    name: String,
    status: String,
    source: String,
    value_sets: Vec<MergedSetReport>,
    distinct_codes: usize,
    archived_inputs: Vec<String>,
    measures_updated: usize,
    elements_rewritten: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MergedSetReport {
    name: String,
    oid: String,
    codes: Vec<String>,
}

fn diagnosis_component() -> LibraryComponent {
    let set = ValueSet::new("vs-dx", "Diabetes")
        .with_oid("2.16.840.1.113883.3.464.1003.103")
        .with_code(CodeReference::new("SNOMEDCT", "44054006"))
        .with_code(CodeReference::new("ICD10CM", "E11.9"));
    LibraryComponent::atomic(
        "comp-dx",
        "Diabetes Diagnosis",
        AtomicCriteria::new(
            set,
            TimingExpression::new(TimingRelation::During).with_anchor("Measurement Period"),
        ),
    )
    .with_status(ApprovalStatus::Approved)
}

fn encounter_component() -> LibraryComponent {
    let set = ValueSet::new("vs-enc", "Office Visit")
        .with_oid("2.16.840.1.113883.3.464.1003.101.12.1001")
        .with_code(CodeReference::new("CPT", "99213"))
        .with_code(CodeReference::new("ICD10CM", "E11.9"));
    LibraryComponent::atomic(
        "comp-enc",
        "Qualifying Encounter",
        AtomicCriteria::new(
            set,
            TimingExpression::new(TimingRelation::During).with_anchor("Measurement Period"),
        ),
    )
    .with_status(ApprovalStatus::Approved)
}

/// The merged component id is generated, so the snapshot projects the
/// stable parts of the outcome: names, OIDs, codes and rewrite counts.
#[test]
fn snapshot_merged_component_report() {
    let mut library = MeasureLibrary::new();
    library.add_component(diagnosis_component()).unwrap();
    library.add_component(encounter_component()).unwrap();
    library.ingest_measure(measure_linking("m-dm-control", &[("el-dx", "comp-dx")]));
    library.ingest_measure(measure_linking(
        "m-dm-screening",
        &[("el-dx", "comp-dx"), ("el-visit", "comp-enc")],
    ));

    let report = library
        .merge_components(
            &["comp-dx".to_string(), "comp-enc".to_string()],
            MergeOptions::new("Diabetes Care Criteria")
                .with_description("Shared diagnosis and encounter terminology"),
        )
        .unwrap();
    assert!(report.findings.is_empty());

    let merged = library.component(&report.component_id).unwrap();
    let atomic = merged.as_atomic().unwrap();
    let summary = MergedComponentReport {
        name: merged.name.clone(),
        status: merged.version.status.to_string(),
        source: merged.metadata.source.clone().unwrap(),
        value_sets: atomic
            .value_sets
            .iter()
            .map(|set| MergedSetReport {
                name: set.name.clone(),
                oid: set.oid.clone().unwrap(),
                codes: set
                    .codes
                    .iter()
                    .map(|code| format!("{} {}", code.system, code.code))
                    .collect(),
            })
            .collect(),
        distinct_codes: merged.distinct_code_count(),
        archived_inputs: report.archived.clone(),
        measures_updated: report.rewrite.measures_updated,
        elements_rewritten: report.rewrite.elements_rewritten,
    };
    assert_yaml_snapshot!("merged_component", summary);
}
