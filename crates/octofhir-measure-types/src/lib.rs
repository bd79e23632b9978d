//! Clinical vocabulary types for the measure library engine
//!
//! This crate provides the value layer shared by measures and the
//! component library:
//! - `CodeReference` and its `(system, code)` uniqueness key
//! - `ValueSet`, possibly "thin" until hydrated from a terminology source
//! - Timing expressions and compatibility rules
//! - Review/approval status enums and complexity scoring

mod code;
mod status;
mod timing;
mod value_set;

pub use code::*;
pub use status::*;
pub use timing::*;
pub use value_set::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a library component. A stable string key, never an
/// object reference: holders look components up in the store and must
/// tolerate a missing target.
pub type ComponentId = String;

/// Identifier of a measure document
pub type MeasureId = String;

/// Identifier of a criteria tree node (clause or data element)
pub type ElementId = String;

/// Boolean operator combining criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    /// All children must hold
    And,
    /// At least one child must hold
    Or,
    /// Negates its children
    Not,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => write!(f, "AND"),
            LogicalOperator::Or => write!(f, "OR"),
            LogicalOperator::Not => write!(f, "NOT"),
        }
    }
}

/// Clinical resource category of a data element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceType {
    Condition,
    Encounter,
    Procedure,
    MedicationRequest,
    MedicationAdministration,
    Observation,
    LaboratoryTest,
    DiagnosticStudy,
    Immunization,
    AllergyIntolerance,
    Assessment,
    Intervention,
    PatientCharacteristic,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceType::Condition => "Condition",
            ResourceType::Encounter => "Encounter",
            ResourceType::Procedure => "Procedure",
            ResourceType::MedicationRequest => "MedicationRequest",
            ResourceType::MedicationAdministration => "MedicationAdministration",
            ResourceType::Observation => "Observation",
            ResourceType::LaboratoryTest => "LaboratoryTest",
            ResourceType::DiagnosticStudy => "DiagnosticStudy",
            ResourceType::Immunization => "Immunization",
            ResourceType::AllergyIntolerance => "AllergyIntolerance",
            ResourceType::Assessment => "Assessment",
            ResourceType::Intervention => "Intervention",
            ResourceType::PatientCharacteristic => "PatientCharacteristic",
        };
        write!(f, "{name}")
    }
}

/// Normalize a human-entered name for matching: lowercase alphanumeric
/// words joined by single spaces.
///
/// `"Diabetes (Type II), SNOMED"` and `"diabetes type II snomed"`
/// normalize to the same string.
pub fn normalize_name(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_operator_display() {
        assert_eq!(LogicalOperator::And.to_string(), "AND");
        assert_eq!(LogicalOperator::Not.to_string(), "NOT");
    }

    #[rstest]
    #[case("Diabetes (Type II), SNOMED", "diabetes type ii snomed")]
    #[case("  Acute   MI  ", "acute mi")]
    #[case("Essential-Hypertension_ICD10", "essential hypertension icd10")]
    #[case("HbA1c > 9%", "hba1c 9")]
    #[case("", "")]
    fn test_normalize_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_name(input), expected);
    }

    #[test]
    fn test_normalize_name_is_idempotent() {
        let once = normalize_name("Essential Hypertension - ICD10");
        assert_eq!(normalize_name(&once), once);
    }

    #[test]
    fn test_operator_serde_uppercase() {
        let json = serde_json::to_string(&LogicalOperator::Or).unwrap();
        assert_eq!(json, "\"OR\"");
    }
}
