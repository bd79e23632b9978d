//! Audit findings produced by the referential integrity validator

use crate::{CQM0001, CQM0002, CQM0003, CQM0004, ErrorCode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level for a reported condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error - the data is inconsistent and needs repair
    Error,
    /// Warning - a derived index diverged; a rebuild resolves it
    Warning,
    /// Information - informational message
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// The kind of inconsistency an audit finding reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FindingKind {
    /// A data element links a component id with no resolving component
    DanglingReference,
    /// The usage index names a measure that does not reference the component
    StaleUsage,
    /// The usage index names a measure id that does not exist
    UnknownMeasure,
    /// An archived component still has live usage
    ArchivedInUse,
}

/// A single inconsistency found by the validator
///
/// Findings are diagnostic output, never a gate: the engines perform
/// partial, localized rewrites and the validator is the smoke test that
/// confirms they converged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFinding {
    /// Error code
    pub code: ErrorCode,
    /// Severity level
    pub severity: Severity,
    /// What kind of inconsistency this is
    pub kind: FindingKind,
    /// Component involved, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    /// Measure involved, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure_id: Option<String>,
    /// Data element involved, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    /// Human-readable message
    pub message: String,
}

impl AuditFinding {
    /// A data element references a component id that does not resolve
    pub fn dangling_reference(
        measure_id: impl Into<String>,
        element_id: impl Into<String>,
        component_id: impl Into<String>,
    ) -> Self {
        let measure_id = measure_id.into();
        let element_id = element_id.into();
        let component_id = component_id.into();
        Self {
            code: CQM0001,
            severity: Severity::Error,
            kind: FindingKind::DanglingReference,
            message: format!(
                "element {element_id} in measure {measure_id} references missing component {component_id}"
            ),
            component_id: Some(component_id),
            measure_id: Some(measure_id),
            element_id: Some(element_id),
        }
    }

    /// The usage index names a measure that does not actually reference the component
    pub fn stale_usage(component_id: impl Into<String>, measure_id: impl Into<String>) -> Self {
        let component_id = component_id.into();
        let measure_id = measure_id.into();
        Self {
            code: CQM0002,
            severity: Severity::Warning,
            kind: FindingKind::StaleUsage,
            message: format!(
                "usage index lists measure {measure_id} for component {component_id}, but the measure does not reference it"
            ),
            component_id: Some(component_id),
            measure_id: Some(measure_id),
            element_id: None,
        }
    }

    /// The usage index names a measure id that does not exist
    pub fn unknown_measure(component_id: impl Into<String>, measure_id: impl Into<String>) -> Self {
        let component_id = component_id.into();
        let measure_id = measure_id.into();
        Self {
            code: CQM0004,
            severity: Severity::Warning,
            kind: FindingKind::UnknownMeasure,
            message: format!(
                "usage index lists unknown measure {measure_id} for component {component_id}"
            ),
            component_id: Some(component_id),
            measure_id: Some(measure_id),
            element_id: None,
        }
    }

    /// An archived component still carries live usage
    pub fn archived_in_use(component_id: impl Into<String>, usage_count: usize) -> Self {
        let component_id = component_id.into();
        Self {
            code: CQM0003,
            severity: Severity::Error,
            kind: FindingKind::ArchivedInUse,
            message: format!(
                "archived component {component_id} is still referenced by {usage_count} measure(s)"
            ),
            component_id: Some(component_id),
            measure_id: None,
            element_id: None,
        }
    }

    /// Whether this finding is an error (as opposed to a warning)
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for AuditFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.code, self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangling_reference_finding() {
        let finding = AuditFinding::dangling_reference("m1", "e1", "c9");
        assert_eq!(finding.code, CQM0001);
        assert!(finding.is_error());
        assert_eq!(finding.kind, FindingKind::DanglingReference);
        assert_eq!(finding.component_id.as_deref(), Some("c9"));
        assert_eq!(finding.measure_id.as_deref(), Some("m1"));
        assert_eq!(finding.element_id.as_deref(), Some("e1"));
    }

    #[test]
    fn test_finding_display() {
        let finding = AuditFinding::archived_in_use("c1", 3);
        let rendered = finding.to_string();
        assert!(rendered.starts_with("CQM0003 error:"));
        assert!(rendered.contains("c1"));
        assert!(rendered.contains("3 measure(s)"));
    }

    #[test]
    fn test_stale_usage_is_warning() {
        let finding = AuditFinding::stale_usage("c1", "m2");
        assert_eq!(finding.severity, Severity::Warning);
        assert!(!finding.is_error());
    }
}
