//! Terminology code references

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single code drawn from a terminology system
///
/// Code references are immutable values. Two references denote the same
/// clinical fact when their `(system, code)` keys match; display text and
/// version are carried for rendering only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeReference {
    /// The code value within its system
    pub code: String,
    /// Human-readable display text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Terminology system name (e.g. "SNOMEDCT", "ICD10CM")
    pub system: String,
    /// Canonical URI of the system, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_uri: Option<String>,
    /// Code system version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl CodeReference {
    /// Create a new code reference
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display: None,
            system: system.into(),
            system_uri: None,
            version: None,
        }
    }

    /// Set the display text
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    /// Set the system URI
    pub fn with_system_uri(mut self, uri: impl Into<String>) -> Self {
        self.system_uri = Some(uri.into());
        self
    }

    /// Set the code system version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// The `(system, code)` uniqueness key
    pub fn key(&self) -> CodeKey {
        CodeKey {
            system: self.system.clone(),
            code: self.code.clone(),
        }
    }

    /// Check if this code denotes the same fact as another
    /// (same system and code; display and version may differ)
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.system == other.system && self.code == other.code
    }
}

impl fmt::Display for CodeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.system, self.code)?;
        if let Some(display) = &self.display {
            write!(f, " '{display}'")?;
        }
        Ok(())
    }
}

/// Owned `(system, code)` key used for deduplication across value sets
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeKey {
    /// Terminology system name
    pub system: String,
    /// Code value
    pub code: String,
}

impl fmt::Display for CodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.system, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_key_equality() {
        let a = CodeReference::new("SNOMEDCT", "44054006").with_display("Diabetes mellitus type 2");
        let b = CodeReference::new("SNOMEDCT", "44054006").with_version("2024-03");
        let c = CodeReference::new("ICD10CM", "44054006");

        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
        assert!(a.is_equivalent(&b));
        assert!(!a.is_equivalent(&c));
    }

    #[test]
    fn test_display() {
        let code = CodeReference::new("ICD10CM", "E11.9").with_display("Type 2 diabetes");
        assert_eq!(code.to_string(), "ICD10CM|E11.9 'Type 2 diabetes'");
    }

    #[test]
    fn test_serde_round_trip() {
        let code = CodeReference::new("SNOMEDCT", "22298006")
            .with_display("Myocardial infarction")
            .with_system_uri("http://snomed.info/sct");
        let json = serde_json::to_string(&code).unwrap();
        assert!(json.contains("\"systemUri\""));
        let back: CodeReference = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);
    }
}
