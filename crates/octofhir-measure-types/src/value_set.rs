//! Value sets: named, versioned collections of codes

use crate::code::{CodeKey, CodeReference};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_confidence() -> f32 {
    1.0
}

/// A named collection of codes, optionally identified by an OID
///
/// A value set may be "thin": identified by OID but with no codes loaded yet.
/// Thin sets are valid inputs everywhere; hydration from a terminology source
/// fills `codes` later without changing the set's identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSet {
    /// Stable identifier of this set within its owner
    pub id: String,
    /// OID or canonical URL identifying the set in a terminology registry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oid: Option<String>,
    /// Value set name
    pub name: String,
    /// Value set version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Member codes, in insertion order
    #[serde(default)]
    pub codes: Vec<CodeReference>,
    /// Total codes in the source set; may exceed `codes.len()` when thin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_code_count: Option<usize>,
    /// Whether the set has been checked against its terminology source
    #[serde(default)]
    pub verified: bool,
    /// Extraction confidence, 1.0 for explicitly authored sets
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

impl ValueSet {
    /// Create a value set with no codes
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            oid: None,
            name: name.into(),
            version: None,
            codes: Vec::new(),
            total_code_count: None,
            verified: false,
            confidence: 1.0,
        }
    }

    /// Set the OID
    pub fn with_oid(mut self, oid: impl Into<String>) -> Self {
        self.oid = Some(oid.into());
        self
    }

    /// Set the version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Replace the member codes
    pub fn with_codes(mut self, codes: Vec<CodeReference>) -> Self {
        self.codes = codes;
        self
    }

    /// Add a single code
    pub fn with_code(mut self, code: CodeReference) -> Self {
        self.codes.push(code);
        self
    }

    /// Set the extraction confidence
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Reference-only: identified by an OID but not yet hydrated with codes
    pub fn is_thin(&self) -> bool {
        self.codes.is_empty() && self.oid.is_some()
    }

    /// Whether the set carries any terminology at all: an OID, a non-empty
    /// name, or at least one code
    pub fn has_terminology(&self) -> bool {
        self.oid.as_deref().is_some_and(|o| !o.is_empty())
            || !self.name.is_empty()
            || !self.codes.is_empty()
    }

    /// Number of member codes currently loaded
    pub fn code_count(&self) -> usize {
        self.codes.len()
    }

    /// The `(system, code)` keys of every member, deduplicated, in order
    pub fn distinct_keys(&self) -> IndexSet<CodeKey> {
        self.codes.iter().map(CodeReference::key).collect()
    }

    /// Remove duplicate `(system, code)` entries, keeping the first occurrence
    pub fn dedup_codes(&mut self) {
        let mut seen = IndexSet::new();
        self.codes.retain(|code| seen.insert(code.key()));
    }

    /// Look up a member code by key
    pub fn find_code(&self, key: &CodeKey) -> Option<&CodeReference> {
        self.codes
            .iter()
            .find(|c| c.system == key.system && c.code == key.code)
    }
}

impl fmt::Display for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(oid) = &self.oid {
            write!(f, " ({oid})")?;
        }
        write!(f, " [{} codes]", self.codes.len())
    }
}
