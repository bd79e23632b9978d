//! Review and approval lifecycle states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Review state of a criteria tree element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Awaiting reviewer attention
    #[default]
    Pending,
    /// Reviewed and accepted
    Approved,
    /// Sent back for rework
    NeedsRevision,
    /// Marked for discussion
    Flagged,
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::NeedsRevision => "needs revision",
            Self::Flagged => "flagged",
        };
        write!(f, "{label}")
    }
}

/// Approval state of a library component version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Editable working state
    #[default]
    Draft,
    /// Submitted for review
    PendingReview,
    /// Approved for linking
    Approved,
    /// Retired; kept resolvable for audit
    Archived,
}

impl ApprovalStatus {
    /// Whether the component is retired
    pub fn is_archived(&self) -> bool {
        matches!(self, Self::Archived)
    }

    /// Whether the component may be offered as a link target
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Draft => "draft",
            Self::PendingReview => "pending review",
            Self::Approved => "approved",
            Self::Archived => "archived",
        };
        write!(f, "{label}")
    }
}

/// Rough complexity class of an atomic criterion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    #[default]
    Simple,
    Moderate,
    Complex,
}

impl Complexity {
    /// Derive a complexity class from criterion shape
    pub fn score(code_count: usize, has_window: bool, negation: bool) -> Self {
        let mut points = 0u8;
        if code_count > 20 {
            points += 2;
        } else if code_count > 5 {
            points += 1;
        }
        if has_window {
            points += 1;
        }
        if negation {
            points += 1;
        }
        match points {
            0 => Self::Simple,
            1 | 2 => Self::Moderate,
            _ => Self::Complex,
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
        };
        write!(f, "{label}")
    }
}
