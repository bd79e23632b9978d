//! Timing expressions attached to criteria

use serde::{Deserialize, Serialize};
use std::fmt;

/// Temporal relation between a criterion and its anchor event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimingRelation {
    /// Occurs during the anchor interval
    During,
    /// Occurs before the anchor
    Before,
    /// Occurs after the anchor
    After,
    /// Interval overlaps the anchor interval
    Overlaps,
    /// Starts within the window around the anchor
    StartsWithin,
    /// No temporal constraint
    Anytime,
}

impl fmt::Display for TimingRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::During => "during",
            Self::Before => "before",
            Self::After => "after",
            Self::Overlaps => "overlaps",
            Self::StartsWithin => "starts within",
            Self::Anytime => "anytime",
        };
        write!(f, "{label}")
    }
}

/// Unit for timing window values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
            Self::Years => "years",
        };
        write!(f, "{label}")
    }
}

/// Which side of the anchor a window extends toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowDirection {
    Before,
    After,
    Surrounding,
}

impl fmt::Display for WindowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Surrounding => "surrounding",
        };
        write!(f, "{label}")
    }
}

/// A bounded window around the anchor event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingWindow {
    /// Window magnitude
    pub value: u32,
    /// Window unit
    pub unit: TimeUnit,
    /// Window direction relative to the anchor
    pub direction: WindowDirection,
}

impl TimingWindow {
    /// Create a window
    pub fn new(value: u32, unit: TimeUnit, direction: WindowDirection) -> Self {
        Self {
            value,
            unit,
            direction,
        }
    }
}

impl fmt::Display for TimingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.value, self.unit, self.direction)
    }
}

/// A complete timing constraint on a criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingExpression {
    /// Relation to the anchor
    pub relation: TimingRelation,
    /// Optional bounded window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<TimingWindow>,
    /// Event the relation is anchored to, e.g. "Measurement Period"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}

impl TimingExpression {
    /// Create a timing expression with the given relation
    pub fn new(relation: TimingRelation) -> Self {
        Self {
            relation,
            window: None,
            anchor: None,
        }
    }

    /// A timing expression with no constraint
    pub fn anytime() -> Self {
        Self::new(TimingRelation::Anytime)
    }

    /// Set the window
    pub fn with_window(mut self, window: TimingWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Set the anchor event
    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    /// Whether two expressions can stand in for one another
    ///
    /// Compatible means the same relation, with windows either equal or
    /// absent on at least one side. Anchors are descriptive and ignored.
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        if self.relation != other.relation {
            return false;
        }
        match (&self.window, &other.window) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

impl fmt::Display for TimingExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relation)?;
        if let Some(anchor) = &self.anchor {
            write!(f, " {anchor}")?;
        }
        if let Some(window) = &self.window {
            write!(f, " ({window})")?;
        }
        Ok(())
    }
}
