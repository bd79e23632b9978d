//! Measure library error codes following a structured numbering system
//!
//! Error code ranges:
//! - CQM0001-CQM0099: Referential integrity (dangling links, stale usage)
//! - CQM0100-CQM0199: Guard violations (delete/archive while in use)
//! - CQM0200-CQM0299: Merge errors
//! - CQM0300-CQM0399: Sync and remote persistence errors
//! - CQM0400-CQM0499: System errors (I/O, snapshot format)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a referential integrity code (0001-0099)
    pub const fn is_integrity_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a guard violation code (0100-0199)
    pub const fn is_guard_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a merge code (0200-0299)
    pub const fn is_merge_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a sync/persistence code (0300-0399)
    pub const fn is_sync_error(&self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Check if this is a system code (0400-0499)
    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CQM{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// Static error info storage
static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

use std::collections::HashMap;
use std::sync::LazyLock;

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Referential integrity (0001-0099)
    map.insert(
        1,
        ErrorInfo::new("Dangling component reference")
            .with_help("A data element links a component id that does not resolve in the store"),
    );
    map.insert(
        2,
        ErrorInfo::new("Stale usage entry")
            .with_help("The usage index names a measure that no longer references the component"),
    );
    map.insert(3, ErrorInfo::new("Archived component still in use"));
    map.insert(
        4,
        ErrorInfo::new("Unknown measure in usage index")
            .with_help("Rebuild the usage index to drop entries for removed measures"),
    );

    // Guard violations (0100-0199)
    map.insert(100, ErrorInfo::new("Component deletion refused while in use"));
    map.insert(101, ErrorInfo::new("Component archival refused while in use"));
    map.insert(102, ErrorInfo::new("Archived component cannot be deleted"));

    // Merge errors (0200-0299)
    map.insert(200, ErrorInfo::new("Merge requires at least two components"));
    map.insert(201, ErrorInfo::new("Merge input not found"));
    map.insert(202, ErrorInfo::new("Merge input already archived"));

    // Sync and persistence (0300-0399)
    map.insert(300, ErrorInfo::new("Remote persistence failed"));
    map.insert(
        301,
        ErrorInfo::new("Retry limit exhausted")
            .with_help("The entry stays pending until an explicit retry resets its counter"),
    );
    map.insert(302, ErrorInfo::new("Sync target measure not found"));
    map.insert(303, ErrorInfo::new("Sync target element not found"));
    map.insert(304, ErrorInfo::new("Sync target component not found"));
    map.insert(305, ErrorInfo::new("Edit not representable on component"));
    map.insert(
        306,
        ErrorInfo::new("Edit held pending caller decision")
            .with_help("The component is shared; choose update-all or fork-new-version"),
    );

    // System errors (0400-0499)
    map.insert(400, ErrorInfo::new("Internal error"));
    map.insert(401, ErrorInfo::new("I/O error"));
    map.insert(402, ErrorInfo::new("Snapshot format error"));

    map
});

// Convenient error code constants

// Referential integrity
pub const CQM0001: ErrorCode = ErrorCode::new(1);
pub const CQM0002: ErrorCode = ErrorCode::new(2);
pub const CQM0003: ErrorCode = ErrorCode::new(3);
pub const CQM0004: ErrorCode = ErrorCode::new(4);

// Guard violations
pub const CQM0100: ErrorCode = ErrorCode::new(100);
pub const CQM0101: ErrorCode = ErrorCode::new(101);
pub const CQM0102: ErrorCode = ErrorCode::new(102);

// Merge errors
pub const CQM0200: ErrorCode = ErrorCode::new(200);
pub const CQM0201: ErrorCode = ErrorCode::new(201);
pub const CQM0202: ErrorCode = ErrorCode::new(202);

// Sync and persistence
pub const CQM0300: ErrorCode = ErrorCode::new(300);
pub const CQM0301: ErrorCode = ErrorCode::new(301);
pub const CQM0302: ErrorCode = ErrorCode::new(302);
pub const CQM0303: ErrorCode = ErrorCode::new(303);
pub const CQM0304: ErrorCode = ErrorCode::new(304);
pub const CQM0305: ErrorCode = ErrorCode::new(305);
pub const CQM0306: ErrorCode = ErrorCode::new(306);

// System errors
pub const CQM0400: ErrorCode = ErrorCode::new(400);
pub const CQM0401: ErrorCode = ErrorCode::new(401);
pub const CQM0402: ErrorCode = ErrorCode::new(402);
