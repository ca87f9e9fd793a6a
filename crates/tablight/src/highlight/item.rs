use tablight_core::schema::{Property, Severity};
use tablight_core::Value;

use std::fmt;

/// Group code reserved for duplicate-key findings. Rows sharing a key get
/// items with this code and per-key data, so a view can walk a duplicate
/// group together.
pub const KEY_DUPLICATE_GROUP: i32 = i32::MAX;

/// Identifies a finding kind within one property. A property carries at
/// most one item per id, so re-checking replaces instead of stacking.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FindingId(pub u32);

impl FindingId {
    /// A required value is blank.
    pub const REQUIRED: FindingId = FindingId(1);

    /// A value exceeds its maximum text length.
    pub const MAX_TEXT_LENGTH: FindingId = FindingId(2);

    /// A value fails its regular expression constraint.
    pub const REGEXP: FindingId = FindingId(3);

    /// A value fails a custom predicate constraint.
    pub const CUSTOM: FindingId = FindingId(4);

    /// A row duplicates another row's uniqueness key.
    pub const UNIQUE: FindingId = FindingId(5);

    /// First id available for application-defined findings.
    pub const USER_BASE: FindingId = FindingId(100);
}

impl fmt::Debug for FindingId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "FindingId({})", self.0)
    }
}

impl From<u32> for FindingId {
    fn from(src: u32) -> Self {
        FindingId(src)
    }
}

/// One finding: a message of some severity attached to a property.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightItem {
    /// What the finding is attached to.
    pub property: Property,

    pub id: FindingId,

    pub message: String,

    pub severity: Severity,

    /// Findings with equal group codes belong together across properties,
    /// e.g. all rows of one duplicate-key group.
    pub group_code: Option<i32>,

    /// Application payload carried with the finding.
    pub data: Value,
}

impl HighlightItem {
    pub fn new(
        property: Property,
        id: FindingId,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        HighlightItem {
            property,
            id,
            message: message.into(),
            severity,
            group_code: None,
            data: Value::Null,
        }
    }

    pub fn with_group_code(mut self, group_code: i32) -> Self {
        self.group_code = Some(group_code);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
