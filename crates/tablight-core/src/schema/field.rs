use super::Constraint;

use std::fmt;

/// Uniquely identifies a scalar field of the entity.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldId(pub u32);

impl fmt::Debug for FieldId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "FieldId({})", self.0)
    }
}

/// A scalar (non-tabular) field of the entity.
#[derive(Debug)]
pub struct FieldSchema {
    pub id: FieldId,

    /// Human-readable name, used in finding messages.
    pub name: String,

    /// Constraints checked against the field's value.
    pub constraints: Vec<Constraint>,
}
