use super::Constraint;

use std::fmt;

/// Uniquely identifies a tabular dataset of the entity.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatasetId(pub u32);

impl fmt::Debug for DatasetId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "DatasetId({})", self.0)
    }
}

/// Uniquely identifies a column within a dataset.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnId {
    pub dataset: DatasetId,

    /// Zero-based position of the column within the dataset.
    pub index: usize,
}

/// Per-column designations beyond plain constraints.
#[derive(Debug, Default, Clone)]
pub struct ColumnOptions {
    /// The column participates in the dataset's uniqueness key.
    pub key: bool,

    /// The column is part of the base key: when every base-key value of a
    /// row is blank, the row is exempt from duplicate detection.
    pub base_key: bool,

    /// Duplicate findings for a row are attached to this column's cell
    /// rather than the default one.
    pub error_display: bool,
}

/// One column of a dataset.
#[derive(Debug)]
pub struct ColumnSchema {
    /// Human-readable name, used in finding messages.
    pub name: String,

    /// Constraints checked against every cell of the column.
    pub constraints: Vec<Constraint>,

    pub options: ColumnOptions,
}

/// A tabular dataset of the entity. Columns are fixed by the schema; rows
/// live in the data source.
#[derive(Debug)]
pub struct DatasetSchema {
    pub id: DatasetId,

    /// Human-readable name, used in finding messages.
    pub name: String,

    pub columns: Vec<ColumnSchema>,
}

impl DatasetSchema {
    /// Positions of the key columns, in ascending order.
    pub fn key_columns(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.options.key)
            .map(|(i, _)| i)
            .collect()
    }

    /// Positions of the base-key columns, in ascending order.
    pub fn base_key_columns(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.options.base_key)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn has_key_columns(&self) -> bool {
        self.columns.iter().any(|c| c.options.key)
    }

    /// The column duplicate findings attach to: the explicitly designated
    /// one when present, the lowest key-column position otherwise.
    pub fn error_column(&self) -> Option<usize> {
        if let Some(pos) = self.columns.iter().position(|c| c.options.error_display) {
            return Some(pos);
        }
        self.columns.iter().position(|c| c.options.key)
    }
}
