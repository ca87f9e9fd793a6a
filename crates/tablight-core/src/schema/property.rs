use super::{ColumnId, DatasetId, FieldId};

use std::fmt;

/// A stable row identifier, independent of the row's physical position.
/// Physical positions change on insert/remove/sort; the `RowId` does not.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowId(pub u64);

impl fmt::Debug for RowId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "RowId({})", self.0)
    }
}

/// A row of a dataset, addressed by stable id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowRef {
    pub dataset: DatasetId,
    pub row: RowId,
}

/// A cell of a dataset. The `(dataset, row, column)` triple is unique.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub dataset: DatasetId,
    pub row: RowId,
    pub column: usize,
}

/// An addressable node of the schema/data space.
///
/// The whole entity subsumes every narrower property; a dataset subsumes its
/// columns, rows and cells. The validation engine leans on that ordering to
/// drop redundant check requests.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    /// The whole entity (all fields and datasets).
    Entity,
    Field(FieldId),
    Dataset(DatasetId),
    Column(ColumnId),
    Row(RowRef),
    Cell(CellRef),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Entity,
    Field,
    Dataset,
    Column,
    Row,
    Cell,
}

impl Property {
    pub fn cell(dataset: DatasetId, row: RowId, column: usize) -> Self {
        Self::Cell(CellRef {
            dataset,
            row,
            column,
        })
    }

    pub fn row(dataset: DatasetId, row: RowId) -> Self {
        Self::Row(RowRef { dataset, row })
    }

    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Entity => PropertyKind::Entity,
            Self::Field(_) => PropertyKind::Field,
            Self::Dataset(_) => PropertyKind::Dataset,
            Self::Column(_) => PropertyKind::Column,
            Self::Row(_) => PropertyKind::Row,
            Self::Cell(_) => PropertyKind::Cell,
        }
    }

    /// The dataset this property belongs to, when it belongs to one.
    pub fn dataset(&self) -> Option<DatasetId> {
        match self {
            Self::Dataset(id) => Some(*id),
            Self::Column(id) => Some(id.dataset),
            Self::Row(row) => Some(row.dataset),
            Self::Cell(cell) => Some(cell.dataset),
            _ => None,
        }
    }

    /// The stable row id, for row and cell properties.
    pub fn row_id(&self) -> Option<super::RowId> {
        match self {
            Self::Row(row) => Some(row.row),
            Self::Cell(cell) => Some(cell.row),
            _ => None,
        }
    }

    pub fn is_entity(&self) -> bool {
        matches!(self, Self::Entity)
    }

    pub fn is_dataset(&self) -> bool {
        matches!(self, Self::Dataset(_))
    }

    pub fn is_row(&self) -> bool {
        matches!(self, Self::Row(_))
    }

    pub fn is_cell(&self) -> bool {
        matches!(self, Self::Cell(_))
    }
}
