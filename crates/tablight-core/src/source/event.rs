use super::{CellRange, ParentPath};
use crate::schema::{DatasetId, FieldId};
use crate::Facet;

/// A change notification from a [`DataContainer`].
///
/// Structural removals are announced twice: `AboutToBeRemoved` fires while
/// the rows are still present, so listeners can read their ids, and
/// `Removed` fires after they are gone.
///
/// [`DataContainer`]: super::DataContainer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// A scalar field changed.
    FieldChanged { field: FieldId },

    /// A rectangular block of cells changed for the listed facets.
    CellsChanged {
        dataset: DatasetId,
        range: CellRange,
        facets: Vec<Facet>,
    },

    RowsInserted {
        dataset: DatasetId,
        parent: ParentPath,
        first: usize,
        last: usize,
    },

    RowsAboutToBeRemoved {
        dataset: DatasetId,
        parent: ParentPath,
        first: usize,
        last: usize,
    },

    RowsRemoved {
        dataset: DatasetId,
        parent: ParentPath,
        first: usize,
        last: usize,
    },

    ColumnsInserted {
        dataset: DatasetId,
        first: usize,
        last: usize,
    },

    ColumnsAboutToBeRemoved {
        dataset: DatasetId,
        first: usize,
        last: usize,
    },

    ColumnsRemoved {
        dataset: DatasetId,
        first: usize,
        last: usize,
    },

    /// The dataset's contents were replaced wholesale.
    Reset { dataset: DatasetId },
}

impl SourceEvent {
    /// The dataset this event concerns, when it concerns one.
    pub fn dataset(&self) -> Option<DatasetId> {
        match self {
            Self::FieldChanged { .. } => None,
            Self::CellsChanged { dataset, .. }
            | Self::RowsInserted { dataset, .. }
            | Self::RowsAboutToBeRemoved { dataset, .. }
            | Self::RowsRemoved { dataset, .. }
            | Self::ColumnsInserted { dataset, .. }
            | Self::ColumnsAboutToBeRemoved { dataset, .. }
            | Self::ColumnsRemoved { dataset, .. }
            | Self::Reset { dataset } => Some(*dataset),
        }
    }
}
