use super::ParentPath;

/// A rectangular block of cells under one parent, bounds inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    pub parent: ParentPath,
    pub top: usize,
    pub left: usize,
    pub bottom: usize,
    pub right: usize,
}

impl CellRange {
    pub fn new(parent: ParentPath, top: usize, left: usize, bottom: usize, right: usize) -> Self {
        CellRange {
            parent,
            top,
            left,
            bottom,
            right,
        }
    }

    /// A single cell.
    pub fn cell(parent: ParentPath, row: usize, column: usize) -> Self {
        Self::new(parent, row, column, row, column)
    }

    /// Whole rows, spanning every column up to `columns - 1`.
    pub fn rows(parent: ParentPath, first: usize, last: usize, columns: usize) -> Self {
        Self::new(parent, first, 0, last, columns.saturating_sub(1))
    }

    /// True when the range's column span touches any of `columns`.
    pub fn intersects_columns(&self, columns: &[usize]) -> bool {
        columns.iter().any(|&c| c >= self.left && c <= self.right)
    }

    pub fn row_span(&self) -> impl Iterator<Item = usize> {
        self.top..=self.bottom
    }
}
