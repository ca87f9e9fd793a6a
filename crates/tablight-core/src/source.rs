mod container;
pub use container::DataContainer;

mod event;
pub use event::SourceEvent;

mod mem;
pub use mem::MemTable;

mod observers;
pub use observers::{Observers, SubscriptionId};

mod range;
pub use range::CellRange;

mod row_set;
pub use row_set::{ParentPath, RowLocator, RowSet};

use crate::schema::RowId;
use crate::{Facet, Result, Value};

/// Read access to one tabular dataset, possibly hierarchical.
///
/// Rows are addressed two ways: by physical position under a parent path,
/// which shifts on structural changes, and by stable [`RowId`], which does
/// not. Indices store locators and re-resolve ids through [`locate`].
///
/// [`locate`]: TabularSource::locate
pub trait TabularSource {
    /// Number of rows directly under `parent`.
    fn row_count(&self, parent: &ParentPath) -> usize;

    fn column_count(&self) -> usize;

    /// The value of the cell at `(row, column)` under `parent` for the
    /// given facet.
    fn value(&self, row: usize, column: usize, facet: Facet, parent: &ParentPath) -> Result<Value>;

    /// The stable id of the row at `row` under `parent`.
    fn row_id(&self, row: usize, parent: &ParentPath) -> Result<RowId>;

    /// Resolves a stable id back to its current physical position, or
    /// `None` when the row no longer exists.
    fn locate(&self, id: RowId) -> Option<RowLocator>;
}

/// Depth-first traversal over every row of `source`, parents before
/// children. The callback may stop the walk early by returning `false`.
pub fn walk_rows(
    source: &dyn TabularSource,
    mut visit: impl FnMut(usize, &ParentPath) -> Result<bool>,
) -> Result<()> {
    fn go(
        source: &dyn TabularSource,
        parent: &ParentPath,
        visit: &mut impl FnMut(usize, &ParentPath) -> Result<bool>,
    ) -> Result<bool> {
        for row in 0..source.row_count(parent) {
            if !visit(row, parent)? {
                return Ok(false);
            }
            let child = parent.child(row);
            if !go(source, &child, visit)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    go(source, &ParentPath::root(), &mut visit).map(|_| ())
}
