use super::ValidationEngine;
use tablight_core::schema::{DatasetId, Property, RowId};
use tablight_core::source::{CellRange, ParentPath, SourceEvent, TabularSource};
use tablight_core::Result;

impl ValidationEngine {
    /// Entry point for data container notifications. Errors cannot cross
    /// the notification boundary; they are stashed and surfaced by the
    /// next `execute_checks` call.
    pub(super) fn handle_source_event(&self, event: &SourceEvent) {
        if let Err(err) = self.apply_source_event(event) {
            self.deferred_error.borrow_mut().get_or_insert(err);
        }
    }

    fn apply_source_event(&self, event: &SourceEvent) -> Result<()> {
        match event {
            SourceEvent::FieldChanged { field } => {
                self.register_check(Property::Field(*field))?;
            }

            SourceEvent::CellsChanged {
                dataset, range, ..
            } => {
                self.cells_changed(*dataset, range)?;
            }

            SourceEvent::RowsInserted {
                dataset,
                parent,
                first,
                last,
            } => {
                let dinfo = self.dataset_info(*dataset)?;
                dinfo.clear_index();
                let source = self.data().source(*dataset)?;
                for row in *first..=*last {
                    let id = source.row_id(row, parent)?;
                    self.register_check(Property::row(*dataset, id))?;
                }
                self.register_dataset_duplicate_check(*dataset)?;
            }

            SourceEvent::RowsAboutToBeRemoved {
                dataset,
                parent,
                first,
                last,
            } => {
                // Capture ids while the rows still exist; applied on the
                // matching Removed event.
                let source = self.data().source(*dataset)?;
                let mut ids = vec![];
                collect_row_ids(source.as_ref(), parent, *first, *last, &mut ids)?;
                self.pending_removals
                    .borrow_mut()
                    .extend(ids.into_iter().map(|id| Property::row(*dataset, id)));
            }

            SourceEvent::RowsRemoved { dataset, .. } => {
                let dinfo = self.dataset_info(*dataset)?;
                dinfo.clear_index();
                let removed: Vec<Property> =
                    self.pending_removals.borrow_mut().drain(..).collect();
                if !removed.is_empty() {
                    self.highlight.begin_update();
                    for property in removed {
                        self.highlight.remove_property(property);
                    }
                    self.highlight.end_update();
                }
                self.register_dataset_duplicate_check(*dataset)?;
            }

            SourceEvent::ColumnsInserted { dataset, .. }
            | SourceEvent::ColumnsRemoved { dataset, .. } => {
                // Column positions shifted under the schema; every stored
                // key and finding position is suspect.
                let dinfo = self.dataset_info(*dataset)?;
                dinfo.clear_index();
                self.register_check(Property::Dataset(*dataset))?;
            }

            SourceEvent::ColumnsAboutToBeRemoved { dataset, first, .. } => {
                // Positions at and after the removed span shift; the
                // dataset re-check recreates findings for the survivors.
                self.remove_column_items(*dataset, *first);
                self.register_dataset_duplicate_check(*dataset)?;
            }

            SourceEvent::Reset { dataset } => {
                let dinfo = self.dataset_info(*dataset)?;
                dinfo.clear_index();
                self.remove_dataset_items(*dataset);
                self.register_check(Property::Dataset(*dataset))?;
            }
        }
        Ok(())
    }

    fn cells_changed(&self, dataset: DatasetId, range: &CellRange) -> Result<()> {
        let dinfo = self.dataset_info(dataset)?;
        dinfo.invalidate_for_columns(range);

        let columns = self.schema().dataset(dataset)?.columns.len();
        let source = self.data().source(dataset)?;
        for row in range.row_span() {
            let id = source.row_id(row, &range.parent)?;
            for column in range.left..=range.right.min(columns.saturating_sub(1)) {
                self.register_check(Property::cell(dataset, id, column))?;
            }
        }

        // A key-column edit can create or resolve duplicates anywhere in
        // the dataset, not just in the changed rows.
        if range.intersects_columns(&dinfo.key_columns) {
            self.register_dataset_duplicate_check(dataset)?;
        }
        Ok(())
    }

    fn remove_column_items(&self, dataset: DatasetId, first: usize) {
        let stale: Vec<_> = self
            .highlight
            .items()
            .into_iter()
            .filter(|item| match item.property {
                Property::Column(id) => id.dataset == dataset && id.index >= first,
                Property::Cell(cell) => cell.dataset == dataset && cell.column >= first,
                _ => false,
            })
            .collect();
        if stale.is_empty() {
            return;
        }
        self.highlight.begin_update();
        for item in stale {
            self.highlight.remove(item.property, item.id);
        }
        self.highlight.end_update();
    }

    fn remove_dataset_items(&self, dataset: DatasetId) {
        let stale: Vec<_> = self
            .highlight
            .items()
            .into_iter()
            .filter(|item| item.property.dataset() == Some(dataset))
            .collect();
        if stale.is_empty() {
            return;
        }
        self.highlight.begin_update();
        for item in stale {
            self.highlight.remove(item.property, item.id);
        }
        self.highlight.end_update();
    }
}

fn collect_row_ids(
    source: &dyn TabularSource,
    parent: &ParentPath,
    first: usize,
    last: usize,
    out: &mut Vec<RowId>,
) -> Result<()> {
    for row in first..=last {
        out.push(source.row_id(row, parent)?);
        let child = parent.child(row);
        let children = source.row_count(&child);
        if children > 0 {
            collect_row_ids(source, &child, 0, children - 1, out)?;
        }
    }
    Ok(())
}
