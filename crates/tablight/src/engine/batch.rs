use super::{DatasetInfo, ExternalChecker, ValidationEngine};
use crate::highlight::{FindingId, HighlightInfo, HighlightItem, KEY_DUPLICATE_GROUP};
use tablight_core::index::KEY_SEPARATOR;
use tablight_core::schema::{
    CellRef, ColumnId, Constraint, DatasetId, DatasetSchema, FieldId, Property, RowRef, Severity,
};
use tablight_core::source::{walk_rows, ParentPath, TabularSource};
use tablight_core::{Error, Facet, Result, Value};

use indexmap::IndexSet;
use std::rc::Rc;

/// The batch's work list after subsumption: what actually gets checked.
#[derive(Debug, Default)]
struct CheckPlan {
    fields: IndexSet<FieldId>,
    datasets: IndexSet<DatasetId>,
    columns: IndexSet<ColumnId>,
    rows: IndexSet<RowRef>,
    cells: IndexSet<CellRef>,
    duplicates: IndexSet<DatasetId>,
    /// The properties as registered, for the catch-all checker hook.
    registered: Vec<Property>,
}

enum Delta {
    Set(HighlightItem),
    Remove(Property, FindingId),
}

impl ValidationEngine {
    pub(super) fn run_batch(&self) -> Result<()> {
        let dirty: Vec<Property> = self.dirty.borrow_mut().drain(..).collect();
        let duplicates: Vec<DatasetId> = self.dirty_duplicates.borrow_mut().drain(..).collect();
        if dirty.is_empty() && duplicates.is_empty() {
            return Ok(());
        }

        self.executing.set(true);
        let result = self.run_plan(self.build_plan(dirty, duplicates));
        self.executing.set(false);

        result?;

        // Check requests registered by our own event subscribers would loop
        // the batch forever; treat them as a caller bug.
        let reentrant = self.dirty.borrow().len() + self.dirty_duplicates.borrow().len();
        if reentrant > 0 {
            self.clear_check_requests();
            return Err(Error::reentrant_check(reentrant));
        }
        Ok(())
    }

    fn build_plan(&self, dirty: Vec<Property>, duplicates: Vec<DatasetId>) -> CheckPlan {
        let mut plan = CheckPlan {
            registered: dirty.clone(),
            ..CheckPlan::default()
        };
        plan.duplicates.extend(duplicates);

        if dirty.iter().any(|p| p.is_entity()) {
            for field in self.schema().fields() {
                plan.fields.insert(field.id);
            }
            for dataset in self.schema().datasets() {
                plan.datasets.insert(dataset.id);
                if dataset.has_key_columns() {
                    plan.duplicates.insert(dataset.id);
                }
            }
            return plan;
        }

        for property in &dirty {
            match property {
                Property::Entity => unreachable!(),
                Property::Field(id) => {
                    plan.fields.insert(*id);
                }
                Property::Dataset(id) => {
                    plan.datasets.insert(*id);
                }
                Property::Column(id) => {
                    plan.columns.insert(*id);
                }
                Property::Row(row) => {
                    plan.rows.insert(*row);
                }
                Property::Cell(cell) => {
                    plan.cells.insert(*cell);
                }
            }
        }

        // A full dataset check covers everything narrower in it; a row or
        // column check covers its cells.
        plan.columns.retain(|c| !plan.datasets.contains(&c.dataset));
        plan.rows.retain(|r| !plan.datasets.contains(&r.dataset));
        plan.cells.retain(|c| {
            !plan.datasets.contains(&c.dataset)
                && !plan.rows.contains(&RowRef {
                    dataset: c.dataset,
                    row: c.row,
                })
                && !plan.columns.contains(&ColumnId {
                    dataset: c.dataset,
                    index: c.column,
                })
        });
        for dataset in &plan.datasets {
            if self
                .dataset_info(*dataset)
                .map(|info| info.has_keys())
                .unwrap_or(false)
            {
                plan.duplicates.insert(*dataset);
            }
        }
        plan
    }

    fn run_plan(&self, plan: CheckPlan) -> Result<()> {
        let auto = !self.is_auto_blocked();
        let checkers: Vec<Rc<dyn ExternalChecker>> = self.checkers.borrow().clone();
        // A simple engine drives checkers through `check_property` only.
        let detailed: &[Rc<dyn ExternalChecker>] = if self.simple { &[] } else { &checkers };
        let mut info = HighlightInfo::new();

        for field_id in &plan.fields {
            self.check_field(*field_id, auto, detailed, &mut info)?;
        }

        for dataset_id in &plan.datasets {
            let schema = self.schema().clone();
            let dataset = schema.dataset(*dataset_id)?;
            let source = self.data().source(*dataset_id)?;
            // The table can be narrower than the schema after a column
            // removal; the dataset re-check only walks what exists.
            let width = dataset.columns.len().min(source.column_count());
            walk_rows(source.as_ref(), |row, parent| {
                for column in 0..width {
                    self.check_cell(
                        dataset, &*source, row, parent, column, auto, detailed, &mut info,
                    )?;
                }
                Ok(true)
            })?;
            for checker in detailed {
                checker.check_dataset(dataset, &mut info);
            }
        }

        for column_id in &plan.columns {
            let schema = self.schema().clone();
            let dataset = schema.dataset(column_id.dataset)?;
            let source = self.data().source(column_id.dataset)?;
            if column_id.index >= source.column_count() {
                continue;
            }
            walk_rows(source.as_ref(), |row, parent| {
                self.check_cell(
                    dataset,
                    &*source,
                    row,
                    parent,
                    column_id.index,
                    auto,
                    detailed,
                    &mut info,
                )?;
                Ok(true)
            })?;
        }

        for row_ref in &plan.rows {
            let schema = self.schema().clone();
            let dataset = schema.dataset(row_ref.dataset)?;
            let source = self.data().source(row_ref.dataset)?;
            let width = dataset.columns.len().min(source.column_count());
            // A removed row has no cells left to check; its stale items go
            // away through the removal path.
            if let Some(locator) = source.locate(row_ref.row) {
                for column in 0..width {
                    self.check_cell(
                        dataset,
                        &*source,
                        locator.row,
                        &locator.parent,
                        column,
                        auto,
                        detailed,
                        &mut info,
                    )?;
                }
            }
        }

        for cell in &plan.cells {
            let schema = self.schema().clone();
            let dataset = schema.dataset(cell.dataset)?;
            let source = self.data().source(cell.dataset)?;
            if cell.column >= source.column_count() {
                continue;
            }
            if let Some(locator) = source.locate(cell.row) {
                self.check_cell(
                    dataset,
                    &*source,
                    locator.row,
                    &locator.parent,
                    cell.column,
                    auto,
                    detailed,
                    &mut info,
                )?;
            }
        }

        // Row and cell checks still owe their dataset a `check_dataset`
        // call; datasets checked in full already got one.
        let mut direct: IndexSet<DatasetId> = IndexSet::new();
        direct.extend(plan.rows.iter().map(|r| r.dataset));
        direct.extend(plan.cells.iter().map(|c| c.dataset));
        direct.retain(|d| !plan.datasets.contains(d));
        for dataset_id in &direct {
            let schema = self.schema().clone();
            let dataset = schema.dataset(*dataset_id)?;
            for checker in detailed {
                checker.check_dataset(dataset, &mut info);
            }
        }

        if auto {
            for dataset_id in &plan.duplicates {
                self.check_duplicates(*dataset_id, &mut info)?;
            }
        }

        for property in &plan.registered {
            for checker in &checkers {
                checker.check_property(*property, &mut info);
            }
        }

        self.apply(info);
        Ok(())
    }

    fn check_field(
        &self,
        field_id: FieldId,
        auto: bool,
        checkers: &[Rc<dyn ExternalChecker>],
        info: &mut HighlightInfo,
    ) -> Result<()> {
        let schema = self.schema().clone();
        let field = schema.field(field_id)?;
        let value = self.data().field_value(field_id)?;
        if auto {
            stage_constraints(info, Property::Field(field_id), &field.constraints, &value, &field.name);
        }
        for checker in checkers {
            checker.check_field(field, &value, info);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn check_cell(
        &self,
        dataset: &DatasetSchema,
        source: &dyn TabularSource,
        row: usize,
        parent: &ParentPath,
        column: usize,
        auto: bool,
        checkers: &[Rc<dyn ExternalChecker>],
        info: &mut HighlightInfo,
    ) -> Result<()> {
        let row_id = source.row_id(row, parent)?;
        let cell = CellRef {
            dataset: dataset.id,
            row: row_id,
            column,
        };
        let column_schema = dataset
            .columns
            .get(column)
            .ok_or_else(|| Error::not_found(format!("column {}", column)))?;
        let value = source.value(row, column, Facet::DISPLAY, parent)?;
        if auto {
            stage_constraints(
                info,
                Property::Cell(cell),
                &column_schema.constraints,
                &value,
                &column_schema.name,
            );
        }
        for checker in checkers {
            checker.check_cell(cell, column_schema, &value, info);
        }
        Ok(())
    }

    /// Re-verdicts duplicate-key findings for every row of the dataset.
    fn check_duplicates(&self, dataset_id: DatasetId, info: &mut HighlightInfo) -> Result<()> {
        let dinfo = self.dataset_info(dataset_id)?;
        if !dinfo.has_keys() {
            return Ok(());
        }
        let source = self.data().source(dataset_id)?;
        if dinfo.key_columns.iter().any(|&c| c >= source.column_count()) {
            return Ok(());
        }
        let key_values = self.key_values.borrow().clone();
        let index = dinfo.index(&source, key_values.clone());

        walk_rows(source.as_ref(), |row, parent| {
            let row_id = source.row_id(row, parent)?;
            let error_column = dinfo.error_column.unwrap_or(0);
            let target = Property::cell(dataset_id, row_id, error_column);

            if let Some(hook) = &key_values {
                if let Some((message, property)) =
                    hook.check_key_values(dataset_id, row, parent, source.as_ref())?
                {
                    info.set(HighlightItem::new(
                        property,
                        FindingId::UNIQUE,
                        message,
                        Severity::Error,
                    ));
                    info.empty(target, FindingId::UNIQUE);
                    return Ok(true);
                }
            }

            if base_key_incomplete(&dinfo, source.as_ref(), row, parent)? {
                info.empty(target, FindingId::UNIQUE);
                return Ok(true);
            }

            match index.row_key(row, parent)? {
                None => info.empty(target, FindingId::UNIQUE),
                Some(key) => {
                    if index.find_rows_by_hash(&key)?.len() > 1 {
                        info.set(duplicate_item(target, &key));
                    } else {
                        info.empty(target, FindingId::UNIQUE);
                    }
                }
            }
            Ok(true)
        })
    }

    /// Diffs the staged verdicts into the model. Only actual differences
    /// produce events, bracketed by one begin/end pair; a pass that changes
    /// nothing emits nothing.
    fn apply(&self, info: HighlightInfo) {
        let mut deltas = vec![];
        for (property, id, staged) in info.into_entries() {
            match staged {
                Some(item) => {
                    if self.highlight.get(property, id).as_ref() != Some(&item) {
                        deltas.push(Delta::Set(item));
                    }
                }
                None => {
                    if self.highlight.contains(property, id) {
                        deltas.push(Delta::Remove(property, id));
                    }
                }
            }
        }
        if deltas.is_empty() {
            return;
        }
        self.highlight.begin_update();
        for delta in deltas {
            match delta {
                Delta::Set(item) => self.highlight.add(item),
                Delta::Remove(property, id) => self.highlight.remove(property, id),
            }
        }
        self.highlight.end_update();
    }
}

/// Runs the built-in constraints of one property, staging a verdict per
/// constraint kind.
fn stage_constraints(
    info: &mut HighlightInfo,
    property: Property,
    constraints: &[Constraint],
    value: &Value,
    subject: &str,
) {
    for constraint in constraints {
        let id = FindingId(constraint.kind_code());
        match constraint.check(value, subject) {
            Some(message) => info.set(HighlightItem::new(
                property,
                id,
                message,
                constraint.severity(),
            )),
            None => info.empty(property, id),
        }
    }
}

/// True when any base-key value of the row is still blank. Such a row is
/// not identified yet and is exempt from duplicate detection.
fn base_key_incomplete(
    dinfo: &DatasetInfo,
    source: &dyn TabularSource,
    row: usize,
    parent: &ParentPath,
) -> Result<bool> {
    for &column in &dinfo.base_key_columns {
        if source.value(row, column, Facet::DISPLAY, parent)?.is_blank() {
            return Ok(true);
        }
    }
    Ok(false)
}

fn duplicate_item(target: Property, key: &str) -> HighlightItem {
    let display: Vec<&str> = key.split(KEY_SEPARATOR).collect();
    let message = format!("\u{201c}{}\u{201d} is not unique", display.join(", "));
    HighlightItem::new(target, FindingId::UNIQUE, message, Severity::Error)
        .with_group_code(KEY_DUPLICATE_GROUP)
        .with_data(Value::from(key))
}
