use super::{
    CellRange, MemTable, Observers, ParentPath, RowLocator, SourceEvent, SubscriptionId,
    TabularSource,
};
use crate::schema::{DatasetId, FieldId, RowId, SchemaRegistry};
use crate::{Error, Facet, Result, Value};

use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Owns the entity's data: scalar field values plus one table per dataset.
///
/// Every mutation goes through the container so that a single change
/// notification stream covers the whole entity. Indices and the validation
/// engine subscribe to that stream.
pub struct DataContainer {
    schema: Rc<SchemaRegistry>,
    fields: RefCell<IndexMap<FieldId, Value>>,
    tables: IndexMap<DatasetId, Rc<MemTable>>,
    observers: Observers<SourceEvent>,
}

impl DataContainer {
    /// Creates a container with an empty table per dataset of `schema`.
    pub fn new(schema: Rc<SchemaRegistry>) -> Self {
        let tables = schema
            .datasets()
            .map(|d| (d.id, Rc::new(MemTable::new(d.columns.len()))))
            .collect();
        DataContainer {
            schema,
            fields: RefCell::new(IndexMap::new()),
            tables,
            observers: Observers::new(),
        }
    }

    pub fn schema(&self) -> &Rc<SchemaRegistry> {
        &self.schema
    }

    pub fn subscribe(&self, callback: impl Fn(&SourceEvent) + 'static) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.observers.unsubscribe(id);
    }

    /// Re-emits `event` to all subscribers. Sources layered on top of the
    /// container use this to forward changes the container cannot see.
    pub fn notify(&self, event: &SourceEvent) {
        self.observers.notify(event);
    }

    pub fn field_value(&self, field: FieldId) -> Result<Value> {
        self.schema.field(field)?;
        Ok(self
            .fields
            .borrow()
            .get(&field)
            .cloned()
            .unwrap_or(Value::Null))
    }

    pub fn set_field(&self, field: FieldId, value: Value) -> Result<()> {
        self.schema.field(field)?;
        let changed = {
            let mut fields = self.fields.borrow_mut();
            let prev = fields.insert(field, value.clone());
            prev.as_ref() != Some(&value)
        };
        if changed {
            self.observers.notify(&SourceEvent::FieldChanged { field });
        }
        Ok(())
    }

    pub fn table(&self, dataset: DatasetId) -> Result<&Rc<MemTable>> {
        self.tables
            .get(&dataset)
            .ok_or_else(|| Error::not_found(format!("dataset {}", dataset.0)))
    }

    /// The dataset's table as a trait object, for index construction.
    pub fn source(&self, dataset: DatasetId) -> Result<Rc<dyn TabularSource>> {
        Ok(self.table(dataset)?.clone() as Rc<dyn TabularSource>)
    }

    pub fn set_cell(
        &self,
        dataset: DatasetId,
        row: usize,
        column: usize,
        facet: Facet,
        value: Value,
        parent: &ParentPath,
    ) -> Result<()> {
        let table = self.table(dataset)?;
        let prev = table.value(row, column, facet, parent)?;
        if prev == value {
            return Ok(());
        }
        table.set_value(row, column, facet, value, parent)?;
        self.observers.notify(&SourceEvent::CellsChanged {
            dataset,
            range: CellRange::cell(parent.clone(), row, column),
            facets: vec![facet],
        });
        Ok(())
    }

    pub fn insert_rows(
        &self,
        dataset: DatasetId,
        parent: &ParentPath,
        at: usize,
        count: usize,
    ) -> Result<Vec<RowId>> {
        let ids = self.table(dataset)?.insert_rows(parent, at, count)?;
        self.observers.notify(&SourceEvent::RowsInserted {
            dataset,
            parent: parent.clone(),
            first: at,
            last: at + count - 1,
        });
        Ok(ids)
    }

    pub fn remove_rows(
        &self,
        dataset: DatasetId,
        parent: &ParentPath,
        first: usize,
        last: usize,
    ) -> Result<()> {
        let table = self.table(dataset)?.clone();
        self.observers.notify(&SourceEvent::RowsAboutToBeRemoved {
            dataset,
            parent: parent.clone(),
            first,
            last,
        });
        table.remove_rows(parent, first, last)?;
        self.observers.notify(&SourceEvent::RowsRemoved {
            dataset,
            parent: parent.clone(),
            first,
            last,
        });
        Ok(())
    }

    pub fn insert_columns(&self, dataset: DatasetId, at: usize, count: usize) -> Result<()> {
        self.table(dataset)?.insert_columns(at, count)?;
        self.observers.notify(&SourceEvent::ColumnsInserted {
            dataset,
            first: at,
            last: at + count - 1,
        });
        Ok(())
    }

    pub fn remove_columns(&self, dataset: DatasetId, first: usize, last: usize) -> Result<()> {
        let table = self.table(dataset)?.clone();
        self.observers.notify(&SourceEvent::ColumnsAboutToBeRemoved {
            dataset,
            first,
            last,
        });
        table.remove_columns(first, last)?;
        self.observers
            .notify(&SourceEvent::ColumnsRemoved { dataset, first, last });
        Ok(())
    }

    /// Drops every row of the dataset and announces a reset.
    pub fn reset(&self, dataset: DatasetId) -> Result<()> {
        self.table(dataset)?.clear();
        self.observers.notify(&SourceEvent::Reset { dataset });
        Ok(())
    }

    pub fn find_row(&self, dataset: DatasetId, id: RowId) -> Result<Option<RowLocator>> {
        Ok(self.table(dataset)?.locate(id))
    }
}

impl std::fmt::Debug for DataContainer {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("DataContainer")
            .field("fields", &self.fields.borrow().len())
            .field("tables", &self.tables.len())
            .finish()
    }
}
