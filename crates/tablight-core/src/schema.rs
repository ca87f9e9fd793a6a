mod builder;
pub use builder::{Builder, ColumnBuilder, DatasetBuilder};

mod constraint;
pub use constraint::{Constraint, Severity};

mod dataset;
pub use dataset::{ColumnId, ColumnOptions, ColumnSchema, DatasetId, DatasetSchema};

mod field;
pub use field::{FieldId, FieldSchema};

mod property;
pub use property::{CellRef, Property, PropertyKind, RowId, RowRef};

use crate::Result;

use indexmap::IndexMap;

/// The schema of one entity: its scalar fields and tabular datasets, with
/// the structural constraints and key-column designations attached to them.
///
/// Built once on bootstrap via [`SchemaRegistry::builder`] and shared behind
/// `Rc` afterwards. Never a process-wide singleton.
#[derive(Debug)]
pub struct SchemaRegistry {
    pub(crate) fields: IndexMap<FieldId, FieldSchema>,
    pub(crate) datasets: IndexMap<DatasetId, DatasetSchema>,
}

impl SchemaRegistry {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn field(&self, id: FieldId) -> Result<&FieldSchema> {
        self.fields
            .get(&id)
            .ok_or_else(|| crate::Error::not_found(format!("field {}", id.0)))
    }

    pub fn dataset(&self, id: DatasetId) -> Result<&DatasetSchema> {
        self.datasets
            .get(&id)
            .ok_or_else(|| crate::Error::not_found(format!("dataset {}", id.0)))
    }

    pub fn column(&self, id: ColumnId) -> Result<&ColumnSchema> {
        let dataset = self.dataset(id.dataset)?;
        dataset.columns.get(id.index).ok_or_else(|| {
            crate::Error::not_found(format!("column {} of dataset {}", id.index, id.dataset.0))
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.values()
    }

    pub fn datasets(&self) -> impl Iterator<Item = &DatasetSchema> {
        self.datasets.values()
    }

    /// True when at least one dataset declares key columns, i.e. duplicate
    /// detection has any work to do at all.
    pub fn has_key_columns(&self) -> bool {
        self.datasets.values().any(|d| d.has_key_columns())
    }

    /// Checks that every id a property refers to resolves in this schema.
    pub fn validate_property(&self, property: &Property) -> Result<()> {
        match property {
            Property::Entity => Ok(()),
            Property::Field(id) => self.field(*id).map(|_| ()),
            Property::Dataset(id) => self.dataset(*id).map(|_| ()),
            Property::Column(id) => self.column(*id).map(|_| ()),
            Property::Row(row) => self.dataset(row.dataset).map(|_| ()),
            Property::Cell(cell) => self
                .column(ColumnId {
                    dataset: cell.dataset,
                    index: cell.column,
                })
                .map(|_| ()),
        }
    }
}
