use super::{
    ColumnOptions, ColumnSchema, Constraint, DatasetId, DatasetSchema, FieldId, FieldSchema,
    SchemaRegistry,
};
use crate::{Error, Result};

use indexmap::IndexMap;

/// Builds a [`SchemaRegistry`].
#[derive(Debug, Default)]
pub struct Builder {
    fields: Vec<FieldSchema>,
    datasets: Vec<DatasetSchema>,
}

/// Builds one dataset of the schema.
#[derive(Debug)]
pub struct DatasetBuilder {
    parent: Builder,
    id: DatasetId,
    name: String,
    columns: Vec<ColumnSchema>,
}

/// Builds one column of a dataset.
#[derive(Debug)]
pub struct ColumnBuilder {
    parent: DatasetBuilder,
    name: String,
    constraints: Vec<Constraint>,
    options: ColumnOptions,
}

impl Builder {
    /// Declares a scalar field.
    pub fn field(
        mut self,
        id: FieldId,
        name: impl Into<String>,
        constraints: Vec<Constraint>,
    ) -> Self {
        self.fields.push(FieldSchema {
            id,
            name: name.into(),
            constraints,
        });
        self
    }

    /// Opens a dataset; close it with [`DatasetBuilder::done`].
    pub fn dataset(self, id: DatasetId, name: impl Into<String>) -> DatasetBuilder {
        DatasetBuilder {
            parent: self,
            id,
            name: name.into(),
            columns: vec![],
        }
    }

    /// Validates the declarations and produces the registry.
    pub fn build(self) -> Result<SchemaRegistry> {
        let mut fields = IndexMap::new();
        for field in self.fields {
            let id = field.id;
            if fields.insert(id, field).is_some() {
                return Err(Error::duplicate_key(format!("field {}", id.0)));
            }
        }

        let mut datasets = IndexMap::new();
        for dataset in self.datasets {
            let id = dataset.id;

            let error_columns = dataset
                .columns
                .iter()
                .filter(|c| c.options.error_display)
                .count();
            if error_columns > 1 {
                return Err(Error::invariant(format!(
                    "dataset {} designates more than one error display column",
                    id.0
                )));
            }

            for (pos, column) in dataset.columns.iter().enumerate() {
                if column.options.base_key && !column.options.key {
                    return Err(Error::invariant(format!(
                        "column {} of dataset {} is base-key but not key",
                        pos, id.0
                    )));
                }
            }

            if datasets.insert(id, dataset).is_some() {
                return Err(Error::duplicate_key(format!("dataset {}", id.0)));
            }
        }

        Ok(SchemaRegistry { fields, datasets })
    }
}

impl DatasetBuilder {
    /// Opens a column; close it with [`ColumnBuilder::done`].
    pub fn column(self, name: impl Into<String>) -> ColumnBuilder {
        ColumnBuilder {
            parent: self,
            name: name.into(),
            constraints: vec![],
            options: ColumnOptions::default(),
        }
    }

    pub fn done(mut self) -> Builder {
        self.parent.datasets.push(DatasetSchema {
            id: self.id,
            name: self.name,
            columns: self.columns,
        });
        self.parent
    }
}

impl ColumnBuilder {
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Marks the column as part of the dataset's uniqueness key.
    pub fn key(mut self) -> Self {
        self.options.key = true;
        self
    }

    /// Marks the column as part of the base key. Implies [`ColumnBuilder::key`]
    /// must also be set before `build`.
    pub fn base_key(mut self) -> Self {
        self.options.base_key = true;
        self
    }

    /// Duplicate findings of this dataset attach to this column.
    pub fn error_display(mut self) -> Self {
        self.options.error_display = true;
        self
    }

    pub fn done(mut self) -> DatasetBuilder {
        self.parent.columns.push(ColumnSchema {
            name: self.name,
            constraints: self.constraints,
            options: self.options,
        });
        self.parent
    }
}
