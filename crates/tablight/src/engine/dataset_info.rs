use super::KeyValues;
use tablight_core::index::{CustomKey, HashedIndex, KeyCustomize, KeySpec};
use tablight_core::schema::{DatasetId, DatasetSchema};
use tablight_core::source::{CellRange, ParentPath, TabularSource};
use tablight_core::Result;

use std::cell::RefCell;
use std::rc::Rc;

/// Per-dataset state the engine keeps for duplicate detection: the key
/// designations snapshotted from the schema plus the lazily created key
/// index.
#[derive(Debug)]
pub struct DatasetInfo {
    pub dataset: DatasetId,
    pub key_columns: Vec<usize>,
    pub base_key_columns: Vec<usize>,
    pub error_column: Option<usize>,
    index: RefCell<Option<Rc<HashedIndex>>>,
}

impl DatasetInfo {
    pub fn new(schema: &DatasetSchema) -> Self {
        DatasetInfo {
            dataset: schema.id,
            key_columns: schema.key_columns(),
            base_key_columns: schema.base_key_columns(),
            error_column: schema.error_column(),
            index: RefCell::new(None),
        }
    }

    pub fn has_keys(&self) -> bool {
        !self.key_columns.is_empty()
    }

    pub fn key_spec(&self) -> KeySpec {
        KeySpec::simple(&self.key_columns)
    }

    /// The key index over `source`, created on first use. When a
    /// [`KeyValues`] hook is supplied, it is installed as the index's key
    /// customization.
    pub fn index(
        &self,
        source: &Rc<dyn TabularSource>,
        key_values: Option<Rc<dyn KeyValues>>,
    ) -> Rc<HashedIndex> {
        if let Some(index) = self.index.borrow().as_ref() {
            return index.clone();
        }
        let index = Rc::new(HashedIndex::new(self.key_spec(), source.clone()));
        if let Some(hook) = key_values {
            index.set_customization(Some(Rc::new(KeyValuesAdapter {
                dataset: self.dataset,
                hook,
            })));
        }
        *self.index.borrow_mut() = Some(index.clone());
        index
    }

    /// Drops the index so the next pass rebuilds it. Used on structural
    /// changes, which shift the row positions stored inside.
    pub fn clear_index(&self) {
        *self.index.borrow_mut() = None;
    }

    /// Invalidates the built index only when the changed column span
    /// touches a key column.
    pub fn invalidate_for_columns(&self, range: &CellRange) {
        if let Some(index) = self.index.borrow().as_ref() {
            index.clear_if_need(range);
        }
    }
}

/// Bridges a [`KeyValues`] hook onto the index's key customization seam.
struct KeyValuesAdapter {
    dataset: DatasetId,
    hook: Rc<dyn KeyValues>,
}

impl KeyCustomize for KeyValuesAdapter {
    fn key(
        &self,
        source: &dyn TabularSource,
        _spec: &KeySpec,
        row: usize,
        parent: &ParentPath,
    ) -> Result<CustomKey> {
        if self
            .hook
            .check_key_values(self.dataset, row, parent, source)?
            .is_some()
        {
            return Ok(CustomKey::Skip);
        }
        match self
            .hook
            .key_to_unique_string(self.dataset, row, parent, source)?
        {
            Some(key) => Ok(CustomKey::Key(key)),
            None => Ok(CustomKey::Builtin),
        }
    }
}
