use super::{HashedIndex, KeyCustomize, KeySpec};
use crate::source::{walk_rows, CellRange, RowLocator, RowSet, TabularSource};
use crate::{Facet, Result, Value};

use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

/// A cache of [`HashedIndex`]es over one source, keyed by spec signature.
///
/// Indices are created on first use and shared afterwards, so repeated
/// lookups with equivalent specs hit the same built map. One customization
/// hook applies to every index of the cache.
pub struct IndexCache {
    source: Rc<dyn TabularSource>,
    indices: RefCell<IndexMap<String, Rc<HashedIndex>>>,
    customization: RefCell<Option<Rc<dyn KeyCustomize>>>,
}

impl IndexCache {
    pub fn new(source: Rc<dyn TabularSource>) -> Self {
        IndexCache {
            source,
            indices: RefCell::new(IndexMap::new()),
            customization: RefCell::new(None),
        }
    }

    pub fn source(&self) -> &Rc<dyn TabularSource> {
        &self.source
    }

    /// The cached index for `spec`, creating it when absent.
    pub fn index(&self, spec: &KeySpec) -> Rc<HashedIndex> {
        let signature = spec.signature();
        if let Some(index) = self.indices.borrow().get(&signature) {
            return index.clone();
        }
        let index = Rc::new(HashedIndex::new(spec.clone(), self.source.clone()));
        if let Some(hook) = self.customization.borrow().clone() {
            index.set_customization(Some(hook));
        }
        self.indices
            .borrow_mut()
            .insert(signature, index.clone());
        index
    }

    pub fn find_rows(&self, spec: &KeySpec, values: &[Value]) -> Result<Vec<RowLocator>> {
        self.index(spec).find_rows(values)
    }

    /// Rows matching any of the value tuples, deduplicated, in first-match
    /// order.
    pub fn find_rows_any(&self, spec: &KeySpec, tuples: &[Vec<Value>]) -> Result<RowSet> {
        let index = self.index(spec);
        let mut rows = RowSet::new();
        for values in tuples {
            rows.extend(index.find_rows(values)?);
        }
        Ok(rows)
    }

    /// Single-column lookup shortcut.
    pub fn find_rows_by_column(
        &self,
        column: usize,
        case_insensitive: bool,
        facet: Facet,
        value: &Value,
    ) -> Result<Vec<RowLocator>> {
        let spec = KeySpec::new(&[column], &[case_insensitive], &[facet])?;
        self.find_rows(&spec, std::slice::from_ref(value))
    }

    pub fn unique_row_count(&self, spec: &KeySpec) -> Result<usize> {
        self.index(spec).unique_row_count()
    }

    pub fn unique_row_values(&self, spec: &KeySpec, i: usize) -> Result<Vec<Value>> {
        self.index(spec).unique_row_values(i)
    }

    /// Every row of the source that is not in `rows`.
    pub fn invert_rows(&self, rows: &RowSet) -> Result<RowSet> {
        let mut inverted = RowSet::new();
        walk_rows(self.source.as_ref(), |row, parent| {
            let locator = RowLocator::new(row, parent.clone());
            if !rows.contains(&locator) {
                inverted.push(locator);
            }
            Ok(true)
        })?;
        Ok(inverted)
    }

    /// Drops every cached index.
    pub fn clear(&self) {
        self.indices.borrow_mut().clear();
    }

    /// Invalidates only the indices whose key columns `range` touches.
    pub fn clear_if_need(&self, range: &CellRange) {
        for index in self.indices.borrow().values() {
            index.clear_if_need(range);
        }
    }

    /// Installs the customization hook on every current and future index.
    pub fn set_customization(&self, hook: Option<Rc<dyn KeyCustomize>>) {
        *self.customization.borrow_mut() = hook.clone();
        for index in self.indices.borrow().values() {
            index.set_customization(hook.clone());
        }
    }

    pub fn is_customized(&self) -> bool {
        self.customization.borrow().is_some()
    }

    /// Number of currently cached indices.
    pub fn len(&self) -> usize {
        self.indices.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.borrow().is_empty()
    }
}

impl std::fmt::Debug for IndexCache {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("IndexCache")
            .field("indices", &self.indices.borrow().len())
            .finish()
    }
}
