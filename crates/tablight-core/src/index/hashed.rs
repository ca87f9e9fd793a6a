use super::KeySpec;
use crate::source::{walk_rows, CellRange, ParentPath, RowLocator, TabularSource};
use crate::{Error, Result, Value};

use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Verdict of a [`KeyCustomize`] hook for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomKey {
    /// Use this string as the row's key.
    Key(String),

    /// Compose the key from the source values as usual.
    Builtin,

    /// Leave the row out of the index.
    Skip,
}

/// Hook overriding how row keys are composed.
///
/// While a hook is installed, value-based lookup is forbidden: the caller
/// cannot know how a value tuple maps onto custom keys, so lookups must go
/// through [`HashedIndex::find_rows_by_hash`].
pub trait KeyCustomize {
    fn key(
        &self,
        source: &dyn TabularSource,
        spec: &KeySpec,
        row: usize,
        parent: &ParentPath,
    ) -> Result<CustomKey>;
}

/// A lazily built hash index over one tabular source.
///
/// The index maps composed key strings to the physical positions of the rows
/// carrying them, built in a single depth-first pass. It is invalidated, not
/// maintained: any change that can affect a key drops the whole map and the
/// next lookup rebuilds it.
pub struct HashedIndex {
    spec: KeySpec,
    source: Rc<dyn TabularSource>,
    state: RefCell<State>,
    customization: RefCell<Option<Rc<dyn KeyCustomize>>>,
}

#[derive(Default)]
struct State {
    generated: bool,
    map: IndexMap<String, Vec<RowLocator>>,
    /// First row per distinct key, in walk order.
    unique: Vec<RowLocator>,
}

impl HashedIndex {
    pub fn new(spec: KeySpec, source: Rc<dyn TabularSource>) -> Self {
        HashedIndex {
            spec,
            source,
            state: RefCell::new(State::default()),
            customization: RefCell::new(None),
        }
    }

    pub fn spec(&self) -> &KeySpec {
        &self.spec
    }

    pub fn is_generated(&self) -> bool {
        self.state.borrow().generated
    }

    pub fn is_customized(&self) -> bool {
        self.customization.borrow().is_some()
    }

    /// Installs or removes the key customization hook. Drops the built map
    /// either way, the existing keys may no longer be valid.
    pub fn set_customization(&self, hook: Option<Rc<dyn KeyCustomize>>) {
        *self.customization.borrow_mut() = hook;
        self.clear();
    }

    /// Rows whose key matches the given value tuple.
    ///
    /// Forbidden while a customization hook is installed; use
    /// [`find_rows_by_hash`](HashedIndex::find_rows_by_hash) then.
    pub fn find_rows(&self, values: &[Value]) -> Result<Vec<RowLocator>> {
        if self.is_customized() {
            return Err(Error::invariant(
                "value lookup on an index with a key customization hook",
            ));
        }
        let key = self.spec.compose_key(values)?;
        self.find_rows_by_hash(&key)
    }

    /// Rows whose composed key equals `key` exactly.
    pub fn find_rows_by_hash(&self, key: &str) -> Result<Vec<RowLocator>> {
        self.ensure_generated()?;
        Ok(self
            .state
            .borrow()
            .map
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    /// Number of distinct keys in the source.
    pub fn unique_row_count(&self) -> Result<usize> {
        self.ensure_generated()?;
        Ok(self.state.borrow().unique.len())
    }

    /// Key-column values of the `i`-th distinct key's first row.
    pub fn unique_row_values(&self, i: usize) -> Result<Vec<Value>> {
        self.ensure_generated()?;
        let locator = {
            let state = self.state.borrow();
            state
                .unique
                .get(i)
                .cloned()
                .ok_or_else(|| Error::not_found(format!("unique row {}", i)))?
        };
        self.spec
            .columns()
            .iter()
            .map(|c| {
                self.source
                    .value(locator.row, c.column, c.facet, &locator.parent)
            })
            .collect()
    }

    /// The key the index composes for the row at `(row, parent)`, or `None`
    /// when the customization hook skips it.
    pub fn row_key(&self, row: usize, parent: &ParentPath) -> Result<Option<String>> {
        let hook = self.customization.borrow().clone();
        if let Some(hook) = hook {
            match hook.key(self.source.as_ref(), &self.spec, row, parent)? {
                CustomKey::Key(key) => return Ok(Some(key)),
                CustomKey::Skip => return Ok(None),
                CustomKey::Builtin => {}
            }
        }
        let values: Vec<Value> = self
            .spec
            .columns()
            .iter()
            .map(|c| self.source.value(row, c.column, c.facet, parent))
            .collect::<Result<_>>()?;
        self.spec.compose_key(&values).map(Some)
    }

    /// Drops the built map. The next lookup rebuilds it.
    pub fn clear(&self) {
        *self.state.borrow_mut() = State::default();
    }

    /// Drops the built map only when `range` can affect stored keys, i.e.
    /// its column span touches a key column. Returns whether it cleared.
    pub fn clear_if_need(&self, range: &CellRange) -> bool {
        if !self.state.borrow().generated {
            return false;
        }
        if !range.intersects_columns(&self.spec.positions()) {
            return false;
        }
        self.clear();
        true
    }

    fn ensure_generated(&self) -> Result<()> {
        if self.state.borrow().generated {
            return Ok(());
        }
        self.rebuild()
    }

    fn rebuild(&self) -> Result<()> {
        if let Some(max) = self.spec.max_position() {
            if max >= self.source.column_count() {
                return Err(Error::invariant(format!(
                    "key column {} out of bounds for source with {} columns",
                    max,
                    self.source.column_count()
                )));
            }
        }

        let mut state = State {
            generated: true,
            ..State::default()
        };
        walk_rows(self.source.as_ref(), |row, parent| {
            if let Some(key) = self.row_key(row, parent)? {
                let locator = RowLocator::new(row, parent.clone());
                let rows = state.map.entry(key).or_default();
                if rows.is_empty() {
                    state.unique.push(locator.clone());
                }
                rows.push(locator);
            }
            Ok(true)
        })?;

        *self.state.borrow_mut() = state;
        Ok(())
    }
}

impl std::fmt::Debug for HashedIndex {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        fmt.debug_struct("HashedIndex")
            .field("spec", &self.spec)
            .field("generated", &state.generated)
            .field("keys", &state.map.len())
            .finish()
    }
}
