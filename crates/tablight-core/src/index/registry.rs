use super::{IndexCache, KeySpec, ResourceMonitor};
use crate::schema::DatasetId;
use crate::source::RowLocator;
use crate::{Error, Result, Value};

use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// The per-entity registry of [`IndexCache`]es, one per dataset.
///
/// Explicitly created and owned next to the data container. Built index
/// memory is reclaimable: bind a [`ResourceMonitor`] and every cache is
/// dropped when it fires, to be rebuilt on the next lookup.
#[derive(Debug, Default)]
pub struct HashRegistry {
    caches: RefCell<IndexMap<DatasetId, Rc<IndexCache>>>,
}

impl HashRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a cache for `dataset`. Errors when one is already
    /// registered.
    pub fn add(&self, dataset: DatasetId, cache: Rc<IndexCache>) -> Result<()> {
        let mut caches = self.caches.borrow_mut();
        if caches.contains_key(&dataset) {
            return Err(Error::duplicate_key(format!("dataset {}", dataset.0)));
        }
        caches.insert(dataset, cache);
        Ok(())
    }

    pub fn remove(&self, dataset: DatasetId) -> Result<Rc<IndexCache>> {
        self.caches
            .borrow_mut()
            .shift_remove(&dataset)
            .ok_or_else(|| Error::not_found(format!("dataset {}", dataset.0)))
    }

    pub fn contains(&self, dataset: DatasetId) -> bool {
        self.caches.borrow().contains_key(&dataset)
    }

    pub fn cache(&self, dataset: DatasetId) -> Result<Rc<IndexCache>> {
        self.caches
            .borrow()
            .get(&dataset)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("dataset {}", dataset.0)))
    }

    pub fn find_rows(
        &self,
        dataset: DatasetId,
        spec: &KeySpec,
        values: &[Value],
    ) -> Result<Vec<RowLocator>> {
        self.cache(dataset)?.find_rows(spec, values)
    }

    /// Drops the built indices of one dataset.
    pub fn clear_hash(&self, dataset: DatasetId) -> Result<()> {
        self.cache(dataset)?.clear();
        Ok(())
    }

    /// Drops the built indices of every dataset.
    pub fn clear_hash_all(&self) {
        for cache in self.caches.borrow().values() {
            cache.clear();
        }
    }

    /// Subscribes this registry to the monitor. The subscription holds a
    /// weak reference, so a dropped registry stops listening on its own.
    pub fn bind_monitor(self: &Rc<Self>, monitor: &ResourceMonitor) {
        let weak: Weak<HashRegistry> = Rc::downgrade(self);
        monitor.subscribe(move || {
            if let Some(registry) = weak.upgrade() {
                registry.clear_hash_all();
            }
        });
    }
}
