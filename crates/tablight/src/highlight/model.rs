use super::{FindingId, HighlightItem};
use tablight_core::schema::{Property, Severity};
use tablight_core::source::{Observers, SubscriptionId};

use indexmap::IndexMap;
use std::cell::{Cell, RefCell};

/// A change notification from a [`HighlightModel`].
#[derive(Debug, Clone, PartialEq)]
pub enum HighlightEvent {
    /// Start of a batch of changes. Nested batches emit one pair.
    BeginUpdate,
    EndUpdate,

    Added(HighlightItem),

    /// An item with the same `(property, id)` was replaced.
    Changed(HighlightItem),

    Removed(HighlightItem),
}

/// The validation result model: the current set of findings, addressable by
/// `(property, finding id)`.
///
/// The engine owns one instance per entity and keeps it diffed, not
/// rebuilt: checks stage their findings and only actual differences reach
/// the model, so views receive minimal change events.
#[derive(Default)]
pub struct HighlightModel {
    items: RefCell<IndexMap<(Property, FindingId), HighlightItem>>,
    observers: Observers<HighlightEvent>,
    update_depth: Cell<u32>,
}

impl HighlightModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl Fn(&HighlightEvent) + 'static) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.observers.unsubscribe(id);
    }

    /// Opens a change batch. Batches nest; only the outermost pair emits
    /// the bracket events.
    pub fn begin_update(&self) {
        let depth = self.update_depth.get();
        self.update_depth.set(depth + 1);
        if depth == 0 {
            self.observers.notify(&HighlightEvent::BeginUpdate);
        }
    }

    pub fn end_update(&self) {
        let depth = self.update_depth.get();
        debug_assert!(depth > 0);
        self.update_depth.set(depth.saturating_sub(1));
        if depth == 1 {
            self.observers.notify(&HighlightEvent::EndUpdate);
        }
    }

    /// Inserts or replaces the item at its `(property, id)` slot. Emits
    /// nothing when an identical item is already present.
    pub fn add(&self, item: HighlightItem) {
        let key = (item.property, item.id);
        let prev = self.items.borrow_mut().insert(key, item.clone());
        match prev {
            None => self.observers.notify(&HighlightEvent::Added(item)),
            Some(prev) if prev != item => {
                self.observers.notify(&HighlightEvent::Changed(item));
            }
            Some(_) => {}
        }
    }

    pub fn get(&self, property: Property, id: FindingId) -> Option<HighlightItem> {
        self.items.borrow().get(&(property, id)).cloned()
    }

    pub fn contains(&self, property: Property, id: FindingId) -> bool {
        self.items.borrow().contains_key(&(property, id))
    }

    /// Removes one item. No-op when absent.
    pub fn remove(&self, property: Property, id: FindingId) {
        let removed = self.items.borrow_mut().shift_remove(&(property, id));
        if let Some(item) = removed {
            self.observers.notify(&HighlightEvent::Removed(item));
        }
    }

    /// Removes every item of `property`. Removing a row also removes the
    /// items of its cells.
    pub fn remove_property(&self, property: Property) {
        let removed: Vec<HighlightItem> = {
            let mut items = self.items.borrow_mut();
            let keys: Vec<(Property, FindingId)> = items
                .keys()
                .filter(|(p, _)| *p == property || is_cell_of_row(p, &property))
                .cloned()
                .collect();
            keys.iter()
                .filter_map(|key| items.shift_remove(key))
                .collect()
        };
        for item in removed {
            self.observers.notify(&HighlightEvent::Removed(item));
        }
    }

    /// Removes `id` from every property.
    pub fn remove_finding(&self, id: FindingId) {
        let removed: Vec<HighlightItem> = {
            let mut items = self.items.borrow_mut();
            let keys: Vec<(Property, FindingId)> = items
                .keys()
                .filter(|(_, fid)| *fid == id)
                .cloned()
                .collect();
            keys.iter()
                .filter_map(|key| items.shift_remove(key))
                .collect()
        };
        for item in removed {
            self.observers.notify(&HighlightEvent::Removed(item));
        }
    }

    pub fn clear(&self) {
        let removed: Vec<HighlightItem> = {
            let mut items = self.items.borrow_mut();
            items.drain(..).map(|(_, item)| item).collect()
        };
        if removed.is_empty() {
            return;
        }
        self.begin_update();
        for item in removed {
            self.observers.notify(&HighlightEvent::Removed(item));
        }
        self.end_update();
    }

    /// Every item, most severe first. Equal severities keep insertion
    /// order.
    pub fn items(&self) -> Vec<HighlightItem> {
        let mut items: Vec<HighlightItem> = self.items.borrow().values().cloned().collect();
        items.sort_by(|a, b| b.severity.cmp(&a.severity));
        items
    }

    pub fn items_for(&self, property: Property) -> Vec<HighlightItem> {
        self.items
            .borrow()
            .values()
            .filter(|item| item.property == property)
            .cloned()
            .collect()
    }

    /// Every item carrying `group_code`, in insertion order.
    pub fn group_items(&self, group_code: i32) -> Vec<HighlightItem> {
        self.items
            .borrow()
            .values()
            .filter(|item| item.group_code == Some(group_code))
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.items
            .borrow()
            .values()
            .any(|item| item.severity == Severity::Error)
    }

    /// The most severe level present, or `None` when empty.
    pub fn top_severity(&self) -> Option<Severity> {
        self.items.borrow().values().map(|item| item.severity).max()
    }
}

fn is_cell_of_row(property: &Property, row: &Property) -> bool {
    match (property, row) {
        (Property::Cell(cell), Property::Row(row)) => {
            cell.dataset == row.dataset && cell.row == row.row
        }
        _ => false,
    }
}

impl std::fmt::Debug for HighlightModel {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("HighlightModel")
            .field("items", &self.items.borrow().len())
            .finish()
    }
}
