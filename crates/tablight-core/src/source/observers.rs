use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Handle to one subscription, used to unsubscribe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A list of callbacks notified on each event.
///
/// Callbacks run in subscription order. The list is snapshotted before
/// notifying, so a callback may subscribe or unsubscribe without
/// invalidating the iteration in progress.
pub struct Observers<E> {
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<(SubscriptionId, Rc<dyn Fn(&E)>)>>,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Observers {
            next_id: Cell::new(1),
            subscribers: RefCell::new(vec![]),
        }
    }
}

impl<E> Observers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers.borrow_mut().push((id, Rc::new(callback)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
    }

    pub fn notify(&self, event: &E) {
        let snapshot: Vec<_> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for callback in snapshot {
            callback(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.borrow().is_empty()
    }
}

impl<E> std::fmt::Debug for Observers<E> {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("Observers")
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}
