use std::cell::{Cell, RefCell};

/// Broadcasts free-memory requests to holders of reclaimable caches.
///
/// The application decides when to fire (memory pressure, going idle); the
/// subscribers decide what to drop.
#[derive(Default)]
pub struct ResourceMonitor {
    subscribers: RefCell<Vec<Box<dyn Fn()>>>,
    fired: Cell<u64>,
}

impl ResourceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl Fn() + 'static) {
        self.subscribers.borrow_mut().push(Box::new(callback));
    }

    /// Asks every subscriber to drop its reclaimable state.
    pub fn free_resources(&self) {
        self.fired.set(self.fired.get() + 1);
        for callback in self.subscribers.borrow().iter() {
            callback();
        }
    }

    /// How many times [`free_resources`](ResourceMonitor::free_resources)
    /// has fired.
    pub fn times_fired(&self) -> u64 {
        self.fired.get()
    }
}

impl std::fmt::Debug for ResourceMonitor {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("ResourceMonitor")
            .field("subscribers", &self.subscribers.borrow().len())
            .field("fired", &self.fired.get())
            .finish()
    }
}
