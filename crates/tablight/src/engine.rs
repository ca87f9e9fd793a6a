mod batch;
mod changes;

mod checker;
pub use checker::{ExternalChecker, KeyValues};

mod dataset_info;
pub use dataset_info::DatasetInfo;

use crate::highlight::{HighlightEvent, HighlightItem, HighlightModel};
use tablight_core::schema::{CellRef, DatasetId, Property, SchemaRegistry};
use tablight_core::source::{DataContainer, Observers, SubscriptionId};
use tablight_core::{Error, Result};

use indexmap::{IndexMap, IndexSet};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Whether the engine currently reacts to data changes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineState {
    /// Not subscribed to the data; check requests are ignored.
    Stopped,
    Active,
}

/// The incremental validation engine for one entity.
///
/// Created stopped; call [`start`] to subscribe to the data container and
/// run the initial full check. Data changes register narrow check requests
/// which are coalesced and executed as one batch, either explicitly via
/// [`execute_checks`] or when the host's batch notifier decides to.
///
/// [`start`]: ValidationEngine::start
/// [`execute_checks`]: ValidationEngine::execute_checks
pub struct ValidationEngine {
    data: Rc<DataContainer>,
    highlight: Rc<HighlightModel>,

    key_values: RefCell<Option<Rc<dyn KeyValues>>>,
    checkers: RefCell<Vec<Rc<dyn ExternalChecker>>>,

    dirty: RefCell<IndexSet<Property>>,
    dirty_duplicates: RefCell<IndexSet<DatasetId>>,

    /// Starts at one: the engine is created stopped.
    stop_counter: Cell<u32>,
    auto_blocked: Cell<u32>,
    executing: Cell<bool>,
    simple: bool,

    batch_pending: Cell<bool>,
    batch_notifier: RefCell<Option<Box<dyn Fn()>>>,

    /// Error raised inside a change notification, surfaced by the next
    /// `execute_checks` call.
    deferred_error: RefCell<Option<Error>>,

    master: RefCell<Option<Weak<ValidationEngine>>>,
    master_subscription: Cell<Option<SubscriptionId>>,
    source_subscription: Cell<Option<SubscriptionId>>,

    pending_removals: RefCell<Vec<Property>>,
    dataset_info: RefCell<IndexMap<DatasetId, Rc<DatasetInfo>>>,

    events: Observers<HighlightEvent>,
    self_weak: Weak<ValidationEngine>,
}

impl ValidationEngine {
    pub fn new(data: Rc<DataContainer>) -> Rc<Self> {
        Self::build(data, false)
    }

    /// An engine that drives external checkers through the catch-all
    /// [`check_property`] hook only; the per-kind hooks are never called.
    ///
    /// [`check_property`]: ExternalChecker::check_property
    pub fn new_simple(data: Rc<DataContainer>) -> Rc<Self> {
        Self::build(data, true)
    }

    fn build(data: Rc<DataContainer>, simple: bool) -> Rc<Self> {
        let dataset_info = data
            .schema()
            .datasets()
            .map(|d| (d.id, Rc::new(DatasetInfo::new(d))))
            .collect();

        let engine = Rc::new_cyclic(|weak| ValidationEngine {
            data,
            highlight: Rc::new(HighlightModel::new()),
            key_values: RefCell::new(None),
            checkers: RefCell::new(vec![]),
            dirty: RefCell::new(IndexSet::new()),
            dirty_duplicates: RefCell::new(IndexSet::new()),
            stop_counter: Cell::new(1),
            auto_blocked: Cell::new(0),
            executing: Cell::new(false),
            simple,
            batch_pending: Cell::new(false),
            batch_notifier: RefCell::new(None),
            deferred_error: RefCell::new(None),
            master: RefCell::new(None),
            master_subscription: Cell::new(None),
            source_subscription: Cell::new(None),
            pending_removals: RefCell::new(vec![]),
            dataset_info: RefCell::new(dataset_info),
            events: Observers::new(),
            self_weak: weak.clone(),
        });

        let weak = Rc::downgrade(&engine);
        engine.highlight.subscribe(move |event| {
            if let Some(engine) = weak.upgrade() {
                engine.events.notify(event);
            }
        });

        engine
    }

    pub fn data(&self) -> &Rc<DataContainer> {
        &self.data
    }

    pub fn schema(&self) -> &Rc<SchemaRegistry> {
        self.data.schema()
    }

    /// The result model. Kept diffed by the engine; read-only for callers.
    /// A delegated engine returns the master's model.
    pub fn highlight(&self) -> Rc<HighlightModel> {
        if let Some(master) = self.master() {
            return master.highlight();
        }
        self.highlight.clone()
    }

    pub fn is_simple(&self) -> bool {
        self.simple
    }

    pub fn state(&self) -> EngineState {
        if self.stop_counter.get() == 0 {
            EngineState::Active
        } else {
            EngineState::Stopped
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == EngineState::Active
    }

    pub fn is_auto_blocked(&self) -> bool {
        self.auto_blocked.get() > 0
    }

    /// Activates the engine. Calls are ref-counted against [`stop`]; the
    /// transition to active subscribes to the data container and registers
    /// a full check. Starting an already active engine is an error.
    ///
    /// [`stop`]: ValidationEngine::stop
    pub fn start(&self) -> Result<()> {
        let counter = self.stop_counter.get();
        if counter == 0 {
            return Err(Error::invariant("unbalanced start call"));
        }
        self.stop_counter.set(counter - 1);
        if counter == 1 {
            let weak = self.self_weak.clone();
            let id = self.data.subscribe(move |event| {
                if let Some(engine) = weak.upgrade() {
                    engine.handle_source_event(event);
                }
            });
            self.source_subscription.set(Some(id));
            self.register_check_all();
        }
        Ok(())
    }

    /// Deactivates the engine. The transition to stopped unsubscribes from
    /// the data container, drops pending check requests and clears the
    /// result model.
    pub fn stop(&self) {
        let counter = self.stop_counter.get();
        self.stop_counter.set(counter + 1);
        if counter == 0 {
            if let Some(id) = self.source_subscription.take() {
                self.data.unsubscribe(id);
            }
            self.clear_check_requests();
            self.highlight.clear();
        }
    }

    /// Requests a check of `property` in the next batch. Ignored while
    /// stopped; forwarded to the master when one is installed.
    pub fn register_check(&self, property: Property) -> Result<()> {
        self.schema().validate_property(&property)?;
        if let Some(master) = self.master() {
            return master.register_check(property);
        }
        if !self.is_active() {
            return Ok(());
        }
        self.dirty.borrow_mut().insert(property);
        self.schedule();
        Ok(())
    }

    /// Requests a full re-check of the entity.
    pub fn register_check_all(&self) {
        if let Some(master) = self.master() {
            master.register_check_all();
            return;
        }
        if !self.is_active() {
            return;
        }
        self.dirty.borrow_mut().insert(Property::Entity);
        for id in self.key_dataset_ids() {
            self.dirty_duplicates.borrow_mut().insert(id);
        }
        self.schedule();
    }

    /// Requests a duplicate-key re-check of every row of `dataset`.
    pub fn register_dataset_duplicate_check(&self, dataset: DatasetId) -> Result<()> {
        self.schema().dataset(dataset)?;
        if let Some(master) = self.master() {
            return master.register_dataset_duplicate_check(dataset);
        }
        if !self.is_active() {
            return Ok(());
        }
        if self.dataset_info(dataset)?.has_keys() {
            self.dirty_duplicates.borrow_mut().insert(dataset);
            self.schedule();
        }
        Ok(())
    }

    /// Runs every pending check request as one batch, diffing the results
    /// into the highlight model. A delegated engine runs the master's
    /// batch.
    pub fn execute_checks(&self) -> Result<()> {
        self.batch_pending.set(false);
        if let Some(master) = self.master() {
            self.dirty.borrow_mut().clear();
            self.dirty_duplicates.borrow_mut().clear();
            return master.execute_checks();
        }
        if let Some(err) = self.deferred_error.borrow_mut().take() {
            return Err(err);
        }
        if !self.is_active() {
            self.dirty.borrow_mut().clear();
            self.dirty_duplicates.borrow_mut().clear();
            return Ok(());
        }
        self.run_batch()
    }

    pub fn has_pending_checks(&self) -> bool {
        if let Some(master) = self.master() {
            return master.has_pending_checks();
        }
        self.batch_pending.get()
            || !self.dirty.borrow().is_empty()
            || !self.dirty_duplicates.borrow().is_empty()
    }

    pub fn clear_check_requests(&self) {
        if let Some(master) = self.master() {
            master.clear_check_requests();
            return;
        }
        self.dirty.borrow_mut().clear();
        self.dirty_duplicates.borrow_mut().clear();
        self.batch_pending.set(false);
    }

    pub fn clear_highlights(&self) {
        if let Some(master) = self.master() {
            master.clear_highlights();
            return;
        }
        self.highlight.clear();
    }

    /// Suspends the built-in constraint and duplicate-key passes. Nested;
    /// external checkers keep running. The transition to blocked registers
    /// a full re-check so they take over right away.
    pub fn block_auto(&self) {
        let counter = self.auto_blocked.get();
        self.auto_blocked.set(counter + 1);
        if counter == 0 {
            self.register_check_all();
        }
    }

    /// Releases one [`block_auto`] call. The transition back to unblocked
    /// registers a full re-check.
    ///
    /// [`block_auto`]: ValidationEngine::block_auto
    pub fn unblock_auto(&self) -> Result<()> {
        let counter = self.auto_blocked.get();
        if counter == 0 {
            return Err(Error::invariant("unbalanced unblock call"));
        }
        self.auto_blocked.set(counter - 1);
        if counter == 1 {
            self.register_check_all();
        }
        Ok(())
    }

    /// The current findings of one cell. With `execute` set, pending
    /// checks run first so the answer is up to date.
    pub fn cell_highlight(&self, cell: CellRef, execute: bool) -> Result<Vec<HighlightItem>> {
        self.schema().validate_property(&Property::Cell(cell))?;
        if let Some(master) = self.master() {
            return master.cell_highlight(cell, execute);
        }
        if execute {
            self.execute_checks()?;
        }
        Ok(self.highlight.items_for(Property::Cell(cell)))
    }

    /// Delegates this engine to `master`: check requests are forwarded,
    /// the local model is emptied and stays empty, and the master's events
    /// are re-emitted through this engine.
    pub fn install_master(&self, master: &Rc<ValidationEngine>) -> Result<()> {
        if self.master().is_some() {
            return Err(Error::invariant("master already installed"));
        }
        if std::ptr::eq(self.self_weak.as_ptr(), Rc::as_ptr(master)) {
            return Err(Error::invariant("cannot delegate to self"));
        }
        self.dirty.borrow_mut().clear();
        self.dirty_duplicates.borrow_mut().clear();
        self.batch_pending.set(false);
        self.highlight.clear();
        *self.master.borrow_mut() = Some(Rc::downgrade(master));

        let weak = self.self_weak.clone();
        let id = master.subscribe_events(move |event| {
            if let Some(engine) = weak.upgrade() {
                engine.events.notify(event);
            }
        });
        self.master_subscription.set(Some(id));
        Ok(())
    }

    /// Removes the installed master. With `check` set, a full re-check is
    /// registered so the local model catches up.
    pub fn remove_master(&self, check: bool) -> Result<()> {
        let Some(weak) = self.master.borrow_mut().take() else {
            return Err(Error::invariant("no master installed"));
        };
        if let (Some(master), Some(id)) = (weak.upgrade(), self.master_subscription.take()) {
            master.unsubscribe_events(id);
        }
        if check {
            self.register_check_all();
        }
        Ok(())
    }

    pub fn master(&self) -> Option<Rc<ValidationEngine>> {
        self.master.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn install_checker(&self, checker: Rc<dyn ExternalChecker>) {
        self.checkers.borrow_mut().push(checker);
    }

    pub fn remove_checker(&self, checker: &Rc<dyn ExternalChecker>) {
        self.checkers
            .borrow_mut()
            .retain(|c| !Rc::ptr_eq(c, checker));
    }

    /// Installs the duplicate-key customization hook. Built key indices
    /// are dropped and every key dataset is re-checked.
    pub fn set_key_values(&self, key_values: Option<Rc<dyn KeyValues>>) {
        *self.key_values.borrow_mut() = key_values;
        for info in self.dataset_info.borrow().values() {
            info.clear_index();
        }
        if self.is_active() {
            for id in self.key_dataset_ids() {
                self.dirty_duplicates.borrow_mut().insert(id);
            }
            self.schedule();
        }
    }

    /// Installs the callback invoked when a batch becomes pending. The
    /// host decides when to call [`execute_checks`]; a common choice is
    /// deferring to the end of the current event-loop turn.
    ///
    /// [`execute_checks`]: ValidationEngine::execute_checks
    pub fn set_batch_notifier(&self, notifier: Option<Box<dyn Fn()>>) {
        *self.batch_notifier.borrow_mut() = notifier;
    }

    pub fn subscribe_events(
        &self,
        callback: impl Fn(&HighlightEvent) + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(callback)
    }

    pub fn unsubscribe_events(&self, id: SubscriptionId) {
        self.events.unsubscribe(id);
    }

    pub fn dataset_info(&self, dataset: DatasetId) -> Result<Rc<DatasetInfo>> {
        self.dataset_info
            .borrow()
            .get(&dataset)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("dataset {}", dataset.0)))
    }

    fn key_dataset_ids(&self) -> Vec<DatasetId> {
        self.dataset_info
            .borrow()
            .values()
            .filter(|info| info.has_keys())
            .map(|info| info.dataset)
            .collect()
    }

    fn schedule(&self) {
        if self.batch_pending.get() || self.executing.get() {
            return;
        }
        self.batch_pending.set(true);
        if let Some(notifier) = self.batch_notifier.borrow().as_ref() {
            notifier();
        }
    }
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("ValidationEngine")
            .field("state", &self.state())
            .field("pending", &self.dirty.borrow().len())
            .field("findings", &self.highlight.count())
            .finish()
    }
}
