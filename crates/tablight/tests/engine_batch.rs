use tablight::highlight::{FindingId, HighlightEvent};
use tablight::schema::{Constraint, DatasetId, FieldId, Property, SchemaRegistry};
use tablight::source::{DataContainer, ParentPath};
use tablight::{EngineState, Facet, ValidationEngine, Value};

use pretty_assertions::assert_eq;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const NAME: FieldId = FieldId(1);
const ITEMS: DatasetId = DatasetId(1);

fn engine() -> (Rc<DataContainer>, Rc<ValidationEngine>) {
    let schema = SchemaRegistry::builder()
        .field(NAME, "name", vec![Constraint::required()])
        .dataset(ITEMS, "items")
        .column("code")
        .key()
        .constraint(Constraint::required())
        .done()
        .done()
        .build()
        .unwrap();
    let data = Rc::new(DataContainer::new(Rc::new(schema)));
    let engine = ValidationEngine::new(data.clone());
    (data, engine)
}

#[test]
fn created_stopped_and_start_is_refcounted() {
    let (data, engine) = engine();
    assert_eq!(engine.state(), EngineState::Stopped);

    // Changes while stopped go unnoticed.
    data.set_field(NAME, Value::from("x")).unwrap();
    assert!(!engine.has_pending_checks());

    engine.start().unwrap();
    assert_eq!(engine.state(), EngineState::Active);
    assert!(engine.start().unwrap_err().is_invariant());

    engine.stop();
    engine.stop();
    engine.start().unwrap();
    assert_eq!(engine.state(), EngineState::Stopped);
    engine.start().unwrap();
    assert_eq!(engine.state(), EngineState::Active);
}

#[test]
fn stop_clears_the_result_model() {
    let (_data, engine) = engine();
    engine.start().unwrap();
    engine.execute_checks().unwrap();
    assert!(engine.highlight().has_errors());

    engine.stop();
    assert!(engine.highlight().is_empty());
}

#[test]
fn pending_checks_coalesce_into_one_notification() {
    let (data, engine) = engine();
    engine.start().unwrap();
    engine.execute_checks().unwrap();

    let notified = Rc::new(Cell::new(0_usize));
    let sink = notified.clone();
    engine.set_batch_notifier(Some(Box::new(move || sink.set(sink.get() + 1))));

    data.set_field(NAME, Value::from("a")).unwrap();
    data.set_field(NAME, Value::from("b")).unwrap();
    data.set_field(NAME, Value::from("c")).unwrap();
    assert_eq!(notified.get(), 1);
    assert!(engine.has_pending_checks());

    engine.execute_checks().unwrap();
    assert!(!engine.has_pending_checks());

    data.set_field(NAME, Value::from("d")).unwrap();
    assert_eq!(notified.get(), 2);
}

#[test]
fn broad_and_narrow_requests_give_the_same_result() {
    let (data, engine) = engine();
    engine.start().unwrap();
    let root = ParentPath::root();
    let ids = data.insert_rows(ITEMS, &root, 0, 2).unwrap();
    engine.execute_checks().unwrap();
    let broad = engine.highlight().items();

    engine.clear_highlights();
    engine.register_check(Property::Field(NAME)).unwrap();
    engine.register_check(Property::row(ITEMS, ids[0])).unwrap();
    engine.register_check(Property::row(ITEMS, ids[1])).unwrap();
    engine.register_dataset_duplicate_check(ITEMS).unwrap();
    engine.execute_checks().unwrap();
    let narrow = engine.highlight().items();

    assert_eq!(broad.len(), narrow.len());
    for item in &broad {
        assert!(narrow.contains(item));
    }
}

#[test]
fn registering_checks_from_result_events_is_an_error() {
    let (data, engine) = engine();
    engine.start().unwrap();
    engine.execute_checks().unwrap();

    let inner = engine.clone();
    engine.subscribe_events(move |event| {
        if matches!(event, HighlightEvent::Removed(_)) {
            let _ = inner.register_check(Property::Field(NAME));
        }
    });

    data.set_field(NAME, Value::from("x")).unwrap();
    let err = engine.execute_checks().unwrap_err();
    assert!(err.is_reentrant_check());
    assert_eq!(
        err.to_string(),
        "1 check requests registered during batch execution"
    );

    // The stray request was dropped; the next batch runs clean.
    engine.register_check_all();
    engine.execute_checks().unwrap();
}

#[test]
fn block_auto_suspends_builtin_passes() {
    let (data, engine) = engine();
    engine.start().unwrap();
    data.set_field(NAME, Value::from("x")).unwrap();
    engine.execute_checks().unwrap();
    assert!(engine.highlight().is_empty());

    engine.block_auto();
    data.set_field(NAME, Value::Null).unwrap();
    engine.execute_checks().unwrap();
    assert!(engine.highlight().is_empty());

    engine.unblock_auto().unwrap();
    engine.execute_checks().unwrap();
    let findings = engine.highlight().items_for(Property::Field(NAME));
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].id, FindingId::REQUIRED);

    assert!(engine.unblock_auto().unwrap_err().is_invariant());
}

#[test]
fn block_transitions_register_a_full_recheck() {
    let (_data, engine) = engine();
    engine.start().unwrap();
    engine.execute_checks().unwrap();
    assert!(!engine.has_pending_checks());

    engine.block_auto();
    assert!(engine.has_pending_checks());
    engine.block_auto();
    engine.execute_checks().unwrap();

    engine.unblock_auto().unwrap();
    assert!(!engine.has_pending_checks());
    engine.unblock_auto().unwrap();
    assert!(engine.has_pending_checks());
}

#[test]
fn removed_rows_lose_their_findings_without_a_batch() {
    let (data, engine) = engine();
    engine.start().unwrap();
    let root = ParentPath::root();
    let ids = data.insert_rows(ITEMS, &root, 0, 2).unwrap();
    data.set_cell(ITEMS, 1, 0, Facet::DISPLAY, Value::from("ok"), &root)
        .unwrap();
    engine.execute_checks().unwrap();

    let blank_cell = Property::cell(ITEMS, ids[0], 0);
    assert!(engine.highlight().get(blank_cell, FindingId::REQUIRED).is_some());

    data.remove_rows(ITEMS, &root, 0, 0).unwrap();
    assert!(engine.highlight().get(blank_cell, FindingId::REQUIRED).is_none());
}

#[test]
fn reset_drops_dataset_findings() {
    let (data, engine) = engine();
    engine.start().unwrap();
    let root = ParentPath::root();
    data.insert_rows(ITEMS, &root, 0, 1).unwrap();
    engine.execute_checks().unwrap();
    assert_eq!(engine.highlight().count(), 2);

    data.reset(ITEMS).unwrap();
    engine.execute_checks().unwrap();
    // Only the field finding survives the reset.
    let remaining = engine.highlight().items();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].property, Property::Field(NAME));
}

struct CountingChecker {
    calls: Cell<usize>,
}

impl tablight::ExternalChecker for CountingChecker {
    fn check_field(
        &self,
        field: &tablight::schema::FieldSchema,
        value: &Value,
        info: &mut tablight::highlight::HighlightInfo,
    ) {
        self.calls.set(self.calls.get() + 1);
        if value.to_display() == "forbidden" {
            info.set(tablight::highlight::HighlightItem::new(
                Property::Field(field.id),
                FindingId::USER_BASE,
                "reserved name",
                tablight::highlight::Severity::Error,
            ));
        } else {
            info.empty(Property::Field(field.id), FindingId::USER_BASE);
        }
    }
}

#[test]
fn external_checkers_run_even_while_auto_is_blocked() {
    let (data, engine) = engine();
    let checker = Rc::new(CountingChecker { calls: Cell::new(0) });
    engine.install_checker(checker.clone());
    engine.start().unwrap();
    engine.block_auto();

    data.set_field(NAME, Value::from("forbidden")).unwrap();
    engine.execute_checks().unwrap();
    assert!(checker.calls.get() > 0);
    let findings = engine.highlight().items_for(Property::Field(NAME));
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].id, FindingId::USER_BASE);

    data.set_field(NAME, Value::from("fine")).unwrap();
    engine.execute_checks().unwrap();
    assert!(engine.highlight().items_for(Property::Field(NAME)).is_empty());
    engine.unblock_auto().unwrap();
}

#[test]
fn removed_columns_drop_findings_and_batches_continue() {
    let schema = SchemaRegistry::builder()
        .dataset(ITEMS, "items")
        .column("code")
        .done()
        .column("name")
        .constraint(Constraint::required())
        .done()
        .done()
        .build()
        .unwrap();
    let data = Rc::new(DataContainer::new(Rc::new(schema)));
    let engine = ValidationEngine::new(data.clone());
    engine.start().unwrap();

    let root = ParentPath::root();
    let ids = data.insert_rows(ITEMS, &root, 0, 1).unwrap();
    engine.execute_checks().unwrap();
    let name_cell = Property::cell(ITEMS, ids[0], 1);
    assert!(engine.highlight().get(name_cell, FindingId::REQUIRED).is_some());

    data.remove_columns(ITEMS, 1, 1).unwrap();
    engine.execute_checks().unwrap();
    assert!(engine.highlight().is_empty());
}

struct DatasetTally {
    datasets: RefCell<Vec<DatasetId>>,
}

impl tablight::ExternalChecker for DatasetTally {
    fn check_dataset(
        &self,
        dataset: &tablight::schema::DatasetSchema,
        _info: &mut tablight::highlight::HighlightInfo,
    ) {
        self.datasets.borrow_mut().push(dataset.id);
    }
}

#[test]
fn row_checks_reach_the_dataset_hook() {
    let (data, engine) = engine();
    let tally = Rc::new(DatasetTally {
        datasets: RefCell::new(vec![]),
    });
    engine.install_checker(tally.clone());
    engine.start().unwrap();
    engine.execute_checks().unwrap();
    tally.datasets.borrow_mut().clear();

    // Inserting rows registers row-level checks only; the dataset hook
    // still fires once for their dataset.
    let root = ParentPath::root();
    data.insert_rows(ITEMS, &root, 0, 2).unwrap();
    engine.execute_checks().unwrap();
    assert_eq!(tally.datasets.borrow().as_slice(), &[ITEMS]);
}

struct HookTally {
    fields: Cell<usize>,
    properties: Cell<usize>,
}

impl tablight::ExternalChecker for HookTally {
    fn check_field(
        &self,
        _field: &tablight::schema::FieldSchema,
        _value: &Value,
        _info: &mut tablight::highlight::HighlightInfo,
    ) {
        self.fields.set(self.fields.get() + 1);
    }

    fn check_property(
        &self,
        _property: Property,
        _info: &mut tablight::highlight::HighlightInfo,
    ) {
        self.properties.set(self.properties.get() + 1);
    }
}

#[test]
fn simple_engines_use_only_the_catch_all_hook() {
    let schema = SchemaRegistry::builder()
        .field(NAME, "name", vec![Constraint::required()])
        .build()
        .unwrap();
    let data = Rc::new(DataContainer::new(Rc::new(schema)));
    let engine = ValidationEngine::new_simple(data.clone());
    assert!(engine.is_simple());

    let tally = Rc::new(HookTally {
        fields: Cell::new(0),
        properties: Cell::new(0),
    });
    engine.install_checker(tally.clone());
    engine.start().unwrap();
    data.set_field(NAME, Value::from("x")).unwrap();
    engine.execute_checks().unwrap();

    assert_eq!(tally.fields.get(), 0);
    assert!(tally.properties.get() > 0);
    // The built-in constraint pass is unaffected by simple mode.
    data.set_field(NAME, Value::Null).unwrap();
    engine.execute_checks().unwrap();
    assert!(engine.highlight().has_errors());
}

#[test]
fn stray_events_surface_as_deferred_errors() {
    let (data, engine) = engine();
    engine.start().unwrap();
    engine.execute_checks().unwrap();

    // A notification for a dataset the schema does not know about cannot be
    // handled inside the callback; it is surfaced by the next batch.
    data.notify(&tablight::source::SourceEvent::Reset {
        dataset: DatasetId(99),
    });
    assert!(engine.execute_checks().unwrap_err().is_not_found());
    engine.execute_checks().unwrap();
}
