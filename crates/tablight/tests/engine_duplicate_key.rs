use tablight::highlight::{FindingId, HighlightEvent, KEY_DUPLICATE_GROUP};
use tablight::schema::{DatasetId, Property, SchemaRegistry};
use tablight::source::{DataContainer, ParentPath, TabularSource};
use tablight::{Facet, KeyValues, Result, ValidationEngine, Value};

use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

const ITEMS: DatasetId = DatasetId(1);

fn engine_for(schema: SchemaRegistry, codes: &[&str]) -> (Rc<DataContainer>, Rc<ValidationEngine>) {
    let data = Rc::new(DataContainer::new(Rc::new(schema)));
    let engine = ValidationEngine::new(data.clone());
    engine.start().unwrap();

    let root = ParentPath::root();
    data.insert_rows(ITEMS, &root, 0, codes.len()).unwrap();
    for (row, code) in codes.iter().enumerate() {
        data.set_cell(ITEMS, row, 0, Facet::DISPLAY, Value::from(*code), &root)
            .unwrap();
    }
    (data, engine)
}

fn key_schema() -> SchemaRegistry {
    SchemaRegistry::builder()
        .dataset(ITEMS, "items")
        .column("code")
        .key()
        .done()
        .column("name")
        .done()
        .done()
        .build()
        .unwrap()
}

#[test]
fn shared_keys_are_flagged_and_resolve_on_edit() {
    let (data, engine) = engine_for(key_schema(), &["A", "A", "B"]);
    engine.execute_checks().unwrap();

    let root = ParentPath::root();
    let table = data.table(ITEMS).unwrap().clone();
    let id = |row| table.row_id(row, &root).unwrap();

    let group = engine.highlight().group_items(KEY_DUPLICATE_GROUP);
    assert_eq!(group.len(), 2);
    assert_eq!(group[0].property, Property::cell(ITEMS, id(0), 0));
    assert_eq!(group[1].property, Property::cell(ITEMS, id(1), 0));
    assert_eq!(group[0].id, FindingId::UNIQUE);
    assert_eq!(group[0].message, "\u{201c}A\u{201d} is not unique");
    assert_eq!(group[0].data, Value::from("A"));
    assert!(engine
        .highlight()
        .items_for(Property::cell(ITEMS, id(2), 0))
        .is_empty());

    data.set_cell(ITEMS, 1, 0, Facet::DISPLAY, Value::from("C"), &root)
        .unwrap();
    engine.execute_checks().unwrap();
    assert!(engine.highlight().group_items(KEY_DUPLICATE_GROUP).is_empty());
}

#[test]
fn unchanged_recheck_emits_no_events() {
    let (_data, engine) = engine_for(key_schema(), &["A", "A"]);
    engine.execute_checks().unwrap();
    assert_eq!(engine.highlight().count(), 2);

    let events = Rc::new(RefCell::new(0_usize));
    let sink = events.clone();
    engine.subscribe_events(move |_: &HighlightEvent| *sink.borrow_mut() += 1);

    engine.register_check_all();
    engine.execute_checks().unwrap();
    assert_eq!(*events.borrow(), 0);
    assert_eq!(engine.highlight().count(), 2);
}

#[test]
fn blank_base_keys_are_exempt() {
    let schema = SchemaRegistry::builder()
        .dataset(ITEMS, "items")
        .column("code")
        .key()
        .base_key()
        .done()
        .column("name")
        .done()
        .done()
        .build()
        .unwrap();
    let (data, engine) = engine_for(schema, &["", ""]);
    engine.execute_checks().unwrap();
    assert!(engine.highlight().is_empty());

    let root = ParentPath::root();
    data.set_cell(ITEMS, 0, 0, Facet::DISPLAY, Value::from("X"), &root)
        .unwrap();
    data.set_cell(ITEMS, 1, 0, Facet::DISPLAY, Value::from("X"), &root)
        .unwrap();
    engine.execute_checks().unwrap();
    assert_eq!(engine.highlight().group_items(KEY_DUPLICATE_GROUP).len(), 2);
}

#[test]
fn findings_attach_to_the_designated_error_column() {
    let schema = SchemaRegistry::builder()
        .dataset(ITEMS, "items")
        .column("code")
        .key()
        .done()
        .column("name")
        .error_display()
        .done()
        .done()
        .build()
        .unwrap();
    let (data, engine) = engine_for(schema, &["A", "A"]);
    engine.execute_checks().unwrap();

    let root = ParentPath::root();
    let table = data.table(ITEMS).unwrap().clone();
    let id = table.row_id(0, &root).unwrap();
    assert!(engine
        .highlight()
        .get(Property::cell(ITEMS, id, 1), FindingId::UNIQUE)
        .is_some());
    assert!(engine
        .highlight()
        .get(Property::cell(ITEMS, id, 0), FindingId::UNIQUE)
        .is_none());
}

struct ConstantKey;

impl KeyValues for ConstantKey {
    fn key_to_unique_string(
        &self,
        _dataset: DatasetId,
        _row: usize,
        _parent: &ParentPath,
        _source: &dyn TabularSource,
    ) -> Result<Option<String>> {
        Ok(Some("k".into()))
    }
}

#[test]
fn custom_keys_replace_the_builtin_composition() {
    let (_data, engine) = engine_for(key_schema(), &["A", "B"]);
    engine.set_key_values(Some(Rc::new(ConstantKey)));
    engine.execute_checks().unwrap();

    let group = engine.highlight().group_items(KEY_DUPLICATE_GROUP);
    assert_eq!(group.len(), 2);
    assert_eq!(group[0].data, Value::from("k"));
}

struct RejectMarked;

impl KeyValues for RejectMarked {
    fn check_key_values(
        &self,
        dataset: DatasetId,
        row: usize,
        parent: &ParentPath,
        source: &dyn TabularSource,
    ) -> Result<Option<(String, Property)>> {
        let value = source.value(row, 0, Facet::DISPLAY, parent)?;
        if value.to_display() == "bad" {
            let id = source.row_id(row, parent)?;
            return Ok(Some((
                "malformed key".into(),
                Property::cell(dataset, id, 0),
            )));
        }
        Ok(None)
    }
}

#[test]
fn malformed_keys_are_flagged_and_left_out() {
    let (data, engine) = engine_for(key_schema(), &["bad", "A", "A"]);
    engine.set_key_values(Some(Rc::new(RejectMarked)));
    engine.execute_checks().unwrap();

    let root = ParentPath::root();
    let table = data.table(ITEMS).unwrap().clone();
    let bad_cell = Property::cell(ITEMS, table.row_id(0, &root).unwrap(), 0);
    let finding = engine
        .highlight()
        .get(bad_cell, FindingId::UNIQUE)
        .expect("malformed key finding");
    assert_eq!(finding.message, "malformed key");

    assert_eq!(engine.highlight().group_items(KEY_DUPLICATE_GROUP).len(), 2);
}
