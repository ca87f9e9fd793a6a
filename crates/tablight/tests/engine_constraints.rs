use tablight::highlight::FindingId;
use tablight::schema::{Constraint, DatasetId, FieldId, Property, Severity};
use tablight::source::{DataContainer, ParentPath};
use tablight::{Facet, SchemaRegistry, ValidationEngine, Value};

use pretty_assertions::assert_eq;
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
        .constraint(Constraint::max_text_length(4))
        .done()
        .column("qty")
        .constraint(
            Constraint::reg_exp("^[0-9]*$")
                .unwrap()
                .with_severity(Severity::Warning)
                .with_message("quantity must be numeric"),
        )
        .done()
        .done()
        .build()
        .unwrap();
    let data = Rc::new(DataContainer::new(Rc::new(schema)));
    let engine = ValidationEngine::new(data.clone());
    engine.start().unwrap();
    (data, engine)
}

#[test]
fn blank_required_field_is_flagged_until_filled() {
    let (data, engine) = engine();
    engine.execute_checks().unwrap();

    let findings = engine.highlight().items_for(Property::Field(NAME));
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].id, FindingId::REQUIRED);
    assert_eq!(findings[0].severity, Severity::Error);

    data.set_field(NAME, Value::from("gadget")).unwrap();
    engine.execute_checks().unwrap();
    assert!(engine.highlight().items_for(Property::Field(NAME)).is_empty());
}

#[test]
fn cell_constraints_follow_edits() {
    let (data, engine) = engine();
    data.set_field(NAME, Value::from("gadget")).unwrap();
    let root = ParentPath::root();
    let ids = data.insert_rows(ITEMS, &root, 0, 1).unwrap();
    engine.execute_checks().unwrap();

    let code_cell = Property::cell(ITEMS, ids[0], 0);
    let findings = engine.highlight().items_for(code_cell);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].id, FindingId::REQUIRED);
    assert_eq!(findings[0].message, "\u{201c}code\u{201d} is not defined");

    data.set_cell(ITEMS, 0, 0, Facet::DISPLAY, Value::from("toolong"), &root)
        .unwrap();
    engine.execute_checks().unwrap();
    let findings = engine.highlight().items_for(code_cell);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].id, FindingId::MAX_TEXT_LENGTH);

    data.set_cell(ITEMS, 0, 0, Facet::DISPLAY, Value::from("ok"), &root)
        .unwrap();
    engine.execute_checks().unwrap();
    assert!(engine.highlight().items_for(code_cell).is_empty());
}

#[test]
fn custom_message_and_severity_are_carried() {
    let (data, engine) = engine();
    data.set_field(NAME, Value::from("gadget")).unwrap();
    let root = ParentPath::root();
    let ids = data.insert_rows(ITEMS, &root, 0, 1).unwrap();
    data.set_cell(ITEMS, 0, 0, Facet::DISPLAY, Value::from("ok"), &root)
        .unwrap();
    data.set_cell(ITEMS, 0, 1, Facet::DISPLAY, Value::from("many"), &root)
        .unwrap();
    engine.execute_checks().unwrap();

    let qty_cell = Property::cell(ITEMS, ids[0], 1);
    let findings = engine.highlight().items_for(qty_cell);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].id, FindingId::REGEXP);
    assert_eq!(findings[0].severity, Severity::Warning);
    assert_eq!(findings[0].message, "quantity must be numeric");
    assert!(!engine.highlight().has_errors());
}

#[test]
fn cell_highlight_runs_pending_checks_on_demand() {
    let (data, engine) = engine();
    data.set_field(NAME, Value::from("gadget")).unwrap();
    let root = ParentPath::root();
    let ids = data.insert_rows(ITEMS, &root, 0, 1).unwrap();

    let code_cell = tablight::schema::CellRef {
        dataset: ITEMS,
        row: ids[0],
        column: 0,
    };
    assert!(engine.has_pending_checks());
    let findings = engine.cell_highlight(code_cell, true).unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].id, FindingId::REQUIRED);
    assert!(!engine.has_pending_checks());
}
