use tablight_core::index::{IndexCache, KeySpec};
use tablight_core::source::{MemTable, ParentPath, RowLocator, RowSet, TabularSource};
use tablight_core::{Facet, Value};

use pretty_assertions::assert_eq;
use std::rc::Rc;

fn cache_with(rows: &[&[&str]]) -> IndexCache {
    let columns = rows.first().map(|r| r.len()).unwrap_or(0);
    let table = Rc::new(MemTable::new(columns));
    let root = ParentPath::root();
    table.insert_rows(&root, 0, rows.len()).unwrap();
    for (r, row) in rows.iter().enumerate() {
        for (c, text) in row.iter().enumerate() {
            table
                .set_value(r, c, Facet::DISPLAY, Value::from(*text), &root)
                .unwrap();
        }
    }
    IndexCache::new(table as Rc<dyn TabularSource>)
}

#[test]
fn equal_signatures_share_one_index() {
    let cache = cache_with(&[&["a", "1"], &["b", "2"]]);
    let spec = KeySpec::simple(&[0]);

    let first = cache.index(&spec);
    let second = cache.index(&KeySpec::simple(&[0]));
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);

    cache.index(&KeySpec::simple(&[1]));
    assert_eq!(cache.len(), 2);
}

#[test]
fn find_rows_any_unions_without_duplicates() {
    let cache = cache_with(&[&["a"], &["b"], &["a"]]);
    let spec = KeySpec::simple(&[0]);

    let rows = cache
        .find_rows_any(
            &spec,
            &[
                vec![Value::from("a")],
                vec![Value::from("b")],
                vec![Value::from("a")],
            ],
        )
        .unwrap();
    assert_eq!(
        rows.into_vec(),
        vec![RowLocator::top(0), RowLocator::top(2), RowLocator::top(1)]
    );
}

#[test]
fn find_rows_by_column_shortcut() {
    let cache = cache_with(&[&["a", "X"], &["b", "x"]]);
    let rows = cache
        .find_rows_by_column(1, true, Facet::DISPLAY, &Value::from("x"))
        .unwrap();
    assert_eq!(rows, vec![RowLocator::top(0), RowLocator::top(1)]);
}

#[test]
fn invert_rows_yields_the_complement() {
    let cache = cache_with(&[&["a"], &["b"], &["c"]]);
    let spec = KeySpec::simple(&[0]);
    let matched: RowSet = cache
        .find_rows(&spec, &[Value::from("b")])
        .unwrap()
        .into_iter()
        .collect();

    let inverted = cache.invert_rows(&matched).unwrap();
    assert_eq!(
        inverted.into_vec(),
        vec![RowLocator::top(0), RowLocator::top(2)]
    );
}

#[test]
fn clear_drops_cached_indices() {
    let cache = cache_with(&[&["a"]]);
    cache.index(&KeySpec::simple(&[0]));
    assert!(!cache.is_empty());
    cache.clear();
    assert!(cache.is_empty());
}
