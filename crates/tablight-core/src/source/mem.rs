use super::{ParentPath, RowLocator, TabularSource};
use crate::schema::RowId;
use crate::{Error, Facet, Result, Value};

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// An in-memory hierarchical table. The default [`TabularSource`] backing a
/// [`DataContainer`](super::DataContainer); cheap enough for tests and for
/// moderately sized editable datasets.
#[derive(Debug)]
pub struct MemTable {
    columns: Cell<usize>,
    next_id: Cell<u64>,
    rows: RefCell<Vec<Node>>,
}

#[derive(Debug)]
struct Node {
    id: RowId,
    cells: Vec<HashMap<Facet, Value>>,
    children: Vec<Node>,
}

impl MemTable {
    pub fn new(columns: usize) -> Self {
        MemTable {
            columns: Cell::new(columns),
            next_id: Cell::new(1),
            rows: RefCell::new(vec![]),
        }
    }

    fn alloc_id(&self) -> RowId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        RowId(id)
    }

    fn new_node(&self) -> Node {
        Node {
            id: self.alloc_id(),
            cells: (0..self.columns.get()).map(|_| HashMap::new()).collect(),
            children: vec![],
        }
    }

    /// Inserts `count` blank rows at position `at` under `parent` and
    /// returns their ids.
    pub fn insert_rows(&self, parent: &ParentPath, at: usize, count: usize) -> Result<Vec<RowId>> {
        let nodes: Vec<Node> = (0..count).map(|_| self.new_node()).collect();
        let ids: Vec<RowId> = nodes.iter().map(|n| n.id).collect();

        let mut rows = self.rows.borrow_mut();
        let siblings = resolve_mut(&mut rows, parent)?;
        if at > siblings.len() {
            return Err(Error::not_found(format!("row position {}", at)));
        }
        siblings.splice(at..at, nodes);
        Ok(ids)
    }

    /// Removes rows `first..=last` under `parent`, with their subtrees.
    pub fn remove_rows(&self, parent: &ParentPath, first: usize, last: usize) -> Result<()> {
        let mut rows = self.rows.borrow_mut();
        let siblings = resolve_mut(&mut rows, parent)?;
        if first > last || last >= siblings.len() {
            return Err(Error::not_found(format!("rows {}..={}", first, last)));
        }
        siblings.drain(first..=last);
        Ok(())
    }

    pub fn set_value(
        &self,
        row: usize,
        column: usize,
        facet: Facet,
        value: Value,
        parent: &ParentPath,
    ) -> Result<()> {
        let mut rows = self.rows.borrow_mut();
        let siblings = resolve_mut(&mut rows, parent)?;
        let node = siblings
            .get_mut(row)
            .ok_or_else(|| Error::not_found(format!("row {}", row)))?;
        let cell = node
            .cells
            .get_mut(column)
            .ok_or_else(|| Error::not_found(format!("column {}", column)))?;
        if value.is_null() {
            cell.remove(&facet);
        } else {
            cell.insert(facet, value);
        }
        Ok(())
    }

    pub fn insert_columns(&self, at: usize, count: usize) -> Result<()> {
        if at > self.columns.get() {
            return Err(Error::not_found(format!("column position {}", at)));
        }
        self.columns.set(self.columns.get() + count);
        let mut rows = self.rows.borrow_mut();
        for_each_node(&mut rows, &mut |node| {
            node.cells.splice(at..at, (0..count).map(|_| HashMap::new()));
        });
        Ok(())
    }

    pub fn remove_columns(&self, first: usize, last: usize) -> Result<()> {
        if first > last || last >= self.columns.get() {
            return Err(Error::not_found(format!("columns {}..={}", first, last)));
        }
        self.columns.set(self.columns.get() - (last - first + 1));
        let mut rows = self.rows.borrow_mut();
        for_each_node(&mut rows, &mut |node| {
            node.cells.drain(first..=last);
        });
        Ok(())
    }

    /// Drops every row. Column count and id allocation are kept.
    pub fn clear(&self) {
        self.rows.borrow_mut().clear();
    }
}

impl TabularSource for MemTable {
    fn row_count(&self, parent: &ParentPath) -> usize {
        let rows = self.rows.borrow();
        match resolve(&rows, parent) {
            Ok(siblings) => siblings.len(),
            Err(_) => 0,
        }
    }

    fn column_count(&self) -> usize {
        self.columns.get()
    }

    fn value(&self, row: usize, column: usize, facet: Facet, parent: &ParentPath) -> Result<Value> {
        let rows = self.rows.borrow();
        let siblings = resolve(&rows, parent)?;
        let node = siblings
            .get(row)
            .ok_or_else(|| Error::not_found(format!("row {}", row)))?;
        let cell = node
            .cells
            .get(column)
            .ok_or_else(|| Error::not_found(format!("column {}", column)))?;
        Ok(cell.get(&facet).cloned().unwrap_or(Value::Null))
    }

    fn row_id(&self, row: usize, parent: &ParentPath) -> Result<RowId> {
        let rows = self.rows.borrow();
        let siblings = resolve(&rows, parent)?;
        siblings
            .get(row)
            .map(|n| n.id)
            .ok_or_else(|| Error::not_found(format!("row {}", row)))
    }

    fn locate(&self, id: RowId) -> Option<RowLocator> {
        fn find(nodes: &[Node], id: RowId, parent: &ParentPath) -> Option<RowLocator> {
            for (row, node) in nodes.iter().enumerate() {
                if node.id == id {
                    return Some(RowLocator::new(row, parent.clone()));
                }
                if let Some(found) = find(&node.children, id, &parent.child(row)) {
                    return Some(found);
                }
            }
            None
        }
        find(&self.rows.borrow(), id, &ParentPath::root())
    }
}

fn resolve<'a>(rows: &'a [Node], parent: &ParentPath) -> Result<&'a [Node]> {
    let mut current = rows;
    for &segment in parent.segments() {
        let node = current
            .get(segment)
            .ok_or_else(|| Error::not_found(format!("parent row {}", segment)))?;
        current = &node.children;
    }
    Ok(current)
}

fn resolve_mut<'a>(rows: &'a mut Vec<Node>, parent: &ParentPath) -> Result<&'a mut Vec<Node>> {
    let mut current = rows;
    for &segment in parent.segments() {
        let node = current
            .get_mut(segment)
            .ok_or_else(|| Error::not_found(format!("parent row {}", segment)))?;
        current = &mut node.children;
    }
    Ok(current)
}

fn for_each_node(nodes: &mut [Node], apply: &mut impl FnMut(&mut Node)) {
    for node in nodes {
        apply(node);
        for_each_node(&mut node.children, apply);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable_across_removals() {
        let table = MemTable::new(2);
        let root = ParentPath::root();
        let ids = table.insert_rows(&root, 0, 3).unwrap();

        table.remove_rows(&root, 0, 0).unwrap();
        assert_eq!(table.row_id(0, &root).unwrap(), ids[1]);
        assert_eq!(table.locate(ids[2]), Some(RowLocator::top(1)));
        assert_eq!(table.locate(ids[0]), None);
    }

    #[test]
    fn hierarchical_rows() {
        let table = MemTable::new(1);
        let root = ParentPath::root();
        table.insert_rows(&root, 0, 1).unwrap();
        let child_path = root.child(0);
        let child_ids = table.insert_rows(&child_path, 0, 2).unwrap();

        assert_eq!(table.row_count(&root), 1);
        assert_eq!(table.row_count(&child_path), 2);
        assert_eq!(
            table.locate(child_ids[1]),
            Some(RowLocator::new(1, child_path.clone()))
        );

        table
            .set_value(1, 0, Facet::DISPLAY, "x".into(), &child_path)
            .unwrap();
        assert_eq!(
            table.value(1, 0, Facet::DISPLAY, &child_path).unwrap(),
            Value::from("x")
        );
    }

    #[test]
    fn column_edits_apply_to_all_rows() {
        let table = MemTable::new(2);
        let root = ParentPath::root();
        table.insert_rows(&root, 0, 1).unwrap();
        table
            .set_value(0, 1, Facet::DISPLAY, "b".into(), &root)
            .unwrap();

        table.insert_columns(0, 1).unwrap();
        assert_eq!(table.column_count(), 3);
        assert_eq!(
            table.value(0, 2, Facet::DISPLAY, &root).unwrap(),
            Value::from("b")
        );

        table.remove_columns(0, 1).unwrap();
        assert_eq!(table.column_count(), 1);
        assert_eq!(
            table.value(0, 0, Facet::DISPLAY, &root).unwrap(),
            Value::from("b")
        );
    }
}
