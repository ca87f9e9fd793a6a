/// Path from the root of a hierarchical source down to a parent row.
/// The empty path addresses the top level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParentPath(Vec<usize>);

impl ParentPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The path to the children of the row at `row` under this path.
    pub fn child(&self, row: usize) -> Self {
        let mut path = self.0.clone();
        path.push(row);
        ParentPath(path)
    }

    /// Row positions from the root down, outermost first.
    pub fn segments(&self) -> &[usize] {
        &self.0
    }

    /// True when `self` addresses `other` or one of its ancestors.
    pub fn contains(&self, other: &ParentPath) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }
}

impl From<Vec<usize>> for ParentPath {
    fn from(src: Vec<usize>) -> Self {
        ParentPath(src)
    }
}

/// Physical position of one row: its index under a parent path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowLocator {
    pub row: usize,
    pub parent: ParentPath,
}

impl RowLocator {
    pub fn new(row: usize, parent: ParentPath) -> Self {
        RowLocator { row, parent }
    }

    pub fn top(row: usize) -> Self {
        RowLocator {
            row,
            parent: ParentPath::root(),
        }
    }
}

/// An ordered set of row locators. Keeps first-seen order and drops
/// duplicates, so lookup results are stable across merges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSet {
    rows: Vec<RowLocator>,
}

impl RowSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, locator: RowLocator) {
        if !self.rows.contains(&locator) {
            self.rows.push(locator);
        }
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = RowLocator>) {
        for locator in other {
            self.push(locator);
        }
    }

    pub fn contains(&self, locator: &RowLocator) -> bool {
        self.rows.contains(locator)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RowLocator> {
        self.rows.iter()
    }

    pub fn into_vec(self) -> Vec<RowLocator> {
        self.rows
    }
}

impl FromIterator<RowLocator> for RowSet {
    fn from_iter<I: IntoIterator<Item = RowLocator>>(iter: I) -> Self {
        let mut set = RowSet::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for RowSet {
    type Item = RowLocator;
    type IntoIter = std::vec::IntoIter<RowLocator>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
