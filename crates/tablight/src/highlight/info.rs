use super::{FindingId, HighlightItem};
use tablight_core::schema::{Property, Severity};

use indexmap::IndexMap;

/// Staging area for one check pass.
///
/// Checkers record their verdict per `(property, finding id)`: an item when
/// something was found, an explicit "nothing" otherwise. The engine then
/// diffs the staged verdicts against the result model, so only real
/// differences turn into model events.
#[derive(Debug, Default)]
pub struct HighlightInfo {
    entries: IndexMap<Property, IndexMap<FindingId, Option<HighlightItem>>>,
}

impl HighlightInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a finding.
    pub fn set(&mut self, item: HighlightItem) {
        self.entries
            .entry(item.property)
            .or_default()
            .insert(item.id, Some(item));
    }

    /// Stages an explicit "checked, no issue" verdict. A staged finding for
    /// the same slot is not overwritten.
    pub fn empty(&mut self, property: Property, id: FindingId) {
        self.entries
            .entry(property)
            .or_default()
            .entry(id)
            .or_insert(None);
    }

    pub fn contains(&self, property: Property) -> bool {
        self.entries.contains_key(&property)
    }

    pub fn get(&self, property: Property, id: FindingId) -> Option<&HighlightItem> {
        self.entries
            .get(&property)?
            .get(&id)
            .and_then(|slot| slot.as_ref())
    }

    /// True when a staged finding of at least `level` exists for `property`.
    pub fn has_level(&self, property: Property, level: Severity) -> bool {
        self.entries
            .get(&property)
            .map(|slots| {
                slots
                    .values()
                    .flatten()
                    .any(|item| item.severity >= level)
            })
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All staged verdicts, in staging order.
    pub fn into_entries(self) -> impl Iterator<Item = (Property, FindingId, Option<HighlightItem>)> {
        self.entries.into_iter().flat_map(|(property, slots)| {
            slots
                .into_iter()
                .map(move |(id, item)| (property, id, item))
        })
    }
}
