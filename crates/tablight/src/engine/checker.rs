use crate::highlight::HighlightInfo;
use tablight_core::schema::{
    CellRef, ColumnSchema, DatasetId, DatasetSchema, FieldSchema, Property,
};
use tablight_core::source::{ParentPath, TabularSource};
use tablight_core::{Result, Value};

/// Application-defined checks run alongside the built-in constraint pass.
///
/// Implement only the hooks you need; defaults check nothing. Verdicts are
/// staged into the [`HighlightInfo`], findings and explicit "no issue"
/// entries alike, so stale findings from earlier passes get removed.
pub trait ExternalChecker {
    fn check_field(&self, _field: &FieldSchema, _value: &Value, _info: &mut HighlightInfo) {}

    fn check_cell(
        &self,
        _cell: CellRef,
        _column: &ColumnSchema,
        _value: &Value,
        _info: &mut HighlightInfo,
    ) {
    }

    fn check_dataset(&self, _dataset: &DatasetSchema, _info: &mut HighlightInfo) {}

    /// Catch-all hook, called once per checked property.
    fn check_property(&self, _property: Property, _info: &mut HighlightInfo) {}
}

/// Application hooks into duplicate-key detection.
pub trait KeyValues {
    /// A custom key for the row, replacing the built-in composition.
    /// `None` falls back to the built-in one.
    fn key_to_unique_string(
        &self,
        _dataset: DatasetId,
        _row: usize,
        _parent: &ParentPath,
        _source: &dyn TabularSource,
    ) -> Result<Option<String>> {
        Ok(None)
    }

    /// Pre-check of a row's key values. A returned message means the key is
    /// malformed: the message is attached to the returned property and the
    /// row is left out of duplicate detection.
    fn check_key_values(
        &self,
        _dataset: DatasetId,
        _row: usize,
        _parent: &ParentPath,
        _source: &dyn TabularSource,
    ) -> Result<Option<(String, Property)>> {
        Ok(None)
    }
}
