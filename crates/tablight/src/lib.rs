mod engine;
pub use engine::{DatasetInfo, EngineState, ExternalChecker, KeyValues, ValidationEngine};

pub mod highlight;
pub use highlight::{HighlightItem, HighlightModel, Severity};

pub use tablight_core::{index, schema, source, Error, Facet, Result, SchemaRegistry, Value};
