mod info;
pub use info::HighlightInfo;

mod item;
pub use item::{FindingId, HighlightItem, KEY_DUPLICATE_GROUP};

mod model;
pub use model::{HighlightEvent, HighlightModel};

pub use tablight_core::schema::Severity;
