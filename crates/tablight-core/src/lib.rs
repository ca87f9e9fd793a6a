mod error;
pub use error::Error;

pub mod index;

pub mod schema;
pub use schema::SchemaRegistry;

pub mod source;

pub mod value;
pub use value::{Facet, Value};

/// A Result type alias that uses Tablight's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
