mod cache;
pub use cache::IndexCache;

mod hashed;
pub use hashed::{CustomKey, HashedIndex, KeyCustomize};

mod key_spec;
pub use key_spec::{KeyColumn, KeySpec, KEY_SEPARATOR};

mod registry;
pub use registry::HashRegistry;

mod resource;
pub use resource::ResourceMonitor;
