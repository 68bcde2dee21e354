pub mod accessor;
pub mod directory;
pub mod error;
pub mod memory;
pub mod parse;
pub mod query;
pub mod traits;
pub mod trend_storage;

pub use accessor::StoreAccessor;
pub use directory::DirectoryStore;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use traits::{Relation, SnapshotStore, TrendWriter};
pub use trend_storage::TrendStorage;
