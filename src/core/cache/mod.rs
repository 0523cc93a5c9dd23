mod store;
mod table;

pub use store::{CacheStore, JsonCacheStore};
pub use table::{InFlightGuard, ResolutionTable, ResolveStatus};

/// File name of the persisted cache inside the data directory.
pub const CACHE_FILE: &str = "resolved_runners.json";
