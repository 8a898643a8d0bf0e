//! In-memory result cache for whole analyses.
mod result_cache;

pub use result_cache::{CacheEntryInfo, CacheSettings, CacheStats, ResultCache};
