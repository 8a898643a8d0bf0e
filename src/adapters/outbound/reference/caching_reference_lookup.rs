use crate::application::cache::ResultCache;
use crate::application::resilience::ServiceError;
use crate::carbon_dating::domain::ReleaseInfo;
use crate::ports::outbound::ReferenceLookup;
use crate::shared::{Clock, SystemClock};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Distinct (software, version) pairs remembered at once
pub const DEFAULT_MEMO_ENTRIES: usize = 4096;

/// How long a remembered answer stays valid
pub const MEMO_TTL: Duration = Duration::from_secs(24 * 60 * 60);

fn memo_key(name: &str, version: &str) -> String {
    format!("{}@{}", name.to_lowercase(), version)
}

/// CachingReferenceLookup wraps a ReferenceLookup and memoizes its answers.
///
/// Both hits and misses are cached; errors are not, so a failed lookup is
/// attempted again on the next analysis. The memo is bounded: past
/// `capacity` pairs, expired answers go first and then the least recently
/// used one.
pub struct CachingReferenceLookup<L: ReferenceLookup> {
    inner: L,
    memo: Arc<ResultCache<Option<ReleaseInfo>>>,
}

impl<L: ReferenceLookup> CachingReferenceLookup<L> {
    pub fn new(inner: L) -> Self {
        Self::with_capacity(inner, DEFAULT_MEMO_ENTRIES, Arc::new(SystemClock))
    }

    pub fn with_capacity(inner: L, capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            memo: Arc::new(ResultCache::new(capacity, clock)),
        }
    }

    /// Returns the current memo size (for testing/monitoring)
    pub fn cache_size(&self) -> usize {
        self.memo.len()
    }
}

#[async_trait]
impl<L: ReferenceLookup> ReferenceLookup for CachingReferenceLookup<L> {
    async fn lookup(&self, name: &str, version: &str) -> Result<Option<ReleaseInfo>, ServiceError> {
        let key = memo_key(name, version);

        if let Some(cached) = self.memo.get(&key) {
            return Ok(cached);
        }

        let release = self.inner.lookup(name, version).await?;
        self.memo.put(&key, release, MEMO_TTL);

        Ok(release)
    }
}
