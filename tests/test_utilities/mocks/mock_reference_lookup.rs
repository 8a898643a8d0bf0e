use async_trait::async_trait;
use stackdebt::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock ReferenceLookup wrapping a real table, optionally failing the
/// first N calls with a retryable error
pub struct MockReferenceLookup {
    table: YamlReferenceTable,
    failures_remaining: AtomicUsize,
    calls: Arc<AtomicUsize>,
}

impl MockReferenceLookup {
    pub fn new(table: YamlReferenceTable) -> Self {
        Self {
            table,
            failures_remaining: AtomicUsize::new(0),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing_first(self, times: usize) -> Self {
        self.failures_remaining.store(times, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ReferenceLookup for MockReferenceLookup {
    async fn lookup(&self, name: &str, version: &str) -> Result<Option<ReleaseInfo>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(ServiceError::retryable(REFERENCE_LOOKUP, "reference store timed out"));
        }
        Ok(self.table.resolve(name, version))
    }
}
