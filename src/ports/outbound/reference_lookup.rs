use crate::application::resilience::ServiceError;
use crate::carbon_dating::domain::ReleaseInfo;
use async_trait::async_trait;

/// ReferenceLookup port for resolving release dates
///
/// This port abstracts the reference data source mapping a
/// `(software, version)` pair to its release and end-of-life dates.
///
/// # Async Support
/// Lookups for distinct components are issued concurrently, so
/// implementations must be `Send + Sync`.
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    /// Looks up the release information of one component version
    ///
    /// # Arguments
    /// * `name` - Software name as detected (e.g. "nginx")
    /// * `version` - Version string as detected
    ///
    /// # Returns
    /// `Some(ReleaseInfo)` when the pair is known, `None` when it is not
    ///
    /// # Errors
    /// Returns a [`ServiceError`] if the reference source itself failed
    async fn lookup(&self, name: &str, version: &str) -> Result<Option<ReleaseInfo>, ServiceError>;
}
