use crate::application::resilience::ServiceError;
use crate::carbon_dating::domain::{AnalysisTarget, ComponentCandidate};
use async_trait::async_trait;

/// What a detector found, plus the sub-steps that failed along the way.
///
/// Failures here are partial: the detector still produced a result.
/// A detector that cannot produce anything returns a [`ServiceError`]
/// instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionOutcome {
    pub candidates: Vec<ComponentCandidate>,
    pub failures: Vec<String>,
}

impl DetectionOutcome {
    pub fn new(candidates: Vec<ComponentCandidate>, failures: Vec<String>) -> Self {
        Self {
            candidates,
            failures,
        }
    }

    /// Empty result carrying a single failure reason. Used as the fallback
    /// when a guarded detector call terminally fails.
    pub fn fallback(reason: String) -> Self {
        Self {
            candidates: Vec::new(),
            failures: vec![reason],
        }
    }
}

/// ComponentDetector port for discovering software components in a target
///
/// Implementations talk to the outside world (HTTP endpoints, the GitHub
/// API) and are always called through the resilience envelope under the
/// name returned by [`ComponentDetector::service_name`].
///
/// # Async Support
/// Implementations must be `Send + Sync` to support concurrent analyses.
#[async_trait]
pub trait ComponentDetector: Send + Sync {
    /// Name of the external service this detector depends on
    fn service_name(&self) -> &str;

    /// Detects components in the target
    ///
    /// # Arguments
    /// * `target` - The validated analysis target
    ///
    /// # Returns
    /// Unordered candidates without date information, plus failure reasons
    /// for sub-steps that did not succeed
    ///
    /// # Errors
    /// Returns a classified [`ServiceError`] when nothing could be detected
    /// (network failure, private repository, nonexistent resource)
    async fn detect(&self, target: &AnalysisTarget) -> Result<DetectionOutcome, ServiceError>;
}
