use crate::application::cache::CacheStats;
use crate::application::dto::{AnalysisRequest, AnalysisResponse};
use crate::application::monitor::OperationStats;
use crate::application::resilience::ServiceStatus;
use crate::shared::error::AnalysisError;
use async_trait::async_trait;

/// StackAnalysisPort - Inbound port for the stack analysis use case
///
/// This port defines the interface that driving adapters (CLI, an HTTP
/// layer) use to run analyses and to operate the shared resilience state.
#[async_trait]
pub trait StackAnalysisPort: Send + Sync {
    /// Analyzes a website or repository
    ///
    /// # Arguments
    /// * `request` - Target, optional explicit type and client identity
    ///
    /// # Returns
    /// The scored stack with its components and detection metadata. Partial
    /// results (some components missing) are successes.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The client exceeded its request rate ([`AnalysisError::Throttled`])
    /// - The target is malformed ([`AnalysisError::Validation`])
    /// - No component could be dated ([`AnalysisError::InsufficientData`])
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResponse, AnalysisError>;

    /// Returns the circuit breaker snapshot of a named external service
    fn service_status(&self, service: &str) -> ServiceStatus;

    /// Forces a service's circuit breaker back to closed
    fn reset_breaker(&self, service: &str);

    /// Returns result cache counters
    fn cache_stats(&self) -> CacheStats;

    /// Returns timing stats of every pipeline operation run so far
    fn performance_stats(&self) -> Vec<OperationStats>;
}
