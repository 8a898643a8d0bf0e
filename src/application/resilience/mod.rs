//! Resilience envelope for external calls: retry with jittered exponential
//! backoff, per-service circuit breaking and typed failures that callers
//! turn into fallbacks.
mod circuit_breaker;
mod external_service_handler;
mod retry_policy;
mod service_error;

pub use circuit_breaker::{
    CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitState, ServiceStatus,
};
pub use external_service_handler::{
    ExternalServiceHandler, ServiceConfig, GITHUB_API, HTTP_SCRAPER, REFERENCE_LOOKUP,
};
pub use retry_policy::RetryPolicy;
pub use service_error::ServiceError;
