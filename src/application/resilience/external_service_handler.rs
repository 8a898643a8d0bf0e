use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, ServiceStatus};
use super::retry_policy::RetryPolicy;
use super::service_error::ServiceError;
use crate::shared::Clock;
use dashmap::DashMap;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const GITHUB_API: &str = "github_api";
pub const HTTP_SCRAPER: &str = "http_scraper";
pub const REFERENCE_LOOKUP: &str = "reference_lookup";

/// Retry schedule and breaker thresholds for one named service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceConfig {
    pub retry: RetryPolicy,
    pub breaker: CircuitBreakerConfig,
}

impl ServiceConfig {
    /// Built-in settings for the services the analyzer talks to. Unknown
    /// names get [`ServiceConfig::default`].
    pub fn builtin(service: &str) -> Self {
        match service {
            GITHUB_API => Self {
                retry: RetryPolicy::new(3, Duration::from_secs(2), Duration::from_secs(30)),
                breaker: CircuitBreakerConfig {
                    failure_threshold: 5,
                    recovery_timeout: Duration::from_secs(60),
                },
            },
            HTTP_SCRAPER => Self {
                retry: RetryPolicy::new(2, Duration::from_secs(1), Duration::from_secs(10)),
                breaker: CircuitBreakerConfig {
                    failure_threshold: 3,
                    recovery_timeout: Duration::from_secs(30),
                },
            },
            REFERENCE_LOOKUP => Self {
                retry: RetryPolicy::new(2, Duration::from_millis(200), Duration::from_secs(2)),
                breaker: CircuitBreakerConfig {
                    failure_threshold: 5,
                    recovery_timeout: Duration::from_secs(30),
                },
            },
            _ => Self::default(),
        }
    }
}

/// The resilience envelope around every external call.
///
/// One long-lived instance is built at startup and shared by handle. Each
/// service name owns an independent circuit breaker, created on first use.
/// Retries run inside a single breaker-guarded invocation, so the breaker
/// only ever sees the terminal outcome.
pub struct ExternalServiceHandler {
    configs: HashMap<String, ServiceConfig>,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    clock: Arc<dyn Clock>,
}

impl ExternalServiceHandler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let configs = [GITHUB_API, HTTP_SCRAPER, REFERENCE_LOOKUP]
            .into_iter()
            .map(|name| (name.to_string(), ServiceConfig::builtin(name)))
            .collect();

        Self {
            configs,
            breakers: DashMap::new(),
            clock,
        }
    }

    /// Overrides the settings of one service. Must be called before the
    /// service's breaker is first used.
    pub fn with_service_config(mut self, service: &str, config: ServiceConfig) -> Self {
        self.configs.insert(service.to_string(), config);
        self
    }

    pub fn config_for(&self, service: &str) -> ServiceConfig {
        self.configs
            .get(service)
            .cloned()
            .unwrap_or_else(|| ServiceConfig::builtin(service))
    }

    /// Names of all configured services, sorted.
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.configs.keys().cloned().collect();
        for entry in self.breakers.iter() {
            if !names.contains(entry.key()) {
                names.push(entry.key().clone());
            }
        }
        names.sort();
        names
    }

    fn breaker(&self, service: &str) -> Arc<CircuitBreaker> {
        if let Some(breaker) = self.breakers.get(service) {
            return Arc::clone(breaker.value());
        }
        let breaker = self
            .breakers
            .entry(service.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(
                    service,
                    self.config_for(service).breaker,
                    Arc::clone(&self.clock),
                ))
            });
        Arc::clone(breaker.value())
    }

    /// Runs `operation` under the named service's breaker and retry policy.
    ///
    /// # Errors
    /// - [`ServiceError::CircuitOpen`] when the breaker rejects the call; the
    ///   operation is not invoked and the breaker's counter is untouched
    /// - the operation's own error when it is non-retryable
    /// - [`ServiceError::Exhausted`] when every attempt failed retryably
    pub async fn execute<T, F, Fut>(&self, service: &str, mut operation: F) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let breaker = self.breaker(service);
        let permit = match breaker.try_acquire() {
            Ok(permit) => permit,
            Err(retry_after) => {
                tracing::debug!(service, retry_after_ms = retry_after.as_millis() as u64, "call rejected by open circuit");
                return Err(ServiceError::CircuitOpen {
                    service: service.to_string(),
                    retry_after,
                });
            }
        };

        let policy = self.config_for(service).retry;
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let error = match operation().await {
                Ok(value) => {
                    permit.success();
                    return Ok(value);
                }
                Err(error) => error,
            };
            attempt += 1;

            if !error.is_retryable() {
                tracing::warn!(service, attempt, error_kind = error.kind(), error = %error, "non-retryable failure");
                permit.failure();
                return Err(error);
            }

            if attempt >= max_attempts {
                tracing::warn!(service, attempts = attempt, error = %error, "retries exhausted");
                permit.failure();
                return Err(ServiceError::Exhausted {
                    service: service.to_string(),
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            let delay = policy.delay_with_hint(attempt - 1, error.retry_after());
            tracing::warn!(
                service,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "retryable failure, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Breaker snapshot for `service`.
    pub fn service_status(&self, service: &str) -> ServiceStatus {
        self.breaker(service).status()
    }

    pub fn all_statuses(&self) -> Vec<ServiceStatus> {
        self.service_names()
            .iter()
            .map(|name| self.service_status(name))
            .collect()
    }

    pub fn reset_breaker(&self, service: &str) {
        self.breaker(service).reset();
    }
}
