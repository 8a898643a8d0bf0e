use crate::shared::Clock;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Retry hint handed to callers turned away while a half-open trial runs
pub const TRIAL_IN_FLIGHT_RETRY_AFTER: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive terminal failures that open the circuit
    pub failure_threshold: u32,
    /// Time spent open before a single trial call is let through
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
        }
    }
}

/// Snapshot of one breaker for operational introspection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    pub service_name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub last_failure_time: Option<DateTime<Utc>>,
    pub next_attempt_time: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    last_failure_time: Option<DateTime<Utc>>,
    next_attempt_time: Option<DateTime<Utc>>,
    trial_in_flight: bool,
}

impl BreakerState {
    fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure_time: None,
            next_attempt_time: None,
            trial_in_flight: false,
        }
    }
}

/// Per-service Closed/Open/HalfOpen state machine.
///
/// All transitions happen under one lock so readers never observe a torn
/// state. Callers obtain a [`CallPermit`] before each guarded invocation and
/// settle it with the invocation's terminal outcome.
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            config,
            clock,
            inner: Mutex::new(BreakerState::closed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Asks for permission to call the service.
    ///
    /// In `Open` this moves to `HalfOpen` once the recovery timeout has
    /// elapsed and admits exactly one trial call. Rejections carry the time
    /// left until the next trial.
    pub fn try_acquire(self: &Arc<Self>) -> Result<CallPermit, Duration> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        match inner.state {
            CircuitState::Closed => {}
            CircuitState::Open => {
                let next_attempt = inner.next_attempt_time.unwrap_or(now);
                if now < next_attempt {
                    return Err(remaining(now, next_attempt));
                }
                inner.state = CircuitState::HalfOpen;
                inner.trial_in_flight = true;
                tracing::info!(service = %self.name, "circuit breaker half-open, allowing trial call");
                return Ok(self.permit(true));
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    return Err(TRIAL_IN_FLIGHT_RETRY_AFTER);
                }
                inner.trial_in_flight = true;
                return Ok(self.permit(true));
            }
        }

        Ok(self.permit(false))
    }

    fn permit(self: &Arc<Self>, trial: bool) -> CallPermit {
        CallPermit {
            breaker: Arc::clone(self),
            trial,
            settled: false,
        }
    }

    fn on_success(&self, trial: bool) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::HalfOpen if trial => {
                *inner = BreakerState::closed();
                tracing::info!(service = %self.name, "circuit breaker closed after successful trial");
            }
            CircuitState::Closed => inner.failure_count = 0,
            // A call admitted before the circuit opened finished late.
            _ => {}
        }
    }

    fn on_failure(&self, trial: bool) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure_time = Some(now);

        match inner.state {
            CircuitState::Closed if inner.failure_count >= self.config.failure_threshold => {
                self.open(&mut inner, now);
                tracing::warn!(
                    service = %self.name,
                    failure_count = inner.failure_count,
                    threshold = self.config.failure_threshold,
                    "circuit breaker opened"
                );
            }
            CircuitState::HalfOpen if trial => {
                self.open(&mut inner, now);
                tracing::warn!(service = %self.name, "circuit breaker reopened after failed trial");
            }
            _ => {}
        }
    }

    fn on_abandoned(&self, trial: bool) {
        if trial {
            self.inner.lock().trial_in_flight = false;
        }
    }

    fn open(&self, inner: &mut BreakerState, now: DateTime<Utc>) {
        inner.state = CircuitState::Open;
        inner.trial_in_flight = false;
        inner.next_attempt_time = chrono::Duration::from_std(self.config.recovery_timeout)
            .ok()
            .and_then(|timeout| now.checked_add_signed(timeout));
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn status(&self) -> ServiceStatus {
        let inner = self.inner.lock();
        ServiceStatus {
            service_name: self.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            last_failure_time: inner.last_failure_time,
            next_attempt_time: match inner.state {
                CircuitState::Closed => None,
                _ => inner.next_attempt_time,
            },
        }
    }

    /// Forces the breaker back to `Closed` with a zeroed failure count.
    pub fn reset(&self) {
        *self.inner.lock() = BreakerState::closed();
        tracing::info!(service = %self.name, "circuit breaker manually reset");
    }
}

fn remaining(now: DateTime<Utc>, until: DateTime<Utc>) -> Duration {
    (until - now).to_std().unwrap_or(Duration::ZERO)
}

/// Admission for one guarded invocation.
///
/// Dropping a permit without settling it (for example when the calling
/// future is cancelled at a deadline) releases a half-open trial slot
/// without counting an outcome.
pub struct CallPermit {
    breaker: Arc<CircuitBreaker>,
    trial: bool,
    settled: bool,
}

impl CallPermit {
    pub fn success(mut self) {
        self.settled = true;
        self.breaker.on_success(self.trial);
    }

    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.on_failure(self.trial);
    }
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.on_abandoned(self.trial);
        }
    }
}
