use crate::shared::error::AnalysisError;
use crate::shared::Clock;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Window widths and admission limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleLimits {
    pub short_window: Duration,
    pub short_limit: usize,
    pub long_window: Duration,
    pub long_limit: usize,
}

impl Default for ThrottleLimits {
    fn default() -> Self {
        Self {
            short_window: Duration::from_secs(60),
            short_limit: 60,
            long_window: Duration::from_secs(3600),
            long_limit: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrottleWindow {
    Short,
    Long,
}

impl ThrottleWindow {
    pub fn describe(self) -> &'static str {
        match self {
            ThrottleWindow::Short => "per minute",
            ThrottleWindow::Long => "per hour",
        }
    }
}

impl fmt::Display for ThrottleWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThrottleDecision {
    pub allowed: bool,
    pub short_remaining: usize,
    pub long_remaining: usize,
    /// Set on rejection: the window whose limit was hit
    pub exceeded_window: Option<ThrottleWindow>,
    /// Set on rejection: time until the blocking entry leaves its window
    pub retry_after: Option<Duration>,
}

/// Per-client dual sliding-window admission control.
///
/// Each client keeps one timestamp queue, pruned lazily to the long window
/// on every check. The short window count is taken from the tail of the
/// same queue.
pub struct RequestThrottle {
    limits: ThrottleLimits,
    clients: DashMap<String, VecDeque<DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
}

impl RequestThrottle {
    pub fn new(limits: ThrottleLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            limits,
            clients: DashMap::new(),
            clock,
        }
    }

    pub fn limits(&self) -> ThrottleLimits {
        self.limits
    }

    /// Admits or rejects one request for `client`. Admission records the
    /// request in both windows; rejection records nothing.
    pub fn check(&self, client: &str) -> ThrottleDecision {
        let now = self.clock.now();
        let short_start = shift_back(now, self.limits.short_window);
        let long_start = shift_back(now, self.limits.long_window.max(self.limits.short_window));

        let mut entry = self.clients.entry(client.to_string()).or_default();
        let timestamps = entry.value_mut();
        while timestamps.front().is_some_and(|t| *t <= long_start) {
            timestamps.pop_front();
        }

        let long_count = timestamps.len();
        let short_count = timestamps.iter().rev().take_while(|t| **t > short_start).count();

        if short_count >= self.limits.short_limit {
            let retry_after = timestamps
                .get(long_count - short_count)
                .map(|oldest| until(now, shift_forward(*oldest, self.limits.short_window)))
                .unwrap_or(self.limits.short_window);
            tracing::warn!(client, window = "short", retry_after_secs = retry_after.as_secs(), "request throttled");
            return self.rejection(ThrottleWindow::Short, short_count, long_count, retry_after);
        }

        if long_count >= self.limits.long_limit {
            let retry_after = timestamps
                .front()
                .map(|oldest| until(now, shift_forward(*oldest, self.limits.long_window)))
                .unwrap_or(self.limits.long_window);
            tracing::warn!(client, window = "long", retry_after_secs = retry_after.as_secs(), "request throttled");
            return self.rejection(ThrottleWindow::Long, short_count, long_count, retry_after);
        }

        timestamps.push_back(now);
        ThrottleDecision {
            allowed: true,
            short_remaining: self.limits.short_limit - short_count - 1,
            long_remaining: self.limits.long_limit - long_count - 1,
            exceeded_window: None,
            retry_after: None,
        }
    }

    fn rejection(
        &self,
        window: ThrottleWindow,
        short_count: usize,
        long_count: usize,
        retry_after: Duration,
    ) -> ThrottleDecision {
        ThrottleDecision {
            allowed: false,
            short_remaining: self.limits.short_limit.saturating_sub(short_count),
            long_remaining: self.limits.long_limit.saturating_sub(long_count),
            exceeded_window: Some(window),
            retry_after: Some(retry_after),
        }
    }

    /// Like [`RequestThrottle::check`] but turns a rejection into
    /// [`AnalysisError::Throttled`].
    pub fn admit(&self, client: &str) -> Result<ThrottleDecision, AnalysisError> {
        let decision = self.check(client);
        if decision.allowed {
            return Ok(decision);
        }
        Err(AnalysisError::Throttled {
            client: client.to_string(),
            window: decision
                .exceeded_window
                .map(|w| w.describe().to_string())
                .unwrap_or_default(),
            retry_after: decision.retry_after.unwrap_or(self.limits.short_window),
        })
    }

    /// Drops clients with no request inside the long window.
    pub fn prune_idle(&self) -> usize {
        let long_start = shift_back(self.clock.now(), self.limits.long_window);
        let before = self.clients.len();
        self.clients
            .retain(|_, timestamps| timestamps.back().is_some_and(|t| *t > long_start));
        before - self.clients.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

fn shift_back(at: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|delta| at.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn shift_forward(at: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn until(now: DateTime<Utc>, at: DateTime<Utc>) -> Duration {
    (at - now).to_std().unwrap_or(Duration::ZERO)
}
