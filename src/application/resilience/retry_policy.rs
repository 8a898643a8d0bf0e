use rand::Rng;
use std::time::Duration;

/// Bounds of the multiplicative jitter applied to each backoff delay (±25%)
const JITTER_LOW: f64 = 0.75;
const JITTER_HIGH: f64 = 1.25;

/// Exponential backoff schedule for one named service.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub exponential_base: f64,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
            ..Self::default()
        }
    }

    pub fn with_exponential_base(mut self, exponential_base: f64) -> Self {
        self.exponential_base = exponential_base;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retrying after the (zero-based) `attempt` failed, without
    /// jitter: `min(max_delay, base_delay * exponential_base^attempt)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let seconds = self.base_delay.as_secs_f64() * self.exponential_base.powi(exponent);
        self.cap(seconds)
    }

    /// Jittered backoff. Never exceeds `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.backoff(attempt).as_secs_f64();
        if !self.jitter {
            return self.cap(base);
        }
        let factor = rand::thread_rng().gen_range(JITTER_LOW..=JITTER_HIGH);
        self.cap(base * factor)
    }

    /// A server-supplied `Retry-After` replaces the computed backoff, still
    /// bounded by `max_delay`.
    pub fn delay_with_hint(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(hint) => hint.min(self.max_delay),
            None => self.delay_for(attempt),
        }
    }

    fn cap(&self, seconds: f64) -> Duration {
        let max = self.max_delay.as_secs_f64();
        if !seconds.is_finite() || seconds >= max {
            return self.max_delay;
        }
        Duration::from_secs_f64(seconds.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_exponentially_until_cap() {
        let policy = RetryPolicy::new(5, Duration::from_secs(2), Duration::from_secs(30));
        assert_eq!(policy.backoff(0), Duration::from_secs(2));
        assert_eq!(policy.backoff(1), Duration::from_secs(4));
        assert_eq!(policy.backoff(2), Duration::from_secs(8));
        assert_eq!(policy.backoff(3), Duration::from_secs(16));
        assert_eq!(policy.backoff(4), Duration::from_secs(30));
        assert_eq!(policy.backoff(40), Duration::from_secs(30));
    }

    #[test]
    fn test_backoff_is_non_decreasing() {
        let policy = RetryPolicy::default();
        let delays: Vec<Duration> = (0..10).map(|a| policy.backoff(a)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_jittered_delay_stays_within_bounds() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(10));
        for _ in 0..200 {
            let delay = policy.delay_for(1).as_secs_f64();
            assert!((1.5..=2.5).contains(&delay), "delay {} out of range", delay);
        }
    }

    #[test]
    fn test_jittered_delay_never_exceeds_max() {
        let policy = RetryPolicy::new(3, Duration::from_secs(8), Duration::from_secs(10));
        for _ in 0..200 {
            assert!(policy.delay_for(3) <= Duration::from_secs(10));
        }
    }

    #[test]
    fn test_without_jitter_delay_equals_backoff() {
        let policy =
            RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(1)).with_jitter(false);
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
    }

    #[test]
    fn test_retry_after_hint_replaces_backoff_but_is_capped() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(30));
        assert_eq!(
            policy.delay_with_hint(0, Some(Duration::from_secs(5))),
            Duration::from_secs(5)
        );
        assert_eq!(
            policy.delay_with_hint(0, Some(Duration::from_secs(120))),
            Duration::from_secs(30)
        );
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_policy() -> impl Strategy<Value = RetryPolicy> {
        (
            1u32..10,
            0u64..5_000,
            0u64..60_000,
            prop_oneof![Just(1.0f64), 1.1f64..4.0],
            any::<bool>(),
        )
            .prop_map(|(max_attempts, base_ms, max_ms, exponential_base, jitter)| {
                RetryPolicy::new(
                    max_attempts,
                    Duration::from_millis(base_ms),
                    Duration::from_millis(max_ms),
                )
                .with_exponential_base(exponential_base)
                .with_jitter(jitter)
            })
    }

    proptest! {
        /// Backoff never shrinks from one attempt to the next and never
        /// passes the cap.
        #[test]
        fn prop_backoff_non_decreasing_and_capped(policy in arb_policy(), attempt in 0u32..40) {
            let current = policy.backoff(attempt);
            let next = policy.backoff(attempt + 1);

            prop_assert!(current <= next, "{:?} > {:?}", current, next);
            prop_assert!(next <= policy.max_delay);
        }

        /// Jitter and server hints stay under the cap too.
        #[test]
        fn prop_delays_never_exceed_max_delay(
            policy in arb_policy(),
            attempt in 0u32..40,
            hint_ms in prop::option::of(0u64..600_000),
        ) {
            prop_assert!(policy.delay_for(attempt) <= policy.max_delay);
            let hint = hint_ms.map(Duration::from_millis);
            prop_assert!(policy.delay_with_hint(attempt, hint) <= policy.max_delay);
        }
    }
}
