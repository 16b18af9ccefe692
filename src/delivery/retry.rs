//! Exponential backoff for webhook delivery.
//!
//! After failed attempt `n` (1-based) the sender waits
//! `initial_delay * multiplier^(n-1)`, capped at `max_delay`. There is no
//! wait after the final attempt.
//!
//! With the defaults (5s initial, 300s cap, x2, 10 attempts) the waits are
//! 5, 10, 20, 40, 80, 160, 300, 300, 300 seconds.

use std::time::Duration;

/// Retry schedule for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,

    /// Cap on any single delay.
    pub max_delay: Duration,

    /// Growth factor between consecutive delays.
    pub multiplier: u32,

    /// Total attempts, including the first. Always at least 1.
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub const DEFAULT: Self = Self {
        initial_delay: Duration::from_secs(5),
        max_delay: Duration::from_secs(300),
        multiplier: 2,
        max_attempts: 10,
    };

    /// Creates a policy. `max_attempts` below 1 is raised to 1.
    pub fn new(
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: u32,
        max_attempts: u32,
    ) -> Self {
        Self {
            initial_delay,
            max_delay,
            multiplier,
            max_attempts: max_attempts.max(1),
        }
    }

    /// The wait after failed attempt `attempt` (1-based).
    ///
    /// Saturates at `max_delay` instead of overflowing.
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        self.multiplier
            .checked_pow(exponent)
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Every wait a fully failing delivery goes through, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..self.max_attempts).map(|attempt| self.delay_after_attempt(attempt))
    }

    /// Total time a fully failing delivery spends waiting.
    pub fn total_max_wait(&self) -> Duration {
        self.delays().sum()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ─── Unit Tests ───────────────────────────────────────────────────────────

    #[test]
    fn default_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.initial_delay, Duration::from_secs(5));
        assert_eq!(policy.max_delay, Duration::from_secs(300));
        assert_eq!(policy.multiplier, 2);
        assert_eq!(policy.max_attempts, 10);
    }

    #[test]
    fn default_delays_double_then_cap() {
        let delays: Vec<u64> = RetryPolicy::DEFAULT.delays().map(|d| d.as_secs()).collect();
        assert_eq!(delays, vec![5, 10, 20, 40, 80, 160, 300, 300, 300]);
    }

    #[test]
    fn total_max_wait_default() {
        // 5 + 10 + 20 + 40 + 80 + 160 + 300 * 3
        assert_eq!(RetryPolicy::DEFAULT.total_max_wait(), Duration::from_secs(1215));
    }

    #[test]
    fn single_attempt_never_waits() {
        let policy = RetryPolicy::new(Duration::from_secs(1), Duration::from_secs(2), 2, 1);
        assert_eq!(policy.delays().count(), 0);
        assert_eq!(policy.total_max_wait(), Duration::ZERO);
    }

    #[test]
    fn zero_attempts_is_raised_to_one() {
        let policy = RetryPolicy::new(Duration::from_secs(1), Duration::from_secs(2), 2, 0);
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn huge_exponent_saturates_at_cap() {
        let policy = RetryPolicy::new(Duration::from_secs(5), Duration::from_secs(300), 10, 100);
        assert_eq!(policy.delay_after_attempt(90), Duration::from_secs(300));
    }

    #[test]
    fn multiplier_of_one_is_constant() {
        let policy = RetryPolicy::new(Duration::from_millis(50), Duration::from_secs(1), 1, 5);
        assert!(policy.delays().all(|d| d == Duration::from_millis(50)));
    }

    // ─── Property Tests ───────────────────────────────────────────────────────

    proptest! {
        #[test]
        fn delay_never_exceeds_cap(
            initial_ms in 1u64..1000,
            max_ms in 1000u64..60000,
            multiplier in 1u32..5,
            attempt in 1u32..64,
        ) {
            let policy = RetryPolicy::new(
                Duration::from_millis(initial_ms),
                Duration::from_millis(max_ms),
                multiplier,
                64,
            );
            prop_assert!(policy.delay_after_attempt(attempt) <= Duration::from_millis(max_ms));
        }

        #[test]
        fn delay_sequence_is_monotonic(
            initial_ms in 1u64..1000,
            max_ms in 1000u64..60000,
            multiplier in 1u32..5,
            max_attempts in 1u32..40,
        ) {
            let policy = RetryPolicy::new(
                Duration::from_millis(initial_ms),
                Duration::from_millis(max_ms),
                multiplier,
                max_attempts,
            );
            let delays: Vec<_> = policy.delays().collect();
            for window in delays.windows(2) {
                prop_assert!(window[1] >= window[0], "Delays should be monotonic");
            }
        }

        #[test]
        fn first_delay_equals_initial_delay(
            initial_ms in 1u64..10000,
            max_ms in 10000u64..100000,
            multiplier in 1u32..5,
        ) {
            let policy = RetryPolicy::new(
                Duration::from_millis(initial_ms),
                Duration::from_millis(max_ms),
                multiplier,
                5,
            );
            prop_assert_eq!(policy.delay_after_attempt(1), Duration::from_millis(initial_ms));
        }

        #[test]
        fn total_wait_bounded_by_cap_times_waits(
            initial_ms in 1u64..1000,
            max_ms in 1000u64..10000,
            multiplier in 1u32..5,
            max_attempts in 1u32..20,
        ) {
            let policy = RetryPolicy::new(
                Duration::from_millis(initial_ms),
                Duration::from_millis(max_ms),
                multiplier,
                max_attempts,
            );
            let upper_bound = Duration::from_millis(max_ms * u64::from(max_attempts - 1));
            prop_assert!(policy.total_max_wait() <= upper_bound);
        }
    }
}
