// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff schedule and the injectable sleep primitive.

use std::time::Duration;

use async_trait::async_trait;

/// Retry schedule for rate-limited completion calls.
///
/// Attempt `n` (0-based) that is rate limited waits `base * 2^n` before the
/// next attempt. With the defaults that is 1, 2, 4, 8 and 16 seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    max_attempts: u32,
}

impl BackoffPolicy {
    pub const DEFAULT_BASE: Duration = Duration::from_secs(1);
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// `max_attempts` is clamped to at least one.
    pub fn new(base: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the rate-limited attempt `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor)
    }

    /// Every delay the policy can produce, in order.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_attempts).map(|attempt| self.delay_for(attempt))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE, Self::DEFAULT_MAX_ATTEMPTS)
    }
}

/// Suspends the caller for a duration.
///
/// Backoff delays and the inter-job cool-down both go through this trait so
/// tests can observe and control them.
#[async_trait]
pub trait Sleeper: Send + Sync + 'static {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_doubles_from_one_second() {
        let delays: Vec<u64> = BackoffPolicy::default()
            .schedule()
            .map(|d| d.as_secs())
            .collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16]);
    }

    #[test]
    fn custom_base() {
        let policy = BackoffPolicy::new(Duration::from_millis(250), 3);
        assert_eq!(policy.delay_for(0), Duration::from_millis(250));
        assert_eq!(policy.delay_for(2), Duration::from_secs(1));
        assert_eq!(policy.schedule().count(), 3);
    }

    #[test]
    fn huge_attempt_saturates() {
        let policy = BackoffPolicy::default();
        assert!(policy.delay_for(40) >= policy.delay_for(31));
    }

    #[test]
    fn zero_attempts_is_clamped() {
        assert_eq!(BackoffPolicy::new(Duration::from_secs(1), 0).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_sleeper_advances_paused_clock() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_secs(16)).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(16), "slept {elapsed:?}");
        assert!(elapsed < Duration::from_millis(16_010), "slept {elapsed:?}");
    }
}
