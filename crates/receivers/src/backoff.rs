//! Exponential reconnect backoff with jitter, per §4.1
//! ("base 1 s, cap 60 s").

use std::time::Duration;

use rand::Rng;

/// Default base delay before the first retry.
pub const DEFAULT_BASE: Duration = Duration::from_secs(1);
/// Default delay ceiling.
pub const DEFAULT_CAP: Duration = Duration::from_secs(60);

/// Tracks reconnect attempts and produces the next backoff delay.
pub struct ReconnectBackoff {
    base: Duration,
    cap: Duration,
    attempt: u32,
}

impl ReconnectBackoff {
    /// Creates a fresh backoff tracker.
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap, attempt: 0 }
    }

    /// Returns the delay for the next attempt (full jitter: a uniform
    /// random value in `[0, min(cap, base * 2^attempt)]`) and advances the
    /// attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let exponential = self.base.saturating_mul(1u32.checked_shl(self.attempt).unwrap_or(u32::MAX));
        let bounded = exponential.min(self.cap);
        self.attempt = self.attempt.saturating_add(1);
        let jitter_ms = rand::thread_rng().gen_range(0..=bounded.as_millis().max(1) as u64);
        Duration::from_millis(jitter_ms)
    }

    /// Resets the attempt counter after a successful connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new(DEFAULT_BASE, DEFAULT_CAP)
    }
}
