use std::time::Duration;

/// Trait for defining reconnection policies
///
/// Implement this trait to control how a stream connection should
/// behave after a transport failure.
pub trait ReconnectPolicy: Send + Sync {
    /// Get the delay before the next reconnection attempt
    ///
    /// # Arguments
    /// * `failures` - Number of consecutive failed attempts so far (>= 1).
    ///   The counter resets to zero every time a socket opens successfully.
    ///
    /// # Returns
    /// * `Some(duration)` - Wait this long before reconnecting
    /// * `None` - Give up; the connection is terminal
    fn next_delay(&self, failures: u32) -> Option<Duration>;

    /// Check whether another attempt is allowed after `failures` failures
    fn should_retry(&self, failures: u32) -> bool;
}

/// Exponential backoff reconnection policy
///
/// Delays between reconnection attempts grow exponentially:
/// `base * 2^(failures - 1)`, clamped to `cap`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    cap: Duration,
    max_attempts: Option<u32>,
}

impl ExponentialBackoff {
    /// Create a new exponential backoff policy
    ///
    /// # Arguments
    /// * `base` - Delay after the first failure
    /// * `cap` - Maximum delay between attempts
    /// * `max_attempts` - Total failed attempts tolerated before giving up
    ///   (`None` = never give up)
    pub fn new(base: Duration, cap: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            base,
            cap,
            max_attempts,
        }
    }
}

impl ReconnectPolicy for ExponentialBackoff {
    fn next_delay(&self, failures: u32) -> Option<Duration> {
        if !self.should_retry(failures) {
            return None;
        }

        // 2^(failures - 1), saturating so huge failure counts land on the cap
        let factor = 1u64
            .checked_shl(failures.saturating_sub(1))
            .unwrap_or(u64::MAX);
        let delay_ms = (self.base.as_millis() as u64)
            .saturating_mul(factor)
            .min(self.cap.as_millis() as u64);
        Some(Duration::from_millis(delay_ms))
    }

    fn should_retry(&self, failures: u32) -> bool {
        self.max_attempts.map_or(true, |max| failures < max)
    }
}

/// Fixed delay reconnection policy
///
/// Always waits the same amount of time between reconnection attempts
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<u32>,
}

impl FixedDelay {
    /// Create a new fixed delay policy
    ///
    /// # Arguments
    /// * `delay` - The fixed delay between attempts
    /// * `max_attempts` - Total failed attempts tolerated (`None` = unlimited)
    pub fn new(delay: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }
}

impl ReconnectPolicy for FixedDelay {
    fn next_delay(&self, failures: u32) -> Option<Duration> {
        if !self.should_retry(failures) {
            return None;
        }
        Some(self.delay)
    }

    fn should_retry(&self, failures: u32) -> bool {
        self.max_attempts.map_or(true, |max| failures < max)
    }
}

/// Never reconnect policy
///
/// The connection will not be reopened after a failure
#[derive(Debug, Clone)]
pub struct NeverReconnect;

impl ReconnectPolicy for NeverReconnect {
    fn next_delay(&self, _failures: u32) -> Option<Duration> {
        None
    }

    fn should_retry(&self, _failures: u32) -> bool {
        false
    }
}
