//! Requeue configuration for rate-limited jobs.

use rand::Rng;
use std::time::Duration;

/// How long a rate-limited job waits before going back on the queue.
///
/// Every 403 schedules the original job once; there is no attempt limit.
/// The delay is drawn uniformly from `[0, max_jitter)` so that a burst of
/// 403s does not come back as a burst of retries.
#[derive(Debug, Clone)]
pub struct RequeueConfig {
    /// Upper bound (exclusive) of the random requeue delay.
    pub max_jitter: Duration,
}

impl Default for RequeueConfig {
    fn default() -> Self {
        Self {
            max_jitter: Duration::from_millis(2000),
        }
    }
}

impl RequeueConfig {
    /// Creates a new requeue configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requeues immediately.
    pub fn no_jitter() -> Self {
        Self {
            max_jitter: Duration::ZERO,
        }
    }

    /// Sets the jitter window.
    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Draws the delay for one requeue.
    pub fn next_delay(&self) -> Duration {
        let window = self.max_jitter.as_millis() as u64;
        if window == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..window))
    }
}
