//! Circuit breaker state machine.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Whether workers may issue probes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BreakerState {
    /// Workers probe normally.
    #[default]
    Running,

    /// A cooldown is in flight; every worker waits at the gate.
    Paused {
        /// When the pause started.
        paused_at: Instant,
    },
}

impl BreakerState {
    /// Returns `true` if workers may probe.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns `true` if a cooldown is in flight.
    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused { .. })
    }

    /// Returns the name of the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Paused { .. } => "paused",
        }
    }
}

/// Metrics about circuit breaker behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreakerMetrics {
    /// Rate-limited outcomes reported.
    pub rate_limited: u64,
    /// Successful outcomes reported.
    pub successes: u64,
    /// Number of times the pool was paused.
    pub times_paused: u64,
    /// Number of times the pool was resumed.
    pub times_resumed: u64,
}

impl BreakerMetrics {
    /// Creates new empty metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a rate-limited outcome.
    pub fn record_rate_limited(&mut self) {
        self.rate_limited += 1;
    }

    /// Records a successful outcome.
    pub fn record_success(&mut self) {
        self.successes += 1;
    }

    /// Records that the pool paused.
    pub fn record_paused(&mut self) {
        self.times_paused += 1;
    }

    /// Records that the pool resumed.
    pub fn record_resumed(&mut self) {
        self.times_resumed += 1;
    }

    /// Returns the share of reported outcomes that were rate limited.
    pub fn rate_limited_ratio(&self) -> f64 {
        let total = self.rate_limited + self.successes;
        if total == 0 {
            return 0.0;
        }
        self.rate_limited as f64 / total as f64
    }
}
