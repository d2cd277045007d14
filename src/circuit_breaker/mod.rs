//! Pool-wide circuit breaker for 403 storms.
//!
//! The breaker counts consecutive 403s across all workers and, past a
//! threshold, pauses the whole pool for a fixed cooldown.
//!
//! ## States
//!
//! - **Running**: Workers probe normally.
//! - **Paused**: Every worker blocks at the gate until the cooldown ends.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use reflex::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! let config = CircuitBreakerConfig::default()
//!     .with_failure_threshold(10)
//!     .with_cooldown(Duration::from_secs(60));
//!
//! let breaker = CircuitBreaker::new(config);
//! ```

mod breaker;
mod config;
mod state;

pub use breaker::CircuitBreaker;
pub use config::CircuitBreakerConfig;
pub use state::{BreakerMetrics, BreakerState};
