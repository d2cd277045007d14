//! Circuit breaker implementation.

use crate::circuit_breaker::config::CircuitBreakerConfig;
use crate::circuit_breaker::state::{BreakerMetrics, BreakerState};

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tokio::sync::watch;

/// A pool-wide gate that pauses every worker after a run of 403s.
///
/// The breaker counts consecutive rate-limited outcomes across all
/// workers. When the count reaches the threshold, exactly one reporter
/// wins the Running → Paused transition and owns the cooldown; everyone
/// else keeps going until they reach the gate. After the cooldown the
/// owner resets the counter and resumes the pool, waking every waiter at
/// once.
///
/// A single breaker is shared by the whole scan, not keyed per host.
///
/// # States
///
/// - **Running**: Workers probe normally; 403s are counted.
/// - **Paused**: A cooldown is in flight; [`await_running`] blocks.
///
/// # Example
///
/// ```rust,ignore
/// use reflex::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
/// use std::sync::Arc;
///
/// let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default()));
///
/// breaker.await_running().await;
/// if breaker.report_rate_limited() {
///     breaker.spawn_cooldown();
/// }
/// ```
///
/// [`await_running`]: CircuitBreaker::await_running
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Configuration.
    config: CircuitBreakerConfig,
    /// Consecutive rate-limited outcomes seen by any worker.
    consecutive: AtomicU32,
    /// Current state; receivers are woken on every change.
    state: watch::Sender<BreakerState>,
    /// Metrics.
    metrics: RwLock<BreakerMetrics>,
}

impl CircuitBreaker {
    /// Creates a new circuit breaker in the running state.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        let (state, _) = watch::channel(BreakerState::Running);
        Self {
            config,
            consecutive: AtomicU32::new(0),
            state,
            metrics: RwLock::new(BreakerMetrics::new()),
        }
    }

    /// Creates a new circuit breaker with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }

    /// Returns the current state of the circuit breaker.
    pub fn state(&self) -> BreakerState {
        *self.state.borrow()
    }

    /// Returns the current consecutive rate-limited count.
    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive.load(Ordering::SeqCst)
    }

    /// Returns a copy of the current metrics.
    pub fn metrics(&self) -> BreakerMetrics {
        self.metrics
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Records a non-rate-limited outcome.
    ///
    /// Any success anywhere in the pool clears the consecutive count.
    pub fn report_success(&self) {
        self.consecutive.store(0, Ordering::SeqCst);
        self.metrics
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record_success();
    }

    /// Records a 403.
    ///
    /// Returns `true` if this call moved the breaker from Running to
    /// Paused. The caller then owns the cooldown and must run
    /// [`cooldown`](Self::cooldown) exactly once.
    pub fn report_rate_limited(&self) -> bool {
        let count = self.consecutive.fetch_add(1, Ordering::SeqCst) + 1;
        self.metrics
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record_rate_limited();

        if count < self.config.failure_threshold {
            return false;
        }

        let triggered = self.state.send_if_modified(|state| {
            if state.is_running() {
                *state = BreakerState::Paused {
                    paused_at: Instant::now(),
                };
                true
            } else {
                false
            }
        });

        if triggered {
            self.metrics
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .record_paused();
            crate::audit::emit_breaker_paused(count, self.config.failure_threshold, self.config.cooldown);
        }

        triggered
    }

    /// Waits until the breaker is running.
    ///
    /// Returns immediately when not paused. The current value is checked
    /// after subscribing, so a resume between the check and the wait is
    /// never lost.
    pub async fn await_running(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(BreakerState::is_running).await;
    }

    /// Sleeps for the cooldown, then resets the counter and resumes.
    ///
    /// Only the caller that received `true` from
    /// [`report_rate_limited`](Self::report_rate_limited) runs this.
    pub async fn cooldown(&self) {
        let paused_at = match self.state() {
            BreakerState::Paused { paused_at } => paused_at,
            BreakerState::Running => {
                tracing::debug!("Cooldown requested while running, ignoring");
                return;
            }
        };

        tokio::time::sleep(self.config.cooldown).await;

        self.consecutive.store(0, Ordering::SeqCst);
        self.state.send_replace(BreakerState::Running);
        self.metrics
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record_resumed();

        crate::audit::emit_breaker_resumed(paused_at.elapsed());
    }

    /// Runs [`cooldown`](Self::cooldown) on a background task.
    pub fn spawn_cooldown(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let breaker = Arc::clone(self);
        tokio::spawn(async move { breaker.cooldown().await })
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn breaker(threshold: u32, cooldown: Duration) -> Arc<CircuitBreaker> {
        Arc::new(CircuitBreaker::new(
            CircuitBreakerConfig::new()
                .with_failure_threshold(threshold)
                .with_cooldown(cooldown),
        ))
    }

    #[test]
    fn test_pauses_once_at_threshold() {
        let breaker = breaker(10, Duration::from_secs(60));

        for _ in 0..9 {
            assert!(!breaker.report_rate_limited());
        }
        assert!(breaker.state().is_running());

        assert!(breaker.report_rate_limited());
        assert!(breaker.state().is_paused());

        // Already paused: further 403s never trigger a second cooldown.
        assert!(!breaker.report_rate_limited());
        assert_eq!(breaker.consecutive_errors(), 11);
        assert_eq!(breaker.metrics().times_paused, 1);
    }

    #[test]
    fn test_success_resets_counter() {
        let breaker = breaker(3, Duration::from_secs(60));

        assert!(!breaker.report_rate_limited());
        assert!(!breaker.report_rate_limited());
        breaker.report_success();
        assert_eq!(breaker.consecutive_errors(), 0);

        assert!(!breaker.report_rate_limited());
        assert!(!breaker.report_rate_limited());
        assert!(breaker.state().is_running());
        assert!(breaker.report_rate_limited());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_crossings_trigger_once() {
        let breaker = breaker(10, Duration::from_secs(60));
        let reporters = 32;
        let triggers = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..reporters)
            .map(|_| {
                let breaker = Arc::clone(&breaker);
                let triggers = Arc::clone(&triggers);
                tokio::spawn(async move {
                    if breaker.report_rate_limited() {
                        triggers.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(triggers.load(Ordering::SeqCst), 1);
        assert!(breaker.state().is_paused());
        assert!(breaker.consecutive_errors() <= 10 + reporters - 1);
    }

    #[tokio::test]
    async fn test_await_running_returns_immediately_when_running() {
        let breaker = breaker(10, Duration::from_secs(60));
        tokio::time::timeout(Duration::from_millis(100), breaker.await_running())
            .await
            .expect("gate should be open");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_wakes_every_waiter() {
        let cooldown = Duration::from_secs(60);
        let breaker = breaker(10, cooldown);
        for _ in 0..10 {
            breaker.report_rate_limited();
        }
        assert!(breaker.state().is_paused());

        let started = tokio::time::Instant::now();
        let woken = Arc::new(AtomicUsize::new(0));
        let waiters: Vec<_> = (0..8)
            .map(|_| {
                let breaker = Arc::clone(&breaker);
                let woken = Arc::clone(&woken);
                tokio::spawn(async move {
                    breaker.await_running().await;
                    woken.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        let cooldown_task = breaker.spawn_cooldown();

        tokio::time::sleep(cooldown / 2).await;
        assert_eq!(woken.load(Ordering::SeqCst), 0);
        assert!(breaker.state().is_paused());

        cooldown_task.await.unwrap();
        for waiter in waiters {
            waiter.await.unwrap();
        }

        assert_eq!(woken.load(Ordering::SeqCst), 8);
        assert!(started.elapsed() >= cooldown);
        assert!(breaker.state().is_running());
        assert_eq!(breaker.consecutive_errors(), 0);
        assert_eq!(breaker.metrics().times_resumed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_breaker_can_trip_again_after_resume() {
        let breaker = breaker(2, Duration::from_secs(1));

        breaker.report_rate_limited();
        assert!(breaker.report_rate_limited());
        breaker.cooldown().await;
        assert!(breaker.state().is_running());

        breaker.report_rate_limited();
        assert!(breaker.report_rate_limited());
        assert_eq!(breaker.metrics().times_paused, 2);
    }

    #[tokio::test]
    async fn test_cooldown_while_running_is_a_no_op() {
        let breaker = breaker(10, Duration::from_secs(60));
        tokio::time::timeout(Duration::from_millis(100), breaker.cooldown())
            .await
            .expect("no sleep when running");
        assert_eq!(breaker.metrics().times_resumed, 0);
    }
}
