//! Mock prober for testing.
//!
//! The mock inspects the probe URL to find which parameter carries the
//! canary and answers according to how it was configured, so scans can be
//! driven end to end without a network.

use crate::core::{ProbeOutcome, Prober, ReflexError, CANARY};

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use url::Url;

/// A configurable in-memory prober.
///
/// # Examples
///
/// ```rust
/// use reflex::backends::MockProber;
/// use std::time::Duration;
///
/// // Echo the canary back whenever it sits in `q`
/// let prober = MockProber::new().with_reflecting_param("q");
///
/// // Answer the first three probes with 403, then behave normally
/// let prober = MockProber::new()
///     .with_rate_limited_first(3)
///     .with_latency(Duration::from_millis(5));
/// ```
#[derive(Debug)]
pub struct MockProber {
    name: String,
    /// Parameters whose injected value is echoed into the body.
    reflecting: RwLock<HashSet<String>>,
    /// Parameters whose probes fail at the transport level.
    failing: RwLock<HashSet<String>>,
    /// Remaining probes to answer with 403.
    rate_limit_budget: AtomicU64,
    always_rate_limited: AtomicBool,
    latency: Option<Duration>,
    probe_count: AtomicU64,
    history: RwLock<Vec<String>>,
}

impl MockProber {
    /// Creates a mock that answers every probe with an empty 200.
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            reflecting: RwLock::new(HashSet::new()),
            failing: RwLock::new(HashSet::new()),
            rate_limit_budget: AtomicU64::new(0),
            always_rate_limited: AtomicBool::new(false),
            latency: None,
            probe_count: AtomicU64::new(0),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Sets the name of this prober.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Reflects the injected value when `param` carries the canary.
    pub fn with_reflecting_param(self, param: impl Into<String>) -> Self {
        self.add_reflecting_param(param);
        self
    }

    /// Fails probes targeting `param` with a transport error.
    pub fn with_failing_param(self, param: impl Into<String>) -> Self {
        self.failing
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(param.into());
        self
    }

    /// Answers the next `n` probes with 403 regardless of target.
    pub fn with_rate_limited_first(self, n: u64) -> Self {
        self.rate_limit_budget.store(n, Ordering::SeqCst);
        self
    }

    /// Sets the simulated latency for probes.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Adds a reflecting parameter (mutable version).
    pub fn add_reflecting_param(&self, param: impl Into<String>) {
        self.reflecting
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(param.into());
    }

    /// Answers every probe with 403 until switched off.
    pub fn set_always_rate_limited(&self, enabled: bool) {
        self.always_rate_limited.store(enabled, Ordering::SeqCst);
    }

    /// Returns the number of probes received.
    pub fn probe_count(&self) -> u64 {
        self.probe_count.load(Ordering::Relaxed)
    }

    /// Returns every probe URL received, in arrival order.
    pub fn history(&self) -> Vec<String> {
        self.history
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn take_rate_limit(&self) -> bool {
        if self.always_rate_limited.load(Ordering::SeqCst) {
            return true;
        }
        self.rate_limit_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn injected_param(url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        let found = parsed
            .query_pairs()
            .find(|(_, value)| value == CANARY)
            .map(|(name, _)| name.into_owned());
        found
    }
}

impl Default for MockProber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prober for MockProber {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self, url: &str) -> ProbeOutcome {
        self.probe_count.fetch_add(1, Ordering::Relaxed);
        self.history
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.to_string());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.take_rate_limit() {
            return ProbeOutcome::RateLimited;
        }

        let Some(param) = Self::injected_param(url) else {
            return ProbeOutcome::success(200, b"<html>nothing here</html>".to_vec());
        };

        let failing = self
            .failing
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&param);
        if failing {
            return ProbeOutcome::TransportError(ReflexError::transport(url, "simulated failure"));
        }

        let reflects = self
            .reflecting
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&param);
        if reflects {
            let body = format!("<html><p>You searched for {}</p></html>", CANARY);
            ProbeOutcome::success(200, body.into_bytes())
        } else {
            ProbeOutcome::success(200, b"<html>nothing here</html>".to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_url(param: &str) -> String {
        format!("http://t/x?{}={}&other=1", param, CANARY)
    }

    #[tokio::test]
    async fn test_reflects_only_configured_param() {
        let prober = MockProber::new().with_reflecting_param("q");

        let hit = prober.probe(&probe_url("q")).await;
        assert!(hit.body().unwrap().windows(CANARY.len()).any(|w| w == CANARY.as_bytes()));

        let miss = prober.probe(&probe_url("r")).await;
        assert!(miss.is_success());
        assert!(!miss.body().unwrap().windows(CANARY.len()).any(|w| w == CANARY.as_bytes()));

        assert_eq!(prober.probe_count(), 2);
        assert_eq!(prober.history()[0], probe_url("q"));
    }

    #[tokio::test]
    async fn test_rate_limit_budget_runs_out() {
        let prober = MockProber::new().with_rate_limited_first(2);

        assert!(prober.probe(&probe_url("q")).await.is_rate_limited());
        assert!(prober.probe(&probe_url("q")).await.is_rate_limited());
        assert!(prober.probe(&probe_url("q")).await.is_success());
    }

    #[tokio::test]
    async fn test_always_rate_limited_toggle() {
        let prober = MockProber::new();

        prober.set_always_rate_limited(true);
        assert!(prober.probe(&probe_url("q")).await.is_rate_limited());

        prober.set_always_rate_limited(false);
        assert!(prober.probe(&probe_url("q")).await.is_success());
    }

    #[tokio::test]
    async fn test_failing_param() {
        let prober = MockProber::new().with_failing_param("q");

        assert!(prober.probe(&probe_url("q")).await.is_transport_error());
        assert!(prober.probe(&probe_url("r")).await.is_success());
    }
}
