//! The scan manager: worker pool, queue and result writer.

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::core::{ArcProber, Finding, Prober, ReflexError, ScanStats, ScanSummary};
use crate::inject::{MarkerInjector, ReflectionDetector};
use crate::manager::queue::JobQueue;
use crate::manager::retry::RequeueConfig;
use crate::manager::worker::Worker;
use crate::sink::{ArcSink, FindingSink};
use crate::source::JobSource;

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Configuration for the scan manager.
#[derive(Debug, Clone)]
pub struct ScanManagerConfig {
    /// Number of concurrent workers.
    pub workers: usize,

    /// Capacity of the job channel. Submitting blocks while it is full.
    pub queue_capacity: usize,

    /// Delay applied before a rate-limited URL is re-queued.
    pub requeue: RequeueConfig,

    /// Circuit breaker settings.
    pub breaker: CircuitBreakerConfig,
}

impl Default for ScanManagerConfig {
    fn default() -> Self {
        Self {
            workers: 20,
            queue_capacity: 1000,
            requeue: RequeueConfig::default(),
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl ScanManagerConfig {
    /// Creates a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the job channel capacity (at least 1).
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Sets the requeue configuration.
    pub fn with_requeue(mut self, requeue: RequeueConfig) -> Self {
        self.requeue = requeue;
        self
    }

    /// Sets the circuit breaker configuration.
    pub fn with_breaker(mut self, breaker: CircuitBreakerConfig) -> Self {
        self.breaker = breaker;
        self
    }
}

/// Builder for creating a `ScanManager`.
pub struct ScanManagerBuilder {
    prober: Option<ArcProber>,
    sink: Option<ArcSink>,
    config: ScanManagerConfig,
    canary: Option<String>,
}

impl ScanManagerBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            prober: None,
            sink: None,
            config: ScanManagerConfig::default(),
            canary: None,
        }
    }

    /// Sets the prober.
    pub fn with_prober<P: Prober + 'static>(mut self, prober: P) -> Self {
        self.prober = Some(Arc::new(prober));
        self
    }

    /// Sets a prober wrapped in an Arc.
    pub fn with_arc_prober(mut self, prober: ArcProber) -> Self {
        self.prober = Some(prober);
        self
    }

    /// Sets the finding sink. Without one, findings are only logged.
    pub fn with_sink<S: FindingSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Sets a sink wrapped in an Arc.
    pub fn with_arc_sink(mut self, sink: ArcSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: ScanManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the canary string.
    pub fn with_canary(mut self, canary: impl Into<String>) -> Self {
        self.canary = Some(canary.into());
        self
    }

    /// Builds the scan manager.
    pub fn build(self) -> Result<ScanManager, ReflexError> {
        let Some(prober) = self.prober else {
            return Err(ReflexError::configuration("A prober is required"));
        };
        if self.config.workers == 0 {
            return Err(ReflexError::configuration("At least one worker is required"));
        }

        let (injector, detector) = match self.canary {
            Some(canary) => (
                MarkerInjector::new().with_canary(canary.clone()),
                ReflectionDetector::new().with_canary(canary),
            ),
            None => (MarkerInjector::new(), ReflectionDetector::new()),
        };

        Ok(ScanManager {
            breaker: Arc::new(CircuitBreaker::new(self.config.breaker.clone())),
            prober,
            sink: self.sink,
            injector,
            detector,
            config: self.config,
        })
    }
}

impl Default for ScanManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a scan: feeds jobs to a pool of workers that share one prober and
/// one circuit breaker, and funnels findings to a single writer.
pub struct ScanManager {
    prober: ArcProber,
    sink: Option<ArcSink>,
    breaker: Arc<CircuitBreaker>,
    injector: MarkerInjector,
    detector: ReflectionDetector,
    config: ScanManagerConfig,
}

impl ScanManager {
    /// Creates a new builder.
    pub fn builder() -> ScanManagerBuilder {
        ScanManagerBuilder::new()
    }

    /// Scans every URL the source yields and returns once all work,
    /// including pending re-queues, has finished and every finding has
    /// reached the sink.
    ///
    /// A source error ends the input early; work already submitted still
    /// completes.
    ///
    /// # Errors
    ///
    /// Returns [`ReflexError::Internal`] if a worker task panics.
    pub async fn run<S: JobSource>(&self, mut source: S) -> Result<ScanSummary, ReflexError> {
        let started_at = Utc::now();
        let paused_before = self.breaker.metrics().times_paused;

        let stats = Arc::new(ScanStats::new());
        let queue = Arc::new(JobQueue::new(self.config.queue_capacity, Arc::clone(&stats)));

        // Unbuffered hand-off: a worker waits until the writer takes its finding.
        let (results_tx, results_rx) = mpsc::channel::<Finding>(1);
        let writer = tokio::spawn(write_findings(self.sink.clone(), results_rx));

        crate::audit::emit_scan_started(
            self.config.workers,
            self.config.queue_capacity,
            self.prober.name(),
        );

        let handles: Vec<_> = (0..self.config.workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    queue: Arc::clone(&queue),
                    prober: Arc::clone(&self.prober),
                    breaker: Arc::clone(&self.breaker),
                    injector: self.injector.clone(),
                    detector: self.detector.clone(),
                    requeue: self.config.requeue.clone(),
                    results: results_tx.clone(),
                    stats: Arc::clone(&stats),
                };
                tokio::spawn(worker.run())
            })
            .collect();
        drop(results_tx);

        loop {
            match source.next_job().await {
                Ok(Some(job)) => {
                    if let Err(e) = queue.submit(job).await {
                        tracing::error!(error = %e, "Queue refused a job, stopping input");
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Input ended with an error, finishing submitted work");
                    break;
                }
            }
        }
        queue.close_input();
        tracing::debug!(
            outstanding = queue.outstanding(),
            "Input exhausted, waiting for workers"
        );

        let mut panicked = 0usize;
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Worker task failed");
                panicked += 1;
            }
        }

        if let Err(e) = writer.await {
            tracing::error!(error = %e, "Result writer task failed");
            panicked += 1;
        }

        if panicked > 0 {
            return Err(ReflexError::internal(format!(
                "{} scan task(s) terminated abnormally",
                panicked
            )));
        }

        let times_paused = self
            .breaker
            .metrics()
            .times_paused
            .saturating_sub(paused_before);
        let summary = ScanSummary::from_stats(&stats, times_paused, started_at);

        tracing::debug!(
            scan_id = %summary.id,
            probes = summary.probes_sent,
            findings = summary.findings,
            "All workers finished"
        );
        crate::audit::emit_scan_completed(&summary);

        Ok(summary)
    }

    /// Returns the shared circuit breaker.
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &ScanManagerConfig {
        &self.config
    }

    /// Returns the prober.
    pub fn prober(&self) -> &ArcProber {
        &self.prober
    }
}

impl std::fmt::Debug for ScanManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanManager")
            .field("prober", &self.prober.name())
            .field("sink", &self.sink.as_ref().map(|s| s.destination().to_string()))
            .field("config", &self.config)
            .finish()
    }
}

async fn write_findings(sink: Option<ArcSink>, mut results: mpsc::Receiver<Finding>) {
    while let Some(finding) = results.recv().await {
        let Some(sink) = sink.as_ref() else {
            continue;
        };
        if let Err(e) = sink.record(&finding).await {
            tracing::warn!(
                destination = sink.destination(),
                url = %finding.url,
                error = %e,
                "Failed to write finding"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockProber;
    use crate::sink::MemorySink;
    use crate::source::StaticSource;
    use std::time::Duration;

    fn fast_config() -> ScanManagerConfig {
        ScanManagerConfig::default()
            .with_workers(4)
            .with_requeue(RequeueConfig::new().with_max_jitter(Duration::from_millis(20)))
    }

    fn manager(prober: Arc<MockProber>, sink: Arc<MemorySink>, config: ScanManagerConfig) -> ScanManager {
        ScanManager::builder()
            .with_arc_prober(prober)
            .with_arc_sink(sink)
            .with_config(config)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_reflecting_parameter_is_reported() {
        let prober = Arc::new(MockProber::new().with_reflecting_param("q"));
        let sink = Arc::new(MemorySink::new());
        let manager = manager(Arc::clone(&prober), Arc::clone(&sink), fast_config());

        let summary = manager
            .run(StaticSource::new(["http://t/s?q=1&r=2"]))
            .await
            .unwrap();

        assert_eq!(sink.urls(), vec!["http://t/s?q={payload}&r=2"]);
        assert_eq!(summary.findings, 1);
        assert_eq!(summary.probes_sent, 2);
        assert_eq!(prober.probe_count(), 2);
        assert!(summary.has_findings());
    }

    #[tokio::test]
    async fn test_no_query_means_no_probe() {
        let prober = Arc::new(MockProber::new().with_reflecting_param("q"));
        let sink = Arc::new(MemorySink::new());
        let manager = manager(Arc::clone(&prober), Arc::clone(&sink), fast_config());

        let summary = manager
            .run(StaticSource::new(["http://t/plain", "::not a url::"]))
            .await
            .unwrap();

        assert_eq!(prober.probe_count(), 0);
        assert!(sink.is_empty());
        assert_eq!(summary.jobs_submitted, 2);
        assert_eq!(summary.jobs_skipped, 2);
    }

    #[tokio::test]
    async fn test_rate_limited_url_is_requeued_and_retried() {
        let prober = Arc::new(
            MockProber::new()
                .with_reflecting_param("q")
                .with_rate_limited_first(1),
        );
        let sink = Arc::new(MemorySink::new());
        let manager = manager(
            Arc::clone(&prober),
            Arc::clone(&sink),
            fast_config().with_workers(1),
        );

        let summary = manager
            .run(StaticSource::new(["http://t/s?q=1"]))
            .await
            .unwrap();

        assert_eq!(summary.rate_limited, 1);
        assert_eq!(summary.requeues_scheduled, 1);
        assert_eq!(summary.requeues_delivered, 1);
        assert_eq!(prober.probe_count(), 2);
        assert_eq!(sink.urls(), vec!["http://t/s?q={payload}"]);
        assert_eq!(manager.breaker().consecutive_errors(), 0);
    }

    #[tokio::test]
    async fn test_breaker_pauses_then_resumes() {
        let prober = Arc::new(
            MockProber::new()
                .with_reflecting_param("q")
                .with_rate_limited_first(3),
        );
        let sink = Arc::new(MemorySink::new());
        let config = fast_config().with_workers(3).with_breaker(
            CircuitBreakerConfig::new()
                .with_failure_threshold(3)
                .with_cooldown(Duration::from_millis(200)),
        );
        let manager = manager(Arc::clone(&prober), Arc::clone(&sink), config);

        let started = std::time::Instant::now();
        let summary = manager
            .run(StaticSource::new([
                "http://t/a?q=1",
                "http://t/b?q=1",
                "http://t/c?q=1",
            ]))
            .await
            .unwrap();

        assert_eq!(summary.times_paused, 1);
        assert_eq!(summary.rate_limited, 3);
        assert_eq!(summary.requeues_delivered, 3);
        assert_eq!(sink.len(), 3);
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(manager.breaker().state().is_running());
        assert_eq!(manager.breaker().consecutive_errors(), 0);
    }

    #[tokio::test]
    async fn test_transport_errors_do_not_stop_the_scan() {
        let prober = Arc::new(
            MockProber::new()
                .with_reflecting_param("q")
                .with_failing_param("r"),
        );
        let sink = Arc::new(MemorySink::new());
        let manager = manager(Arc::clone(&prober), Arc::clone(&sink), fast_config());

        let summary = manager
            .run(StaticSource::new(["http://t/s?q=1&r=2"]))
            .await
            .unwrap();

        assert_eq!(summary.transport_errors, 1);
        assert_eq!(summary.findings, 1);
        assert_eq!(manager.breaker().consecutive_errors(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_urls_every_finding_written_once() {
        let prober = Arc::new(
            MockProber::new()
                .with_reflecting_param("q")
                .with_latency(Duration::from_millis(1)),
        );
        let sink = Arc::new(MemorySink::new());
        let config = fast_config().with_workers(8).with_queue_capacity(4);
        let manager = manager(Arc::clone(&prober), Arc::clone(&sink), config);

        let urls: Vec<String> = (0..50).map(|i| format!("http://t/p{}?q={}&r=x", i, i)).collect();
        let summary = manager.run(StaticSource::new(urls)).await.unwrap();

        assert_eq!(summary.probes_sent, 100);
        assert_eq!(sink.len(), 50);

        let mut urls = sink.urls();
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), 50);
        assert!(urls.iter().all(|u| u.contains("q={payload}&r=x")));
    }

    #[tokio::test]
    async fn test_runs_without_sink() {
        let manager = ScanManager::builder()
            .with_prober(MockProber::new().with_reflecting_param("q"))
            .build()
            .unwrap();

        let summary = manager
            .run(StaticSource::new(["http://t/s?q=1"]))
            .await
            .unwrap();
        assert_eq!(summary.findings, 1);
    }

    #[tokio::test]
    async fn test_custom_canary() {
        let sink = Arc::new(MemorySink::new());
        let manager = ScanManager::builder()
            .with_prober(MockProber::new().with_reflecting_param("q"))
            .with_arc_sink(Arc::clone(&sink) as ArcSink)
            .with_canary("SomethingElse")
            .build()
            .unwrap();

        // The mock only recognizes the default canary, so nothing is injected
        // where it looks.
        let summary = manager
            .run(StaticSource::new(["http://t/s?q=1"]))
            .await
            .unwrap();
        assert_eq!(summary.probes_sent, 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_builder_requires_prober() {
        let result = ScanManager::builder().build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_zero_workers() {
        let result = ScanManager::builder()
            .with_prober(MockProber::new())
            .with_config(ScanManagerConfig::default().with_workers(0))
            .build();
        assert!(matches!(result, Err(ReflexError::Configuration { .. })));
    }
}
