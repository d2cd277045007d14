//! A single pool worker.

use crate::circuit_breaker::CircuitBreaker;
use crate::core::{ArcProber, Finding, Job, ProbeOutcome, ScanStats};
use crate::inject::{MarkerInjector, ReflectionDetector};
use crate::manager::queue::JobQueue;
use crate::manager::retry::RequeueConfig;

use std::sync::Arc;
use tokio::sync::mpsc;

/// Pulls jobs off the shared queue until it drains.
#[derive(Debug)]
pub(crate) struct Worker {
    pub(crate) id: usize,
    pub(crate) queue: Arc<JobQueue>,
    pub(crate) prober: ArcProber,
    pub(crate) breaker: Arc<CircuitBreaker>,
    pub(crate) injector: MarkerInjector,
    pub(crate) detector: ReflectionDetector,
    pub(crate) requeue: RequeueConfig,
    pub(crate) results: mpsc::Sender<Finding>,
    pub(crate) stats: Arc<ScanStats>,
}

impl Worker {
    pub(crate) async fn run(self) {
        tracing::trace!(worker = self.id, "Worker started");

        while let Some(job) = self.queue.next().await {
            self.process(&job).await;
            self.queue.complete();
        }

        tracing::trace!(worker = self.id, "Worker exiting, queue drained");
    }

    async fn process(&self, job: &Job) {
        let (target, probes) = match self.injector.inject(job.as_str()) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(worker = self.id, error = %e, "Skipping malformed url");
                self.stats.record_skipped();
                return;
            }
        };

        if probes.is_empty() {
            tracing::trace!(worker = self.id, url = %job, "No query parameters, skipping");
            self.stats.record_skipped();
            return;
        }

        for probe in &probes {
            self.breaker.await_running().await;

            self.stats.record_probe();
            match self.prober.probe(&probe.url).await {
                ProbeOutcome::Success { status, body } => {
                    self.breaker.report_success();
                    tracing::trace!(
                        worker = self.id,
                        url = %probe.url,
                        status = status,
                        body_len = body.len(),
                        "Probe answered"
                    );

                    if let Some(finding) = self.detector.inspect(job, &target, probe, &body) {
                        self.report(finding).await;
                    }
                }

                ProbeOutcome::RateLimited => {
                    self.stats.record_rate_limited();
                    if self.breaker.report_rate_limited() {
                        self.breaker.spawn_cooldown();
                    }

                    let delay = self.requeue.next_delay();
                    tracing::debug!(
                        worker = self.id,
                        url = %job,
                        parameter = %probe.parameter,
                        delay_ms = delay.as_millis() as u64,
                        "Rate limited, requeueing original url"
                    );
                    self.queue.requeue_after(job.clone(), delay);
                }

                ProbeOutcome::TransportError(e) => {
                    self.stats.record_transport_error();
                    if e.is_probe_local() {
                        tracing::debug!(
                            worker = self.id,
                            prober = self.prober.name(),
                            error = %e,
                            "Probe failed"
                        );
                    } else {
                        tracing::warn!(
                            worker = self.id,
                            prober = self.prober.name(),
                            error = %e,
                            "Prober returned an unexpected error"
                        );
                    }
                }
            }
        }
    }

    async fn report(&self, finding: Finding) {
        self.stats.record_finding();
        crate::audit::emit_finding(&finding);

        if let Err(mpsc::error::SendError(finding)) = self.results.send(finding).await {
            tracing::warn!(url = %finding.url, "Result sink closed, finding not written");
        }
    }
}
