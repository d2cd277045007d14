//! Audit event types and emission functions.

use crate::core::{Finding, ScanSummary};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base trait for audit events.
pub trait AuditEvent: Serialize {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the timestamp of the event.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Audit event for a detected reflection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindingAuditEvent {
    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Placeholder-bearing URL.
    pub url: String,

    /// Reflecting parameter.
    pub parameter: String,

    /// Host of the target, if the URL has one.
    pub host: Option<String>,
}

impl From<&Finding> for FindingAuditEvent {
    fn from(finding: &Finding) -> Self {
        Self {
            timestamp: finding.detected_at,
            url: finding.url.clone(),
            parameter: finding.parameter.clone(),
            host: url::Url::parse(finding.job.as_str())
                .ok()
                .and_then(|u| u.host_str().map(str::to_string)),
        }
    }
}

impl AuditEvent for FindingAuditEvent {
    fn event_type(&self) -> &'static str {
        "reflection_found"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Emits an audit event for a detected reflection.
pub fn emit_finding(finding: &Finding) {
    let event = FindingAuditEvent::from(finding);
    tracing::info!(
        target: "reflex::audit",
        event_type = event.event_type(),
        url = %event.url,
        parameter = %event.parameter,
        host = ?event.host,
        "Reflection found"
    );
}

/// Emits the operator notice for a breaker pause.
pub fn emit_breaker_paused(consecutive: u32, threshold: u32, cooldown: Duration) {
    tracing::warn!(
        target: "reflex::audit",
        event_type = "breaker_paused",
        consecutive = consecutive,
        threshold = threshold,
        cooldown_secs = cooldown.as_secs_f64(),
        "High 403 rate detected ({} consecutive), pausing all workers for {:?}",
        consecutive,
        cooldown
    );
}

/// Emits the operator notice for a breaker resume.
pub fn emit_breaker_resumed(paused_for: Duration) {
    tracing::info!(
        target: "reflex::audit",
        event_type = "breaker_resumed",
        paused_ms = paused_for.as_millis() as u64,
        "Resuming operations"
    );
}

/// Emits an audit event for a scan starting.
pub fn emit_scan_started(workers: usize, queue_capacity: usize, prober: &str) {
    tracing::info!(
        target: "reflex::audit",
        event_type = "scan_started",
        workers = workers,
        queue_capacity = queue_capacity,
        prober = %prober,
        "Scan started"
    );
}

/// Emits an audit event for a completed scan.
pub fn emit_scan_completed(summary: &ScanSummary) {
    tracing::info!(
        target: "reflex::audit",
        event_type = "scan_completed",
        scan_id = %summary.id,
        jobs_submitted = summary.jobs_submitted,
        jobs_skipped = summary.jobs_skipped,
        probes_sent = summary.probes_sent,
        rate_limited = summary.rate_limited,
        transport_errors = summary.transport_errors,
        requeues_scheduled = summary.requeues_scheduled,
        requeues_delivered = summary.requeues_delivered,
        times_paused = summary.times_paused,
        findings = summary.findings,
        duration_ms = summary.elapsed.as_millis() as u64,
        "Scan completed"
    );
}
