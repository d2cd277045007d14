//! Scan summary structures.
//!
//! A [`ScanSummary`] is produced once per run by the scan manager from the
//! shared [`ScanStats`] counters the workers update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters shared by every worker during a run.
#[derive(Debug, Default)]
pub struct ScanStats {
    jobs_submitted: AtomicU64,
    jobs_skipped: AtomicU64,
    requeues_scheduled: AtomicU64,
    requeues_delivered: AtomicU64,
    probes_sent: AtomicU64,
    rate_limited: AtomicU64,
    transport_errors: AtomicU64,
    findings: AtomicU64,
}

impl ScanStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_submitted(&self) {
        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped(&self) {
        self.jobs_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_requeue_scheduled(&self) {
        self.requeues_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_requeue_delivered(&self) {
        self.requeues_delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_probe(&self) {
        self.probes_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transport_error(&self) {
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_finding(&self) {
        self.findings.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of findings recorded so far.
    pub fn findings(&self) -> u64 {
        self.findings.load(Ordering::Relaxed)
    }

    /// Returns the number of probes sent so far.
    pub fn probes_sent(&self) -> u64 {
        self.probes_sent.load(Ordering::Relaxed)
    }
}

/// Totals for a finished scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Unique identifier for this run.
    pub id: String,

    /// Jobs read from the job source.
    pub jobs_submitted: u64,

    /// Jobs dropped for an unparseable URL or no query parameters.
    pub jobs_skipped: u64,

    /// Requeues scheduled after a 403.
    pub requeues_scheduled: u64,

    /// Requeues that made it back onto the queue.
    pub requeues_delivered: u64,

    /// Probe requests issued.
    pub probes_sent: u64,

    /// Probes answered with 403.
    pub rate_limited: u64,

    /// Probes that failed in transport.
    pub transport_errors: u64,

    /// Reflections reported.
    pub findings: u64,

    /// Times the circuit breaker paused the pool.
    pub times_paused: u64,

    /// When the scan started.
    pub started_at: DateTime<Utc>,

    /// When the scan completed.
    pub completed_at: DateTime<Utc>,

    /// Wall-clock duration of the run.
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
}

impl ScanSummary {
    /// Builds a summary from the shared counters.
    pub fn from_stats(stats: &ScanStats, times_paused: u64, started_at: DateTime<Utc>) -> Self {
        let completed_at = Utc::now();
        let elapsed = (completed_at - started_at).to_std().unwrap_or_default();

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            jobs_submitted: stats.jobs_submitted.load(Ordering::Relaxed),
            jobs_skipped: stats.jobs_skipped.load(Ordering::Relaxed),
            requeues_scheduled: stats.requeues_scheduled.load(Ordering::Relaxed),
            requeues_delivered: stats.requeues_delivered.load(Ordering::Relaxed),
            probes_sent: stats.probes_sent.load(Ordering::Relaxed),
            rate_limited: stats.rate_limited.load(Ordering::Relaxed),
            transport_errors: stats.transport_errors.load(Ordering::Relaxed),
            findings: stats.findings.load(Ordering::Relaxed),
            times_paused,
            started_at,
            completed_at,
            elapsed,
        }
    }

    /// Returns `true` if at least one reflection was reported.
    pub fn has_findings(&self) -> bool {
        self.findings > 0
    }
}

/// Serde helper for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
