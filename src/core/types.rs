//! Core types used throughout the reflex library.
//!
//! This module defines the job that flows through the queue, the outcome
//! of a single probe, and the finding written to the result sink.

use crate::core::error::ReflexError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value injected into a parameter to detect unescaped reflection.
pub const CANARY: &str = "ReflectCheckXSS";

/// Marker written in place of the canary in a reported finding.
pub const PAYLOAD_PLACEHOLDER: &str = "{payload}";

/// A URL waiting to be probed.
///
/// A job is an opaque string. Requeued jobs are copies of the original
/// text; no retry count or provenance travels with them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Job(String);

impl Job {
    /// Creates a job from a raw URL string.
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Returns the URL as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the job and returns the URL.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for Job {
    fn from(url: String) -> Self {
        Self(url)
    }
}

impl From<&str> for Job {
    fn from(url: &str) -> Self {
        Self(url.to_string())
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The classified result of one probe request.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// The server answered with something other than 403.
    Success {
        /// Final HTTP status after redirects.
        status: u16,
        /// The complete response body.
        body: Vec<u8>,
    },

    /// The server answered 403.
    RateLimited,

    /// The request could not be completed.
    TransportError(ReflexError),
}

impl ProbeOutcome {
    /// Creates a `Success` outcome.
    pub fn success(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::Success {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for a `Success` outcome.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns `true` for a `RateLimited` outcome.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    /// Returns `true` for a `TransportError` outcome.
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::TransportError(_))
    }

    /// Returns the body if the outcome is a success.
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            Self::Success { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::RateLimited => "rate_limited",
            Self::TransportError(_) => "transport_error",
        }
    }
}

/// A detected reflection, redacted for sharing.
///
/// `url` is the originating job with the vulnerable parameter's value set
/// to [`PAYLOAD_PLACEHOLDER`]; the canary itself never appears in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Placeholder-bearing URL.
    pub url: String,

    /// Name of the reflecting parameter.
    pub parameter: String,

    /// The job the probe was derived from.
    pub job: Job,

    /// When the reflection was observed.
    pub detected_at: DateTime<Utc>,
}

impl Finding {
    /// Creates a new finding.
    pub fn new(url: impl Into<String>, parameter: impl Into<String>, job: Job) -> Self {
        Self {
            url: url.into(),
            parameter: parameter.into(),
            job,
            detected_at: Utc::now(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
