//! Error types for the reflex library.
//!
//! Most failures inside a scan are recovered locally (a dropped job, a
//! skipped probe), so these errors mostly surface in logs. Only startup
//! failures are returned all the way to the caller.

use std::time::Duration;
use thiserror::Error;

/// The main error type for probe and scan operations.
#[derive(Debug, Error)]
pub enum ReflexError {
    /// The input line could not be parsed as a URL.
    #[error("invalid url '{input}': {reason}")]
    InvalidUrl {
        /// The raw input that failed to parse.
        input: String,
        /// Parser message.
        reason: String,
    },

    /// The request could not be completed.
    #[error("request to '{url}' failed: {message}")]
    Transport {
        /// The probe URL.
        url: String,
        /// Error message describing the failure.
        message: String,
    },

    /// The request did not finish within the configured timeout.
    #[error("request to '{url}' timed out after {timeout:?}")]
    Timeout {
        /// The probe URL.
        url: String,
        /// The configured request timeout.
        timeout: Duration,
    },

    /// A header supplied by the caller is not usable.
    #[error("invalid header '{raw}': {reason}")]
    InvalidHeader {
        /// The raw `Name: Value` string.
        raw: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The job source could not be opened.
    #[error("input unavailable: {reason}")]
    InputUnavailable {
        /// Human-readable reason.
        reason: String,
    },

    /// Writing a finding to the result sink failed.
    #[error("failed to write finding to {destination}: {reason}")]
    Sink {
        /// The sink destination (path or name).
        destination: String,
        /// Reason for the failure.
        reason: String,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },

    /// An internal error occurred.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl ReflexError {
    /// Returns `true` if the error belongs to a single probe and never
    /// stops the scan.
    pub fn is_probe_local(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Timeout { .. } | Self::InvalidUrl { .. }
        )
    }

    /// Returns `true` if the error prevents a scan from starting.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InputUnavailable { .. } | Self::Configuration { .. }
        )
    }

    /// Creates an `InvalidUrl` error.
    pub fn invalid_url(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Transport` error.
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a `Timeout` error.
    pub fn timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            timeout,
        }
    }

    /// Creates an `InvalidHeader` error.
    pub fn invalid_header(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHeader {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `InputUnavailable` error.
    pub fn input_unavailable(reason: impl Into<String>) -> Self {
        Self::InputUnavailable {
            reason: reason.into(),
        }
    }

    /// Creates a `Sink` error.
    pub fn sink(destination: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Sink {
            destination: destination.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// A specialized `Result` type for reflex operations.
pub type ReflexResult<T> = Result<T, ReflexError>;
