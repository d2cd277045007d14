//! Core types and traits for the reflex library.
//!
//! - [`types`] - `Job`, `ProbeOutcome`, `Finding` and the canary constants
//! - [`traits`] - The `Prober` trait
//! - [`error`] - Structured error types
//! - [`result`] - Run counters and the final scan summary

pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{ReflexError, ReflexResult};
pub use result::{ScanStats, ScanSummary};
pub use traits::{ArcProber, BoxedProber, Prober};
pub use types::{Finding, Job, ProbeOutcome, CANARY, PAYLOAD_PLACEHOLDER};
