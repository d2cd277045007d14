//! Core traits for the reflex library.
//!
//! This module defines the `Prober` trait that every probe backend
//! implements. The worker pool only ever talks to this trait, so the HTTP
//! client can be swapped for a scripted backend in tests.

use crate::core::types::ProbeOutcome;

use async_trait::async_trait;
use std::fmt::Debug;

/// Issues a single probe request and classifies the response.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync`; one instance is shared by all
///   workers.
/// - `probe` never fails: anything that prevents a response from being
///   read is reported as [`ProbeOutcome::TransportError`].
/// - A final status of 403 must map to [`ProbeOutcome::RateLimited`];
///   every other status maps to [`ProbeOutcome::Success`].
///
/// # Example Implementation
///
/// ```rust,ignore
/// use reflex::core::{Prober, ProbeOutcome};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct AlwaysEmpty;
///
/// #[async_trait]
/// impl Prober for AlwaysEmpty {
///     fn name(&self) -> &str {
///         "always-empty"
///     }
///
///     async fn probe(&self, _url: &str) -> ProbeOutcome {
///         ProbeOutcome::success(200, Vec::new())
///     }
/// }
/// ```
#[async_trait]
pub trait Prober: Send + Sync + Debug {
    /// Returns a stable, human-readable name for logs.
    fn name(&self) -> &str;

    /// Sends one GET request for `url` and classifies the outcome.
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// A boxed prober for type-erased storage.
pub type BoxedProber = Box<dyn Prober>;

/// An arc-wrapped prober for shared ownership.
pub type ArcProber = std::sync::Arc<dyn Prober>;
