//! # Reflex
//!
//! A concurrent probe for reflected query parameters, with a global circuit
//! breaker that backs off when the target starts answering `403`.
//!
//! ## Overview
//!
//! For every URL with a query string, each parameter in turn is replaced by
//! a canary string and the page is fetched. When the canary shows up in the
//! response body, the URL is reported with `{payload}` in that parameter's
//! place, ready to be fed to a payload tool.
//!
//! - Jobs are processed by a fixed pool of workers sharing one HTTP client
//! - Ten consecutive `403` answers pause every worker for a cooldown
//! - A URL that drew a `403` is re-queued after a random delay and the scan
//!   does not finish until that re-queue has been processed
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reflex::backends::{HttpProber, HttpProberConfig};
//! use reflex::sink::FileSink;
//! use reflex::source::LineSource;
//! use reflex::ScanManager;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let prober = HttpProber::new(HttpProberConfig::default())?;
//!     let sink = FileSink::open("reflections.txt").await?;
//!
//!     let manager = ScanManager::builder()
//!         .with_prober(prober)
//!         .with_sink(sink)
//!         .build()?;
//!
//!     let summary = manager.run(LineSource::open("urls.txt").await?).await?;
//!     println!("{} reflections", summary.findings);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Core**: Jobs, outcomes, findings, the `Prober` trait and errors
//! - **Inject**: Query parsing, canary injection and reflection detection
//! - **Backends**: HTTP and mock probers
//! - **Circuit Breaker**: The global pause gate
//! - **Manager**: Work queue, re-queue scheduling and the worker pool
//! - **Source / Sink**: Where URLs come from and where findings go
//! - **Audit**: Structured events for findings and breaker transitions

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod audit;
pub mod backends;
pub mod circuit_breaker;
pub mod core;
pub mod inject;
pub mod manager;
pub mod sink;
pub mod source;

// Re-export commonly used types at the crate root
pub use crate::core::{
    Finding, Job, ProbeOutcome, Prober, ReflexError, ReflexResult, ScanSummary, CANARY,
    PAYLOAD_PLACEHOLDER,
};

pub use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
pub use crate::manager::{ScanManager, ScanManagerConfig};

/// Prelude module for convenient imports.
///
/// ```rust
/// use reflex::prelude::*;
/// ```
pub mod prelude {
    pub use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
    pub use crate::core::{
        Finding, Job, ProbeOutcome, Prober, ReflexError, ReflexResult, ScanSummary, CANARY,
        PAYLOAD_PLACEHOLDER,
    };
    pub use crate::inject::{MarkerInjector, ReflectionDetector};
    pub use crate::manager::{RequeueConfig, ScanManager, ScanManagerConfig};
    pub use crate::sink::{FileSink, FindingSink, MemorySink};
    pub use crate::source::{JobSource, LineSource, StaticSource};
}
