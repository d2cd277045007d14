//! Prober implementations.
//!
//! ## Available Backends
//!
//! - [`http`] - Real HTTP(S) probes via reqwest
//! - [`mock`] - A scriptable prober for testing
//!
//! ## Implementing a Custom Backend
//!
//! ```rust,ignore
//! use reflex::core::{Prober, ProbeOutcome};
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! pub struct CachedProber {
//!     // ...
//! }
//!
//! #[async_trait]
//! impl Prober for CachedProber {
//!     fn name(&self) -> &str {
//!         "cached"
//!     }
//!
//!     async fn probe(&self, url: &str) -> ProbeOutcome {
//!         todo!()
//!     }
//! }
//! ```

pub mod http;
pub mod mock;

pub use http::{parse_header, HttpProber, HttpProberConfig, DEFAULT_USER_AGENT};
pub use mock::MockProber;
