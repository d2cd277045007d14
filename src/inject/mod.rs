//! Canary injection and reflection detection.
//!
//! A job URL is decomposed into a [`ParsedTarget`]; the
//! [`MarkerInjector`] turns it into one [`CandidateProbe`] per query
//! parameter; the [`ReflectionDetector`] checks each successful response
//! for the canary and builds the redacted finding.
//!
//! ```rust
//! use reflex::inject::{MarkerInjector, ReflectionDetector};
//! use reflex::core::Job;
//!
//! let job = Job::from("http://t/x?q=1&r=2");
//! let (target, probes) = MarkerInjector::new().inject(job.as_str()).unwrap();
//! assert_eq!(probes.len(), 2);
//!
//! let body = b"echo: ReflectCheckXSS";
//! let finding = ReflectionDetector::new()
//!     .inspect(&job, &target, &probes[0], body)
//!     .unwrap();
//! assert_eq!(finding.url, "http://t/x?q={payload}&r=2");
//! ```

mod injector;
mod reflection;
mod target;

pub use injector::{CandidateProbe, MarkerInjector};
pub use reflection::ReflectionDetector;
pub use target::{Parameter, ParsedTarget};
