//! Result sink trait definition.

use crate::core::{Finding, ReflexError};

use async_trait::async_trait;
use std::fmt::Debug;

/// Destination for findings.
///
/// The scan manager drains findings through a single writer task, so
/// implementations see one `record` call at a time, but they must still
/// be `Send + Sync` to be shared.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use reflex::sink::FindingSink;
/// use reflex::core::{Finding, ReflexError};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct StdoutSink;
///
/// #[async_trait]
/// impl FindingSink for StdoutSink {
///     fn destination(&self) -> &str {
///         "stdout"
///     }
///
///     async fn record(&self, finding: &Finding) -> Result<(), ReflexError> {
///         println!("{}", finding.url);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait FindingSink: Send + Sync + Debug {
    /// Human-readable destination, used in error messages.
    fn destination(&self) -> &str;

    /// Persists one finding.
    ///
    /// # Errors
    ///
    /// Returns [`ReflexError::Sink`] if the finding could not be written.
    /// The scan logs the error and continues.
    async fn record(&self, finding: &Finding) -> Result<(), ReflexError>;
}

/// An arc-wrapped sink for shared ownership.
pub type ArcSink = std::sync::Arc<dyn FindingSink>;
