//! Stdout sink.

use crate::core::{Finding, ReflexError};
use crate::sink::traits::{ArcSink, FindingSink};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// Prints each finding URL to stdout, then hands it to an optional inner
/// sink.
///
/// Logs go to stderr, so stdout carries nothing but findings and can be
/// piped straight into another tool.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    inner: Option<ArcSink>,
}

impl ConsoleSink {
    /// Creates a sink that only prints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forwards every finding to `inner` after printing it.
    pub fn with_inner(mut self, inner: ArcSink) -> Self {
        self.inner = Some(inner);
        self
    }
}

#[async_trait]
impl FindingSink for ConsoleSink {
    fn destination(&self) -> &str {
        "stdout"
    }

    async fn record(&self, finding: &Finding) -> Result<(), ReflexError> {
        let mut line = finding.url.clone();
        line.push('\n');

        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ReflexError::sink("stdout", e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| ReflexError::sink("stdout", e.to_string()))?;

        match &self.inner {
            Some(inner) => inner.record(finding).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Job;
    use crate::sink::MemorySink;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_forwards_to_inner() {
        let memory = Arc::new(MemorySink::new());
        let sink = ConsoleSink::new().with_inner(Arc::clone(&memory) as ArcSink);

        let finding = Finding::new("http://t/x?q={payload}", "q", Job::from("http://t/x?q=1"));
        sink.record(&finding).await.unwrap();

        assert_eq!(memory.urls(), vec!["http://t/x?q={payload}"]);
        assert_eq!(sink.destination(), "stdout");
    }
}
