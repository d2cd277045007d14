//! In-memory sink.

use crate::core::{Finding, ReflexError};
use crate::sink::traits::FindingSink;

use async_trait::async_trait;
use std::sync::RwLock;

/// Keeps findings in memory, for tests and for embedding the scanner.
#[derive(Debug, Default)]
pub struct MemorySink {
    findings: RwLock<Vec<Finding>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every finding recorded so far.
    pub fn findings(&self) -> Vec<Finding> {
        self.findings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns the recorded finding URLs.
    pub fn urls(&self) -> Vec<String> {
        self.findings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|f| f.url.clone())
            .collect()
    }

    /// Returns the number of recorded findings.
    pub fn len(&self) -> usize {
        self.findings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FindingSink for MemorySink {
    fn destination(&self) -> &str {
        "memory"
    }

    async fn record(&self, finding: &Finding) -> Result<(), ReflexError> {
        self.findings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(finding.clone());
        Ok(())
    }
}
