//! Append-only file sink.

use crate::core::{Finding, ReflexError};
use crate::sink::traits::FindingSink;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Appends each finding URL, newline-terminated, to a file.
///
/// The file is created if missing and never truncated, so repeated runs
/// accumulate into the same output.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    shown: String,
    file: Mutex<File>,
}

impl FileSink {
    /// Opens `path` for appending.
    ///
    /// # Errors
    ///
    /// Returns [`ReflexError::Sink`] if the file cannot be opened.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ReflexError> {
        let path = path.as_ref().to_path_buf();
        let shown = path.display().to_string();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| ReflexError::sink(&shown, format!("failed to open: {}", e)))?;

        tracing::debug!(path = %shown, "Opened output file");

        Ok(Self {
            path,
            shown,
            file: Mutex::new(file),
        })
    }

    /// Returns the output path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FindingSink for FileSink {
    fn destination(&self) -> &str {
        &self.shown
    }

    async fn record(&self, finding: &Finding) -> Result<(), ReflexError> {
        let mut line = finding.url.clone();
        line.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| ReflexError::sink(&self.shown, e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| ReflexError::sink(&self.shown, e.to_string()))?;
        Ok(())
    }
}
