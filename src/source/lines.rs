//! Line-oriented job sources.

use crate::core::{Job, ReflexError, ReflexResult};
use crate::source::JobSource;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::IsTerminal;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

/// Reads one URL per line from any buffered async reader.
///
/// Surrounding whitespace is trimmed and blank lines are skipped; nothing
/// else is validated here, malformed URLs are the worker's problem. Bytes
/// that are not valid UTF-8 are replaced with U+FFFD so one bad line never
/// cuts the rest of the input short.
#[derive(Debug)]
pub struct LineSource<R> {
    reader: R,
    buf: Vec<u8>,
    origin: String,
    line_no: u64,
}

impl<R> LineSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    /// Wraps a reader. `origin` names the input in log messages.
    pub fn new(reader: R, origin: impl Into<String>) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            origin: origin.into(),
            line_no: 0,
        }
    }

    /// Returns the input name.
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl LineSource<BufReader<File>> {
    /// Opens a file of URLs.
    ///
    /// # Errors
    ///
    /// Returns [`ReflexError::InputUnavailable`] if the file cannot be opened.
    pub async fn open(path: impl AsRef<Path>) -> ReflexResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).await.map_err(|e| {
            ReflexError::input_unavailable(format!("cannot open {}: {}", path.display(), e))
        })?;

        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

impl LineSource<BufReader<Stdin>> {
    /// Reads URLs from standard input.
    ///
    /// # Errors
    ///
    /// Returns [`ReflexError::InputUnavailable`] when stdin is an interactive
    /// terminal, since nothing was piped in.
    pub fn stdin() -> ReflexResult<Self> {
        if std::io::stdin().is_terminal() {
            return Err(ReflexError::input_unavailable(
                "no input piped on stdin and no input file given",
            ));
        }

        Ok(Self::new(BufReader::new(tokio::io::stdin()), "stdin"))
    }
}

#[async_trait]
impl<R> JobSource for LineSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_job(&mut self) -> ReflexResult<Option<Job>> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf).await {
                Ok(0) => return Ok(None),
                Ok(_) => {}
                Err(e) => {
                    return Err(ReflexError::input_unavailable(format!(
                        "read error in {} after line {}: {}",
                        self.origin, self.line_no, e
                    )))
                }
            }
            self.line_no += 1;

            let line = String::from_utf8_lossy(&self.buf);
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Ok(Some(Job::new(trimmed)));
        }
    }
}

/// A fixed list of URLs held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pending: VecDeque<Job>,
}

impl StaticSource {
    /// Creates a source from any iterator of URLs.
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pending: urls.into_iter().map(Job::new).collect(),
        }
    }

    /// Returns how many jobs have not been handed out yet.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

#[async_trait]
impl JobSource for StaticSource {
    async fn next_job(&mut self) -> ReflexResult<Option<Job>> {
        Ok(self.pending.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    async fn collect(source: &mut impl JobSource) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(job) = source.next_job().await.unwrap() {
            out.push(job.into_inner());
        }
        out
    }

    #[tokio::test]
    async fn test_lines_are_trimmed_and_blanks_skipped() {
        let input: &[u8] = b"  http://a/?x=1  \n\n\t\nhttp://b/?y=2\r\nhttp://c/\n";
        let mut source = LineSource::new(input, "test");

        let urls = collect(&mut source).await;
        assert_eq!(urls, vec!["http://a/?x=1", "http://b/?y=2", "http://c/"]);
        assert_eq!(source.origin(), "test");
    }

    #[tokio::test]
    async fn test_last_line_without_newline() {
        let input: &[u8] = b"http://a/?x=1\nhttp://b/?y=2";
        let mut source = LineSource::new(input, "test");

        assert_eq!(collect(&mut source).await.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_input() {
        let input: &[u8] = b"http://a/?x=1\nhttp://b/?y=\xff\xfe\nhttp://c/?z=3\nhttp://d/?w=4\n";
        let mut source = LineSource::new(input, "test");

        let urls = collect(&mut source).await;
        assert_eq!(urls.len(), 4);
        assert_eq!(urls[0], "http://a/?x=1");
        assert!(urls[1].starts_with("http://b/?y="));
        assert_eq!(urls[2], "http://c/?z=3");
        assert_eq!(urls[3], "http://d/?w=4");
    }

    #[tokio::test]
    async fn test_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "http://a/?x=1").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "http://b/?y=2").unwrap();
        file.flush().unwrap();

        let mut source = LineSource::open(file.path()).await.unwrap();
        assert_eq!(
            collect(&mut source).await,
            vec!["http://a/?x=1", "http://b/?y=2"]
        );
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = LineSource::open(dir.path().join("nope.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReflexError::InputUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_static_source() {
        let mut source = StaticSource::new(["http://a/?x=1", "http://b/?y=2"]);
        assert_eq!(source.remaining(), 2);

        assert_eq!(collect(&mut source).await.len(), 2);
        assert_eq!(source.remaining(), 0);
        assert!(source.next_job().await.unwrap().is_none());
    }
}
