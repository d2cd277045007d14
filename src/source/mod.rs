//! Where URLs come from.

mod lines;

pub use lines::{LineSource, StaticSource};

use crate::core::{Job, ReflexResult};
use async_trait::async_trait;

/// A stream of jobs fed into the scan queue.
///
/// Returning `Ok(None)` ends the input. An error also ends the input; the
/// scan manager logs it and lets already-submitted work finish.
#[async_trait]
pub trait JobSource: Send {
    /// Yields the next job, or `None` when the input is exhausted.
    async fn next_job(&mut self) -> ReflexResult<Option<Job>>;
}

#[async_trait]
impl<S: JobSource + ?Sized> JobSource for Box<S> {
    async fn next_job(&mut self) -> ReflexResult<Option<Job>> {
        (**self).next_job().await
    }
}
