//! Shared job queue with outstanding-work tracking.

use crate::core::{Job, ReflexError, ScanStats};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// A bounded multi-consumer job queue that knows when all work is done.
///
/// The queue counts outstanding jobs: one for every submitted job and one
/// for every scheduled requeue, released when a worker calls
/// [`complete`](Self::complete). Once the input side is closed and the
/// count reaches zero the queue is drained and [`next`](Self::next)
/// returns `None` to every worker. A requeue still waiting out its jitter
/// keeps the count above zero, so shutdown cannot overtake it.
#[derive(Debug)]
pub struct JobQueue {
    tx: mpsc::Sender<Job>,
    rx: Mutex<mpsc::Receiver<Job>>,
    capacity: usize,
    outstanding: AtomicUsize,
    input_closed: AtomicBool,
    drained: CancellationToken,
    stats: Arc<ScanStats>,
}

impl JobQueue {
    /// Creates a queue buffering up to `capacity` jobs.
    pub fn new(capacity: usize, stats: Arc<ScanStats>) -> Self {
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx: Mutex::new(rx),
            capacity,
            outstanding: AtomicUsize::new(0),
            input_closed: AtomicBool::new(false),
            drained: CancellationToken::new(),
            stats,
        }
    }

    /// Returns the buffer capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of jobs not yet completed, including pending
    /// requeues.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Returns `true` once input is closed and every job is complete.
    pub fn is_drained(&self) -> bool {
        self.drained.is_cancelled()
    }

    /// Adds a job from the job source. Waits while the buffer is full.
    pub async fn submit(&self, job: Job) -> Result<(), ReflexError> {
        if self.input_closed.load(Ordering::SeqCst) {
            return Err(ReflexError::internal("job submitted after input was closed"));
        }

        self.outstanding.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(job).await.is_err() {
            self.complete();
            return Err(ReflexError::internal("job queue receiver dropped"));
        }
        self.stats.record_submitted();
        Ok(())
    }

    /// Puts `job` back on the queue after `delay`, without blocking the
    /// caller.
    ///
    /// The requeue counts as outstanding work from the moment it is
    /// scheduled. The returned handle resolves to `true` once the job is
    /// back in the buffer.
    pub fn requeue_after(self: &Arc<Self>, job: Job, delay: Duration) -> tokio::task::JoinHandle<bool> {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        self.stats.record_requeue_scheduled();

        let queue = Arc::clone(self);
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match queue.tx.send(job).await {
                Ok(()) => {
                    queue.stats.record_requeue_delivered();
                    true
                }
                Err(mpsc::error::SendError(job)) => {
                    tracing::warn!(url = %job, "Requeue dropped, queue closed");
                    queue.complete();
                    false
                }
            }
        })
    }

    /// Takes the next job, waiting while the queue is empty.
    ///
    /// Returns `None` once the queue is drained.
    pub async fn next(&self) -> Option<Job> {
        tokio::select! {
            biased;
            job = async { self.rx.lock().await.recv().await } => job,
            _ = self.drained.cancelled() => None,
        }
    }

    /// Marks one job taken from [`next`](Self::next) as finished.
    pub fn complete(&self) {
        let previous = self.outstanding.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "complete() without outstanding work");
        if previous == 1 && self.input_closed.load(Ordering::SeqCst) {
            self.drained.cancel();
        }
    }

    /// Signals that the job source is exhausted.
    pub fn close_input(&self) {
        self.input_closed.store(true, Ordering::SeqCst);
        if self.outstanding.load(Ordering::SeqCst) == 0 {
            self.drained.cancel();
        }
    }

    /// Waits until the queue is drained.
    pub async fn wait_drained(&self) {
        self.drained.cancelled().await;
    }
}
