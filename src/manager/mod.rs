//! Scan orchestration.
//!
//! The [`ScanManager`] feeds URLs from a source into a [`JobQueue`],
//! runs a fixed pool of workers against it, and stops once the input is
//! closed and no job, in the channel, in a worker or waiting out a
//! re-queue delay, is left.

mod queue;
mod retry;
mod scan_manager;
mod worker;

pub use queue::JobQueue;
pub use retry::RequeueConfig;
pub use scan_manager::{ScanManager, ScanManagerBuilder, ScanManagerConfig};
