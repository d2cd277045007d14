//! Result sinks for findings.
//!
//! - [`FileSink`] appends one URL per line to an output file
//! - [`ConsoleSink`] prints findings to stdout, optionally teeing into another sink
//! - [`MemorySink`] collects findings in memory

mod console;
mod file;
mod memory;
mod traits;

pub use console::ConsoleSink;
pub use file::FileSink;
pub use memory::MemorySink;
pub use traits::{ArcSink, FindingSink};
