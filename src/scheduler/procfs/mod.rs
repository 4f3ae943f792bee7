//! Linux `/proc` backed sources.
//!
//! Lets the monitor observe a host process: each thread becomes a task and
//! system memory stands in for the heap.

mod metrics;
pub mod parser;
mod scheduler;

pub use metrics::ProcfsMetrics;
pub use scheduler::ProcfsScheduler;
