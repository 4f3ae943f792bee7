//! Synthetic sources for testing the monitor without a live scheduler.
//!
//! `MockScheduler` and `MockMetrics` stand in for an RTOS task table and
//! heap allocator; `MockFs` stands in for `/proc` when testing the procfs
//! source. Scenario constructors live in `scenarios`.

mod filesystem;
mod scenarios;
mod scheduler;

pub use filesystem::MockFs;
pub use scenarios::{thread_stat, thread_status};
pub use scheduler::{MockMetrics, MockScheduler};
