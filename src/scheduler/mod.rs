//! Collaborator seam between the monitor and the system it observes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Monitor                           │
//! │   count_live_tasks / snapshot_tasks     heap / clocks    │
//! └──────────────┬──────────────────────────────┬────────────┘
//!                │                              │
//!         ┌──────▼────────┐              ┌──────▼────────┐
//!         │ SchedulerView │ (trait)      │ MetricsSource │ (trait)
//!         └──────┬────────┘              └──────┬────────┘
//!        ┌───────┴────────┐           ┌─────────┼──────────────┐
//!  ┌─────▼──────┐ ┌───────▼───────┐ ┌─▼──────────┐ ┌──▼─────────────┐
//!  │ Procfs     │ │ MockScheduler │ │ Procfs     │ │ Jemalloc /     │
//!  │ Scheduler  │ │ (Testing)     │ │ Metrics    │ │ MockMetrics    │
//!  └─────┬──────┘ └───────────────┘ └─┬──────────┘ └────────────────┘
//!        └──────── FileSystem ────────┘
//!                (RealFs | MockFs)
//! ```
//!
//! # Usage
//!
//! ```
//! use taskmon::scheduler::{MockScheduler, SchedulerView};
//!
//! let sched = MockScheduler::dual_core_system();
//! let count = sched.count_live_tasks();
//! let mut buffer = Vec::with_capacity(count);
//! let total = sched.snapshot_tasks(&mut buffer, count).unwrap();
//! assert_eq!(buffer.len(), count);
//! assert!(total > 0);
//! ```

mod jemalloc;
pub mod mock;
pub mod model;
pub mod procfs;
pub mod traits;

pub use jemalloc::JemallocMetrics;
pub use mock::{MockFs, MockMetrics, MockScheduler};
pub use model::{CoreAffinity, HeapMetrics, TaskHandle, TaskRecord, TaskState};
pub use procfs::{ProcfsMetrics, ProcfsScheduler};
pub use traits::{FileSystem, MetricsSource, RealFs, SchedulerView};
