//! taskmon - periodic task and heap reporter for multi-core schedulers.
//!
//! Every interval the monitor snapshots all live tasks through a
//! [`scheduler::SchedulerView`], ranks them, and prints one report with
//! per-task runtime shares and heap health:
//! - `scheduler` - snapshot sources (procfs, jemalloc, in-memory mocks)
//! - `snapshot` / `rank` - bounded capture and ordering
//! - `report` - report model plus text and JSON renderers
//! - `driver` - the periodic loop and its background thread

pub mod config;
pub mod driver;
pub mod error;
pub mod fmt;
pub mod rank;
pub mod report;
pub mod scheduler;
pub mod snapshot;

pub use config::{MonitorConfig, RankingPolicy, ReportFormat};
pub use driver::{CycleOutcome, Monitor, MonitorHandle, StopToken, spawn};
pub use error::{CollectError, MonitorError};
