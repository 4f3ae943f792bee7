//! Query interfaces consumed by the monitor.
//!
//! The monitor never owns scheduler or allocator state. It reads through
//! these traits so that the same cycle runs against a live system, a
//! `/proc` tree, or a synthetic table in tests.

use std::io;
use std::path::{Path, PathBuf};

use super::model::{CoreAffinity, HeapMetrics, TaskHandle, TaskRecord};
use crate::error::CollectError;

/// Read-only view of the scheduler's task table.
pub trait SchedulerView {
    /// Number of tasks currently alive.
    fn count_live_tasks(&self) -> usize;

    /// Fills `buffer` with one record per live task and returns the total
    /// elapsed runtime (microseconds) maintained by the scheduler.
    ///
    /// `buffer` is cleared first. Implementations push at most `capacity`
    /// records; tasks created after the count was taken are left out.
    /// The total covers every task since scheduler start, including tasks
    /// that already exited.
    fn snapshot_tasks(
        &self,
        buffer: &mut Vec<TaskRecord>,
        capacity: usize,
    ) -> Result<u64, CollectError>;

    /// Current core affinity of a live task.
    fn affinity_of(&self, task: TaskHandle) -> CoreAffinity;
}

/// Heap and clock readings.
pub trait MetricsSource {
    /// Total heap size in bytes.
    fn heap_total(&self) -> u64;

    /// Currently free heap bytes.
    fn heap_free(&self) -> u64;

    /// Lowest free heap bytes observed since boot.
    fn heap_minimum_free(&self) -> u64;

    /// Scheduler tick counter converted to milliseconds.
    fn now_ms(&self) -> u64;

    /// Monotonic uptime in microseconds.
    fn now_us(&self) -> u64;

    /// Reads all heap counters at once.
    fn heap(&self) -> HeapMetrics {
        HeapMetrics {
            total: self.heap_total(),
            free: self.heap_free(),
            minimum_free_ever: self.heap_minimum_free(),
        }
    }
}

/// Abstraction for filesystem operations.
///
/// Lets the procfs source read from the real `/proc` on Linux or from an
/// in-memory tree in tests.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists entries in a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }
}
