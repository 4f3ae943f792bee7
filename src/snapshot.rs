//! Per-cycle snapshot buffer.
//!
//! The buffer is sized from the live task count right before the snapshot
//! query and never grows afterwards, which bounds the memory one cycle can
//! take. It is owned by the cycle that acquired it and released when that
//! cycle returns, whatever the outcome.

use crate::error::{CollectError, MonitorError};
use crate::scheduler::model::TaskRecord;
use crate::scheduler::traits::SchedulerView;

/// Storage for one snapshot, reserved up front.
#[derive(Debug)]
pub struct SnapshotBuffer {
    records: Vec<TaskRecord>,
    capacity: usize,
}

impl SnapshotBuffer {
    /// Reserves room for `live_count` records.
    ///
    /// Fails with [`MonitorError::TaskLimit`] when the count exceeds
    /// `max_tasks`, or [`MonitorError::OutOfMemory`] when the allocation
    /// cannot be satisfied.
    pub fn acquire(live_count: usize, max_tasks: usize) -> Result<Self, MonitorError> {
        if live_count > max_tasks {
            return Err(MonitorError::TaskLimit {
                live: live_count,
                limit: max_tasks,
            });
        }

        let mut records = Vec::new();
        records
            .try_reserve_exact(live_count)
            .map_err(|_| MonitorError::OutOfMemory {
                requested: live_count,
            })?;

        Ok(Self {
            records,
            capacity: live_count,
        })
    }

    /// Number of records this buffer accepts.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Runs the snapshot query into this buffer.
    pub fn fill<S: SchedulerView + ?Sized>(mut self, view: &S) -> Result<Snapshot, CollectError> {
        let total_runtime = view.snapshot_tasks(&mut self.records, self.capacity)?;
        // A source pushing past capacity would defeat the memory bound.
        self.records.truncate(self.capacity);
        Ok(Snapshot {
            tasks: self.records,
            total_runtime,
        })
    }
}

/// Task table captured in one query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    /// Records in the order the scheduler returned them.
    pub tasks: Vec<TaskRecord>,
    /// Runtime of all tasks since scheduler start, in microseconds.
    pub total_runtime: u64,
}

impl Snapshot {
    /// Whether any runtime has elapsed, i.e. percentages can be derived.
    pub fn has_runtime(&self) -> bool {
        self.total_runtime > 0
    }
}
