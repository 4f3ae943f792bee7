//! Synthetic scheduler and metrics sources.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::CollectError;
use crate::scheduler::model::{CoreAffinity, TaskHandle, TaskRecord, TaskState};
use crate::scheduler::traits::{MetricsSource, SchedulerView};

/// In-memory task table.
///
/// Records are returned in insertion order, which stands for the
/// scheduler's own snapshot order.
#[derive(Debug, Default)]
pub struct MockScheduler {
    tasks: Vec<TaskRecord>,
    /// Explicit total runtime; defaults to the sum of task counters.
    total_runtime: Option<u64>,
    /// Overrides the live task count reported to the driver.
    reported_count: Option<usize>,
    failure: Option<String>,
    /// Runtime added per snapshot, spread across tasks by their share.
    auto_advance_us: Option<u64>,
    snapshots_taken: AtomicU64,
}

impl MockScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task and returns its handle. Task numbers start at 1.
    pub fn add_task(
        &mut self,
        name: &str,
        state: TaskState,
        core_affinity: CoreAffinity,
        priority: i32,
        stack_high_water_mark: u32,
        runtime_counter: u64,
    ) -> TaskHandle {
        let handle = TaskHandle(self.tasks.len() as u64);
        self.tasks.push(TaskRecord {
            handle,
            name: name.to_string(),
            state,
            core_affinity,
            task_number: self.tasks.len() as u32 + 1,
            priority,
            stack_high_water_mark: Some(stack_high_water_mark),
            runtime_counter,
        });
        handle
    }

    /// Adds a task given only its name, affinity and runtime.
    pub fn add_simple(
        &mut self,
        name: &str,
        core_affinity: CoreAffinity,
        runtime: u64,
    ) -> TaskHandle {
        self.add_task(name, TaskState::Ready, core_affinity, 1, 1024, runtime)
    }

    pub fn with_total_runtime(mut self, total: u64) -> Self {
        self.total_runtime = Some(total);
        self
    }

    pub fn with_auto_advance(mut self, step_us: u64) -> Self {
        self.auto_advance_us = Some(step_us);
        self
    }

    /// Makes `count_live_tasks` report `count` instead of the table size.
    pub fn set_reported_count(&mut self, count: Option<usize>) {
        self.reported_count = count;
    }

    /// Makes every following snapshot fail with a parse error.
    pub fn set_failure(&mut self, message: Option<&str>) {
        self.failure = message.map(str::to_string);
    }

    pub fn set_state(&mut self, task: TaskHandle, state: TaskState) {
        if let Some(record) = self.tasks.get_mut(task.0 as usize) {
            record.state = state;
        }
    }

    /// Number of successful snapshots served so far.
    pub fn snapshots_taken(&self) -> u64 {
        self.snapshots_taken.load(Ordering::Relaxed)
    }

    fn base_total(&self) -> u64 {
        self.total_runtime
            .unwrap_or_else(|| self.tasks.iter().map(|t| t.runtime_counter).sum())
    }
}

impl SchedulerView for MockScheduler {
    fn count_live_tasks(&self) -> usize {
        self.reported_count.unwrap_or(self.tasks.len())
    }

    fn snapshot_tasks(
        &self,
        buffer: &mut Vec<TaskRecord>,
        capacity: usize,
    ) -> Result<u64, CollectError> {
        buffer.clear();
        if let Some(ref message) = self.failure {
            return Err(CollectError::Parse(message.clone()));
        }

        let taken = self.snapshots_taken.fetch_add(1, Ordering::Relaxed) + 1;
        let step = self.auto_advance_us.unwrap_or(0).saturating_mul(taken);
        let live_sum: u64 = self.tasks.iter().map(|t| t.runtime_counter).sum();

        for task in self.tasks.iter().take(capacity) {
            let mut record = task.clone();
            record.core_affinity = self.affinity_of(task.handle);
            if step > 0 && live_sum > 0 {
                let share = (step as u128 * task.runtime_counter as u128 / live_sum as u128) as u64;
                record.runtime_counter = record.runtime_counter.saturating_add(share);
            }
            buffer.push(record);
        }

        Ok(self.base_total().saturating_add(step))
    }

    fn affinity_of(&self, task: TaskHandle) -> CoreAffinity {
        self.tasks
            .get(task.0 as usize)
            .map(|t| t.core_affinity)
            .unwrap_or_default()
    }
}

/// Fixed heap readings and a tick-driven clock.
#[derive(Debug)]
pub struct MockMetrics {
    pub heap_total: u64,
    pub heap_free: u64,
    pub heap_minimum_free: u64,
    pub tick_rate_hz: u64,
    ticks: AtomicU64,
    uptime_us: AtomicU64,
}

impl MockMetrics {
    pub fn new(heap_total: u64, heap_free: u64, heap_minimum_free: u64) -> Self {
        Self {
            heap_total,
            heap_free,
            heap_minimum_free,
            tick_rate_hz: 100,
            ticks: AtomicU64::new(0),
            uptime_us: AtomicU64::new(0),
        }
    }

    pub fn with_tick_rate(mut self, hz: u64) -> Self {
        self.tick_rate_hz = hz.max(1);
        self
    }

    pub fn set_ticks(&self, ticks: u64) {
        self.ticks.store(ticks, Ordering::Relaxed);
    }

    pub fn set_uptime_us(&self, uptime_us: u64) {
        self.uptime_us.store(uptime_us, Ordering::Relaxed);
    }

    /// Advances both clocks by `us` microseconds.
    pub fn advance_us(&self, us: u64) {
        let uptime = self.uptime_us.fetch_add(us, Ordering::Relaxed) + us;
        self.ticks.store(uptime * self.tick_rate_hz / 1_000_000, Ordering::Relaxed);
    }
}

impl MetricsSource for MockMetrics {
    fn heap_total(&self) -> u64 {
        self.heap_total
    }

    fn heap_free(&self) -> u64 {
        self.heap_free
    }

    fn heap_minimum_free(&self) -> u64 {
        self.heap_minimum_free
    }

    fn now_ms(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed) * 1000 / self.tick_rate_hz
    }

    fn now_us(&self) -> u64 {
        self.uptime_us.load(Ordering::Relaxed)
    }
}
