//! Task and heap records captured from the scheduler.
//!
//! These structures are the unit of exchange between a [`SchedulerView`]
//! and the rest of the crate. Every field is a raw reading; percentages and
//! labels are derived later by the report module.
//!
//! [`SchedulerView`]: super::SchedulerView

use std::fmt;

use serde::{Serialize, Serializer};

/// Opaque handle identifying a live task inside its scheduler.
///
/// Only meaningful to the source that produced it (an index for the mock
/// scheduler, a thread id for procfs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct TaskHandle(pub u64);

/// Scheduler state of a task at snapshot time.
///
/// Raw ordinals follow the RTOS convention: 0 Running, 1 Ready, 2 Blocked,
/// 3 Suspended, 4 Deleted, 5 Invalid. Anything else is kept as
/// [`TaskState::Unknown`] so rendering never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    Running,
    #[default]
    Ready,
    Blocked,
    Suspended,
    Deleted,
    Invalid,
    Unknown(u8),
}

impl TaskState {
    /// Decodes a raw scheduler state ordinal.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Running,
            1 => Self::Ready,
            2 => Self::Blocked,
            3 => Self::Suspended,
            4 => Self::Deleted,
            5 => Self::Invalid,
            other => Self::Unknown(other),
        }
    }

    /// Display label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Ready => "Ready",
            Self::Blocked => "Blocked",
            Self::Suspended => "Suspended",
            Self::Deleted => "Deleted",
            Self::Invalid => "Invalid",
            Self::Unknown(_) => "Unknown state",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TaskState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Core a task is pinned to, or [`CoreAffinity::Any`] when unpinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CoreAffinity {
    Core(u32),
    #[default]
    Any,
}

impl CoreAffinity {
    /// Grouping key: pinned cores in ascending id order, unpinned last.
    pub fn group_key(&self) -> (u8, u32) {
        match self {
            Self::Core(id) => (0, *id),
            Self::Any => (1, 0),
        }
    }

    pub fn is_core(&self, id: u32) -> bool {
        matches!(self, Self::Core(core) if *core == id)
    }
}

impl fmt::Display for CoreAffinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core(id) => write!(f, "{}", id),
            Self::Any => f.write_str("Any"),
        }
    }
}

impl Serialize for CoreAffinity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Core(id) => serializer.serialize_u32(*id),
            Self::Any => serializer.serialize_str("Any"),
        }
    }
}

/// One live scheduling entity at snapshot time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskRecord {
    pub handle: TaskHandle,
    /// Task name as reported by the scheduler (not truncated here).
    pub name: String,
    pub state: TaskState,
    pub core_affinity: CoreAffinity,
    /// Identifier assigned at creation, unique among live tasks.
    pub task_number: u32,
    pub priority: i32,
    /// Smallest remaining stack margin ever observed.
    /// `None` when the source cannot measure it.
    pub stack_high_water_mark: Option<u32>,
    /// Cumulative execution time in microseconds since scheduler start.
    pub runtime_counter: u64,
}

/// Heap allocator statistics in bytes.
///
/// `minimum_free_ever` is lifetime-since-boot and may sit above the current
/// `free` reading; only `minimum_free_ever <= total` is a hard bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct HeapMetrics {
    pub total: u64,
    pub free: u64,
    pub minimum_free_ever: u64,
}

impl HeapMetrics {
    /// Clamps free and minimum-free readings to the total.
    ///
    /// Collaborators sample the three counters separately, so a reading may
    /// briefly exceed the total.
    pub fn clamped(self) -> Self {
        Self {
            total: self.total,
            free: self.free.min(self.total),
            minimum_free_ever: self.minimum_free_ever.min(self.total),
        }
    }
}
