//! Monitor configuration.

use std::time::Duration;

/// Ordering applied to a snapshot before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankingPolicy {
    /// Runtime counter, highest first.
    RuntimeDescending,
    /// Grouped by core affinity (ascending core id, unpinned last),
    /// runtime counter highest first within each group.
    #[default]
    CoreThenRuntime,
}

/// Output format of the report sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Fixed-column text.
    #[default]
    Plain,
    /// Fixed-column text with ANSI colors.
    Color,
    /// One JSON object per report.
    Json,
}

/// Settings of the periodic monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Pause between two report cycles.
    pub interval: Duration,
    pub policy: RankingPolicy,
    pub format: ReportFormat,
    /// Upper bound on records captured per snapshot.
    pub max_tasks: usize,
    /// Name of the background thread.
    pub thread_name: String,
    /// Stack size of the background thread in bytes.
    pub stack_size: usize,
}

impl MonitorConfig {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
    pub const DEFAULT_MAX_TASKS: usize = 1024;
    pub const DEFAULT_STACK_SIZE: usize = 256 * 1024;

    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: RankingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_max_tasks(mut self, max_tasks: usize) -> Self {
        self.max_tasks = max_tasks;
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            policy: RankingPolicy::default(),
            format: ReportFormat::default(),
            max_tasks: Self::DEFAULT_MAX_TASKS,
            thread_name: "monitor_task".to_string(),
            stack_size: Self::DEFAULT_STACK_SIZE,
        }
    }
}
