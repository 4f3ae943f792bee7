//! Report model and renderers.
//!
//! A cycle first turns the ranked snapshot into a [`Report`] of typed rows
//! and derived metrics, then hands it to a [`Renderer`] for presentation.

mod json;
pub mod metrics;
mod text;

use serde::Serialize;

use crate::config::ReportFormat;
use crate::scheduler::model::{CoreAffinity, HeapMetrics, TaskRecord, TaskState};
use crate::snapshot::Snapshot;

pub use json::JsonRenderer;
pub use text::TextRenderer;

/// One task line of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRow {
    pub name: String,
    pub state: TaskState,
    pub core: CoreAffinity,
    pub number: u32,
    pub priority: i32,
    pub stack_min: Option<u32>,
    pub runtime_us: u64,
    pub runtime_percent: f64,
}

impl TaskRow {
    fn from_record(record: &TaskRecord, total_runtime: u64) -> Option<Self> {
        Some(Self {
            name: record.name.clone(),
            state: record.state,
            core: record.core_affinity,
            number: record.task_number,
            priority: record.priority,
            stack_min: record.stack_high_water_mark,
            runtime_us: record.runtime_counter,
            runtime_percent: metrics::runtime_percent(record.runtime_counter, total_runtime)?,
        })
    }
}

/// Heap health block of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeapSummary {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub free_percent: f64,
    pub minimum_free_bytes: u64,
    pub minimum_free_percent: f64,
}

impl From<HeapMetrics> for HeapSummary {
    fn from(heap: HeapMetrics) -> Self {
        let heap = heap.clamped();
        Self {
            total_bytes: heap.total,
            free_bytes: heap.free,
            free_percent: metrics::heap_percent(heap.free, heap.total),
            minimum_free_bytes: heap.minimum_free_ever,
            minimum_free_percent: metrics::heap_percent(heap.minimum_free_ever, heap.total),
        }
    }
}

/// Everything one cycle prints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Tick-derived timestamp shared by every line of this report.
    pub timestamp_ms: u64,
    pub tasks: Vec<TaskRow>,
    pub heap: HeapSummary,
    pub total_runtime_us: u64,
    pub total_runtime_secs: u64,
    pub uptime_us: u64,
    pub uptime_secs: u64,
}

impl Report {
    /// Builds the report for an already ranked snapshot.
    ///
    /// Returns `None` when the snapshot carries no elapsed runtime, in
    /// which case nothing is printed for the cycle.
    pub fn build(
        snapshot: &Snapshot,
        heap: HeapMetrics,
        uptime_us: u64,
        timestamp_ms: u64,
    ) -> Option<Self> {
        if !snapshot.has_runtime() {
            return None;
        }

        let tasks = snapshot
            .tasks
            .iter()
            .map(|r| TaskRow::from_record(r, snapshot.total_runtime))
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            timestamp_ms,
            tasks,
            heap: heap.into(),
            total_runtime_us: snapshot.total_runtime,
            total_runtime_secs: metrics::whole_seconds(snapshot.total_runtime),
            uptime_us,
            uptime_secs: metrics::whole_seconds(uptime_us),
        })
    }
}

/// Severity marker of an output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn marker(&self) -> char {
        match self {
            Severity::Info => 'I',
            Severity::Warning => 'W',
            Severity::Error => 'E',
        }
    }
}

/// Turns reports and diagnostics into output lines.
pub trait Renderer: Send {
    /// Lines for one report, without trailing newlines.
    fn render(&self, report: &Report) -> Vec<String>;

    /// A single diagnostic line.
    fn diagnostic(&self, timestamp_ms: u64, severity: Severity, message: &str) -> String;
}

/// Renderer for the configured output format.
pub fn renderer_for(format: ReportFormat) -> Box<dyn Renderer> {
    match format {
        ReportFormat::Plain => Box::new(TextRenderer::plain()),
        ReportFormat::Color => Box::new(TextRenderer::colored()),
        ReportFormat::Json => Box::new(JsonRenderer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RankingPolicy;
    use crate::rank::rank;
    use crate::scheduler::SchedulerView;
    use crate::scheduler::mock::{MockMetrics, MockScheduler};
    use crate::scheduler::traits::MetricsSource;

    fn snapshot_of(sched: &MockScheduler) -> Snapshot {
        let mut tasks = Vec::new();
        let total_runtime = sched
            .snapshot_tasks(&mut tasks, sched.count_live_tasks())
            .unwrap();
        Snapshot {
            tasks,
            total_runtime,
        }
    }

    #[test]
    fn test_small_dual_core_percentages() {
        let mut snapshot = snapshot_of(&MockScheduler::small_dual_core());
        rank(&mut snapshot.tasks, RankingPolicy::CoreThenRuntime);
        let heap = MockMetrics::typical_heap().heap();

        let report = Report::build(&snapshot, heap, 0, 0).unwrap();
        let rows: Vec<(&str, String)> = report
            .tasks
            .iter()
            .map(|r| (r.name.as_str(), format!("{:.1}", r.runtime_percent)))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("A", "33.3".to_string()),
                ("C", "20.0".to_string()),
                ("B", "46.7".to_string()),
            ]
        );
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let mut sched = MockScheduler::new();
        for (i, runtime) in [17u64, 3, 999_983, 1, 41, 0, 7_000_001].iter().enumerate() {
            sched.add_simple(&format!("t{}", i), crate::scheduler::CoreAffinity::Any, *runtime);
        }
        let snapshot = snapshot_of(&sched);

        let report = Report::build(&snapshot, HeapMetrics::default(), 0, 0).unwrap();
        let sum: f64 = report.tasks.iter().map(|r| r.runtime_percent).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_runtime_builds_nothing() {
        let snapshot = snapshot_of(&MockScheduler::just_booted());
        assert!(Report::build(&snapshot, HeapMetrics::default(), 1, 1).is_none());
    }

    #[test]
    fn test_heap_summary_bounds() {
        let heap = HeapMetrics {
            total: 1000,
            free: 1200,
            minimum_free_ever: 250,
        };
        let summary = HeapSummary::from(heap);
        assert_eq!(summary.free_bytes, 1000);
        assert_eq!(summary.free_percent, 100.0);
        assert_eq!(summary.minimum_free_percent, 25.0);

        let empty = HeapSummary::from(HeapMetrics::default());
        assert_eq!(empty.free_percent, 0.0);
        assert_eq!(empty.minimum_free_percent, 0.0);
    }

    #[test]
    fn test_runtime_and_uptime_seconds() {
        let snapshot = snapshot_of(&MockScheduler::dual_core_system());
        let report = Report::build(&snapshot, HeapMetrics::default(), 20_015_422, 2000).unwrap();
        assert_eq!(report.total_runtime_us, 19_750_000);
        assert_eq!(report.total_runtime_secs, 19);
        assert_eq!(report.uptime_secs, 20);
        assert_eq!(report.timestamp_ms, 2000);
    }

    #[test]
    fn test_severity_marker() {
        assert_eq!(Severity::Info.marker(), 'I');
        assert_eq!(Severity::Warning.marker(), 'W');
        assert_eq!(Severity::Error.marker(), 'E');
    }
}
