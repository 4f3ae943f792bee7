//! One JSON object per line.

use serde_json::json;

use super::{Renderer, Report, Severity};

/// Renders each report as a single JSON line.
///
/// Diagnostics become `{"timestamp_ms", "severity", "message"}` objects so
/// the output stays one object per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, report: &Report) -> Vec<String> {
        match serde_json::to_string(report) {
            Ok(line) => vec![line],
            Err(e) => vec![self.diagnostic(
                report.timestamp_ms,
                Severity::Error,
                &format!("report serialization failed: {}", e),
            )],
        }
    }

    fn diagnostic(&self, timestamp_ms: u64, severity: Severity, message: &str) -> String {
        json!({
            "timestamp_ms": timestamp_ms,
            "severity": severity,
            "message": message,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RankingPolicy;
    use crate::rank::rank;
    use crate::scheduler::{MetricsSource, MockMetrics, MockScheduler, SchedulerView};
    use crate::snapshot::Snapshot;

    #[test]
    fn test_report_is_one_json_line() {
        let sched = MockScheduler::dual_core_system();
        let metrics = MockMetrics::typical_heap();
        let mut tasks = Vec::new();
        let total_runtime = sched.snapshot_tasks(&mut tasks, 9).unwrap();
        let mut snapshot = Snapshot {
            tasks,
            total_runtime,
        };
        rank(&mut snapshot.tasks, RankingPolicy::CoreThenRuntime);
        let report =
            Report::build(&snapshot, metrics.heap(), metrics.now_us(), metrics.now_ms()).unwrap();

        let lines = JsonRenderer.render(&report);
        assert_eq!(lines.len(), 1);

        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["timestamp_ms"], 20000);
        assert_eq!(value["total_runtime_us"], 19_750_000);
        assert_eq!(value["heap"]["total_bytes"], 327_680);

        let tasks = value["tasks"].as_array().unwrap();
        assert_eq!(tasks.len(), 9);
        assert_eq!(tasks[0]["name"], "IDLE0");
        assert_eq!(tasks[0]["core"], 0);
        assert_eq!(tasks[0]["state"], "Ready");
        assert_eq!(tasks[8]["core"], "Any");
    }

    #[test]
    fn test_diagnostic_line() {
        let line = JsonRenderer.diagnostic(7, Severity::Warning, "skipped");
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["timestamp_ms"], 7);
        assert_eq!(value["severity"], "warning");
        assert_eq!(value["message"], "skipped");
    }
}
