//! Fixed-column text output, optionally colored.

use crossterm::style::{Color, Stylize, style};

use super::{Renderer, Report, Severity, TaskRow};

const TAG: &str = "tm";

/// Renders reports as fixed-width columns.
///
/// Every line is prefixed with `"<S> (<ms>) tm: "` where `S` is the
/// severity marker and `ms` the report timestamp. A report ends with one
/// empty line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer {
    color: bool,
}

impl TextRenderer {
    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn colored() -> Self {
        Self { color: true }
    }

    fn prefix(severity: Severity, timestamp_ms: u64) -> String {
        format!("{} ({}) {}: ", severity.marker(), timestamp_ms, TAG)
    }

    fn paint(&self, text: String, color: Color) -> String {
        if self.color {
            style(text).with(color).to_string()
        } else {
            text
        }
    }

    fn header(&self) -> String {
        let line = format!(
            "{:<18.16} {:<14.13} {:<6.5} {:<8.8} {:<10.9} {:<11.10} {:<14.14} {}",
            "TASK NAME",
            "STATE",
            "CORE",
            "NUMBER",
            "PRIORITY",
            "STACK_MIN",
            "RUNTIME(µs)",
            "RUNTIME(%)"
        );
        self.paint(line, Color::Blue)
    }

    fn row(&self, row: &TaskRow) -> String {
        let stack = row
            .stack_min
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let line = format!(
            "{:<18.16} {:<14.13} {:<6.5} {:<8} {:<10} {:<11} {:<14} {:.3}",
            row.name,
            row.state.label(),
            row.core.to_string(),
            row.number,
            row.priority,
            stack,
            row.runtime_us,
            row.runtime_percent
        );
        let color = if row.core.is_core(0) {
            Color::Yellow
        } else {
            Color::Cyan
        };
        self.paint(line, color)
    }

    /// `label` followed by a value and an optional unit tail.
    fn summary(&self, label: &str, value: String, tail: String) -> String {
        if self.color {
            format!(
                "{}{}{}",
                style(label).with(Color::Yellow),
                style(value).with(Color::Green),
                style(tail).with(Color::Yellow)
            )
        } else {
            format!("{}{}{}", label, value, tail)
        }
    }
}

impl Renderer for TextRenderer {
    fn render(&self, report: &Report) -> Vec<String> {
        let prefix = Self::prefix(Severity::Info, report.timestamp_ms);
        let heap = &report.heap;

        let mut lines = Vec::with_capacity(report.tasks.len() + 7);
        lines.push(self.header());
        lines.extend(report.tasks.iter().map(|row| self.row(row)));
        lines.push(self.summary(
            "Total heap size:        ",
            heap.total_bytes.to_string(),
            " bytes".to_string(),
        ));
        lines.push(self.summary(
            "Current heap free size: ",
            heap.free_bytes.to_string(),
            format!(" bytes ({:.2} %)", heap.free_percent),
        ));
        lines.push(self.summary(
            "Minimum heap free size: ",
            heap.minimum_free_bytes.to_string(),
            format!(" bytes ({:.2} %)", heap.minimum_free_percent),
        ));
        lines.push(self.summary(
            "Total RunTime: ",
            report.total_runtime_us.to_string(),
            format!(" µs ({} seconds)", report.total_runtime_secs),
        ));
        lines.push(self.summary(
            "System UpTime: ",
            report.uptime_us.to_string(),
            format!(" µs ({} seconds)", report.uptime_secs),
        ));

        let mut out: Vec<String> = lines
            .into_iter()
            .map(|line| format!("{}{}", prefix, line))
            .collect();
        out.push(String::new());
        out
    }

    fn diagnostic(&self, timestamp_ms: u64, severity: Severity, message: &str) -> String {
        let text = match severity {
            Severity::Info => message.to_string(),
            Severity::Warning | Severity::Error => self.paint(message.to_string(), Color::Red),
        };
        format!("{}{}", Self::prefix(severity, timestamp_ms), text)
    }
}
