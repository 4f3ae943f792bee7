//! Human-readable sizes and durations for log messages.
//!
//! Report lines print exact byte and microsecond counts; these helpers are
//! for the operator-facing log output only.

use std::time::Duration;

/// Compact (`"1.5M"`, `"3m5s"`) vs spaced (`"1.5 MiB"`, `"3m 5s"`) output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FmtStyle {
    Compact,
    Detail,
}

/// Format byte count as human-readable size.
pub fn format_bytes(bytes: u64, style: FmtStyle) -> String {
    let (g, m, k, b) = match style {
        FmtStyle::Compact => ("G", "M", "K", "B"),
        FmtStyle::Detail => (" GiB", " MiB", " KiB", " B"),
    };
    let f = bytes as f64;
    if bytes >= 1024 * 1024 * 1024 {
        format!("{:.1}{}", f / (1024.0 * 1024.0 * 1024.0), g)
    } else if bytes >= 1024 * 1024 {
        format!("{:.1}{}", f / (1024.0 * 1024.0), m)
    } else if bytes >= 1024 {
        format!("{:.1}{}", f / 1024.0, k)
    } else {
        format!("{}{}", bytes, b)
    }
}

/// Format a duration with second granularity; sub-second values print
/// as milliseconds.
pub fn format_duration(duration: Duration, style: FmtStyle) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        return format!("{}ms", duration.as_millis());
    }
    let sep = match style {
        FmtStyle::Compact => "",
        FmtStyle::Detail => " ",
    };
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m{}{}s", secs / 60, sep, secs % 60)
    } else {
        format!("{}h{}{}m", secs / 3600, sep, (secs % 3600) / 60)
    }
}
