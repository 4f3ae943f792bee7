//! Derived values: percentages and whole seconds.

pub const US_PER_SECOND: u64 = 1_000_000;

/// Share of `total` spent in `counter`, in percent.
///
/// `None` when no runtime has elapsed. The result is not clamped: a task
/// counter that wrapped past the total shows up as a value above 100.
pub fn runtime_percent(counter: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| counter as f64 * 100.0 / total as f64)
}

/// `part` as a percentage of `total`, within `[0, 100]`. Zero when the
/// total is zero.
pub fn heap_percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part.min(total) as f64 * 100.0 / total as f64
}

/// Whole seconds in a microsecond count, truncated.
pub fn whole_seconds(us: u64) -> u64 {
    us / US_PER_SECOND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_percent() {
        assert_eq!(runtime_percent(0, 0), None);
        assert_eq!(runtime_percent(5, 0), None);
        let pct = runtime_percent(500, 1500).unwrap();
        assert!((pct - 33.333).abs() < 0.001);
        assert_eq!(runtime_percent(1500, 1500), Some(100.0));
    }

    #[test]
    fn test_runtime_percent_large_counters() {
        let pct = runtime_percent(u64::MAX / 2, u64::MAX).unwrap();
        assert!((pct - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_heap_percent() {
        assert_eq!(heap_percent(0, 0), 0.0);
        assert_eq!(heap_percent(50, 200), 25.0);
        assert_eq!(heap_percent(300, 200), 100.0);
    }

    #[test]
    fn test_whole_seconds() {
        assert_eq!(whole_seconds(999_999), 0);
        assert_eq!(whole_seconds(19_750_000), 19);
    }
}
