//! System memory and uptime from `/proc`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::debug;

use super::parser::{MemInfo, parse_meminfo, parse_uptime_us};
use crate::scheduler::model::HeapMetrics;
use crate::scheduler::traits::{FileSystem, MetricsSource};

/// Metrics source backed by `/proc/meminfo` and `/proc/uptime`.
///
/// Heap total is `MemTotal`, free is `MemAvailable`. The kernel keeps no
/// lifetime minimum, so the lowest free reading observed by this source
/// is reported instead.
pub struct ProcfsMetrics<F: FileSystem> {
    fs: F,
    proc_path: String,
    started: Instant,
    minimum_free: AtomicU64,
}

impl<F: FileSystem> ProcfsMetrics<F> {
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
            started: Instant::now(),
            minimum_free: AtomicU64::new(u64::MAX),
        }
    }

    fn meminfo(&self) -> MemInfo {
        let path = PathBuf::from(format!("{}/meminfo", self.proc_path));
        match self.fs.read_to_string(&path).map(|c| parse_meminfo(&c)) {
            Ok(Ok(info)) => info,
            Ok(Err(e)) => {
                debug!("meminfo: {}", e);
                MemInfo::default()
            }
            Err(e) => {
                debug!("meminfo: {}", e);
                MemInfo::default()
            }
        }
    }

    fn observe_free(&self, free: u64) -> u64 {
        let previous = self.minimum_free.fetch_min(free, Ordering::Relaxed);
        previous.min(free)
    }
}

impl<F: FileSystem> MetricsSource for ProcfsMetrics<F> {
    fn heap_total(&self) -> u64 {
        self.meminfo().mem_total * 1024
    }

    fn heap_free(&self) -> u64 {
        let free = self.meminfo().mem_available * 1024;
        self.observe_free(free);
        free
    }

    fn heap_minimum_free(&self) -> u64 {
        match self.minimum_free.load(Ordering::Relaxed) {
            u64::MAX => {
                let free = self.meminfo().mem_available * 1024;
                self.observe_free(free)
            }
            minimum => minimum,
        }
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn now_us(&self) -> u64 {
        let path = PathBuf::from(format!("{}/uptime", self.proc_path));
        self.fs
            .read_to_string(&path)
            .ok()
            .and_then(|c| parse_uptime_us(&c).ok())
            .unwrap_or_else(|| self.started.elapsed().as_micros() as u64)
    }

    fn heap(&self) -> HeapMetrics {
        let info = self.meminfo();
        let free = info.mem_available * 1024;
        HeapMetrics {
            total: info.mem_total * 1024,
            free,
            minimum_free_ever: self.observe_free(free),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::mock::MockFs;

    #[test]
    fn test_heap_from_meminfo() {
        let metrics = ProcfsMetrics::new(MockFs::threaded_process(), "/proc");
        let heap = metrics.heap();

        assert_eq!(heap.total, 16_384_000 * 1024);
        assert_eq!(heap.free, 12_000_000 * 1024);
        assert_eq!(heap.minimum_free_ever, 12_000_000 * 1024);
    }

    #[test]
    fn test_minimum_tracks_lowest_reading() {
        let mut fs = MockFs::threaded_process();
        fs.add_file("/proc/meminfo", "MemTotal: 1000 kB\nMemAvailable: 300 kB\n");
        let metrics = ProcfsMetrics::new(fs, "/proc");
        assert_eq!(metrics.heap_minimum_free(), 300 * 1024);

        let mut fs = MockFs::threaded_process();
        fs.add_file("/proc/meminfo", "MemTotal: 1000 kB\nMemAvailable: 700 kB\n");
        let metrics = ProcfsMetrics {
            fs,
            proc_path: "/proc".into(),
            started: Instant::now(),
            minimum_free: AtomicU64::new(300 * 1024),
        };
        let heap = metrics.heap();
        assert_eq!(heap.free, 700 * 1024);
        assert_eq!(heap.minimum_free_ever, 300 * 1024);
    }

    #[test]
    fn test_uptime() {
        let metrics = ProcfsMetrics::new(MockFs::threaded_process(), "/proc");
        assert_eq!(metrics.now_us(), 12_345_670_000);
    }

    #[test]
    fn test_malformed_uptime_falls_back_to_own_clock() {
        let mut fs = MockFs::threaded_process();
        fs.add_file("/proc/uptime", "12.12345\u{e9} 3\n");
        let metrics = ProcfsMetrics::new(fs, "/proc");
        assert!(metrics.now_us() < 60_000_000);
    }

    #[test]
    fn test_missing_files_read_as_zero() {
        let metrics = ProcfsMetrics::new(MockFs::new(), "/proc");
        let heap = metrics.heap();
        assert_eq!(heap.total, 0);
        assert_eq!(heap.free, 0);
        assert!(metrics.now_us() < 60_000_000);
    }
}
