//! Heap statistics of the running process from jemalloc.

use std::ffi::CStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::scheduler::model::HeapMetrics;
use crate::scheduler::traits::MetricsSource;

/// Metrics source reading jemalloc's `stats.*` counters.
///
/// Total is the memory jemalloc has mapped, free is the mapped part not
/// handed out to the application. Clocks count from source creation.
/// Readings only describe the process when jemalloc is its global
/// allocator.
pub struct JemallocMetrics {
    started: Instant,
    minimum_free: AtomicU64,
}

impl JemallocMetrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            minimum_free: AtomicU64::new(u64::MAX),
        }
    }

    /// Returns `(mapped, allocated)` after refreshing the stats epoch.
    fn sample(&self) -> (u64, u64) {
        refresh_epoch();
        let mapped = read_size(c"stats.mapped").unwrap_or(0);
        let allocated = read_size(c"stats.allocated").unwrap_or(0);
        (mapped, allocated)
    }

    fn observe_free(&self, free: u64) -> u64 {
        self.minimum_free.fetch_min(free, Ordering::Relaxed).min(free)
    }
}

impl Default for JemallocMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Makes jemalloc publish fresh `stats.*` values.
fn refresh_epoch() {
    let mut epoch: u64 = 1;
    // SAFETY: "epoch" accepts a u64 write; newp points to a live local of
    // exactly newlen bytes and oldp/oldlenp are null.
    unsafe {
        tikv_jemalloc_sys::mallctl(
            c"epoch".as_ptr(),
            std::ptr::null_mut(),
            std::ptr::null_mut(),
            (&mut epoch as *mut u64).cast(),
            std::mem::size_of::<u64>(),
        );
    }
}

fn read_size(name: &CStr) -> Option<u64> {
    let mut value: usize = 0;
    let mut len = std::mem::size_of::<usize>();
    // SAFETY: the stats.* size counters are size_t; oldp points to a live
    // usize and oldlenp holds its size.
    let rc = unsafe {
        tikv_jemalloc_sys::mallctl(
            name.as_ptr(),
            (&mut value as *mut usize).cast(),
            &mut len,
            std::ptr::null_mut(),
            0,
        )
    };
    (rc == 0).then_some(value as u64)
}

impl MetricsSource for JemallocMetrics {
    fn heap_total(&self) -> u64 {
        self.sample().0
    }

    fn heap_free(&self) -> u64 {
        let (mapped, allocated) = self.sample();
        let free = mapped.saturating_sub(allocated);
        self.observe_free(free);
        free
    }

    fn heap_minimum_free(&self) -> u64 {
        match self.minimum_free.load(Ordering::Relaxed) {
            u64::MAX => self.heap_free(),
            minimum => minimum,
        }
    }

    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn now_us(&self) -> u64 {
        self.started.elapsed().as_micros() as u64
    }

    fn heap(&self) -> HeapMetrics {
        let (mapped, allocated) = self.sample();
        let free = mapped.saturating_sub(allocated);
        HeapMetrics {
            total: mapped,
            free,
            minimum_free_ever: self.observe_free(free),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_bounds() {
        let metrics = JemallocMetrics::new();
        let heap = metrics.heap();
        assert!(heap.free <= heap.total);
        assert!(heap.minimum_free_ever <= heap.free);
    }

    #[test]
    fn test_minimum_is_monotonic() {
        let metrics = JemallocMetrics::new();
        let first = metrics.heap_minimum_free();
        let _ = metrics.heap_free();
        assert!(metrics.heap_minimum_free() <= first);
    }

    #[test]
    fn test_clocks_advance() {
        let metrics = JemallocMetrics::new();
        let before = metrics.now_us();
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(metrics.now_us() > before);
        assert!(metrics.now_ms() >= 2);
    }
}
