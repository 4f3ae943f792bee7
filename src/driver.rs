//! Periodic driver: snapshot, rank, render, sleep, repeat.
//!
//! One cycle runs to completion without yielding; the only suspension
//! point is the sleep between cycles, where a [`StopToken`] is observed.
//! Every failure inside a cycle is handled locally: the cycle is skipped
//! with one diagnostic line and the next interval tries again.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::fmt::{FmtStyle, format_bytes};
use crate::rank::rank;
use crate::report::{Renderer, Report, Severity, renderer_for};
use crate::scheduler::traits::{MetricsSource, SchedulerView};
use crate::snapshot::SnapshotBuffer;

/// Granularity at which a sleeping driver checks for a stop request.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Result of a single cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// A report with `tasks` rows was written.
    Reported { tasks: usize },
    /// No runtime has elapsed yet; nothing was written.
    InsufficientData,
    /// The cycle was abandoned after writing one diagnostic line.
    Skipped(MonitorError),
}

/// Shared stop flag for a running monitor.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    stopped: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Sleeps for `duration` unless stopped first.
    ///
    /// Returns `true` when the full duration elapsed.
    pub fn sleep(&self, duration: Duration) -> bool {
        let mut remaining = duration;
        while remaining > Duration::ZERO {
            if self.is_stopped() {
                return false;
            }
            let slice = remaining.min(SLEEP_SLICE);
            thread::sleep(slice);
            remaining = remaining.saturating_sub(slice);
        }
        !self.is_stopped()
    }
}

/// The reporter: owns its sources, renderer and output sink.
pub struct Monitor<S, M, W> {
    config: MonitorConfig,
    scheduler: S,
    metrics: M,
    renderer: Box<dyn Renderer>,
    sink: W,
}

impl<S, M, W> Monitor<S, M, W>
where
    S: SchedulerView,
    M: MetricsSource,
    W: Write,
{
    pub fn new(config: MonitorConfig, scheduler: S, metrics: M, sink: W) -> Self {
        let renderer = renderer_for(config.format);
        Self {
            config,
            scheduler,
            metrics,
            renderer,
            sink,
        }
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    /// Runs one snapshot-rank-report cycle.
    ///
    /// The snapshot buffer lives only inside this call and is released on
    /// every return path.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        let live = self.scheduler.count_live_tasks();
        let buffer = match SnapshotBuffer::acquire(live, self.config.max_tasks) {
            Ok(buffer) => buffer,
            Err(e) => return self.skip(e),
        };

        let mut snapshot = match buffer.fill(&self.scheduler) {
            Ok(snapshot) => snapshot,
            Err(e) => return self.skip(e.into()),
        };

        if !snapshot.has_runtime() {
            debug!("No runtime elapsed yet, skipping report");
            return CycleOutcome::InsufficientData;
        }

        rank(&mut snapshot.tasks, self.config.policy);

        let heap = self.metrics.heap();
        debug!(
            "Snapshot: {} tasks, heap {} free of {}",
            snapshot.tasks.len(),
            format_bytes(heap.free, FmtStyle::Detail),
            format_bytes(heap.total, FmtStyle::Detail)
        );

        let timestamp_ms = self.metrics.now_ms();
        let Some(report) = Report::build(&snapshot, heap, self.metrics.now_us(), timestamp_ms)
        else {
            return CycleOutcome::InsufficientData;
        };

        let lines = self.renderer.render(&report);
        if let Err(e) = self.write_lines(&lines) {
            error!("Failed to write report: {}", e);
            return CycleOutcome::Skipped(MonitorError::Sink(e));
        }

        CycleOutcome::Reported {
            tasks: report.tasks.len(),
        }
    }

    /// Repeats cycles until `stop` is triggered. Returns the number of
    /// cycles run.
    pub fn run(&mut self, stop: &StopToken) -> u64 {
        info!(
            "Monitor loop started: interval={}s, policy={:?}, format={:?}",
            self.config.interval.as_secs_f64(),
            self.config.policy,
            self.config.format
        );

        let mut cycles: u64 = 0;
        while !stop.is_stopped() {
            cycles += 1;
            match self.run_cycle() {
                CycleOutcome::Reported { tasks } => debug!("Cycle #{}: {} tasks", cycles, tasks),
                CycleOutcome::InsufficientData => debug!("Cycle #{}: no data", cycles),
                CycleOutcome::Skipped(e) => debug!("Cycle #{}: skipped ({})", cycles, e),
            }

            if !stop.sleep(self.config.interval) {
                break;
            }
        }

        info!("Monitor loop stopped after {} cycles", cycles);
        cycles
    }

    fn skip(&mut self, err: MonitorError) -> CycleOutcome {
        match err {
            MonitorError::Source(_) => error!("Skipping cycle: {}", err),
            _ => warn!("Skipping cycle: {}", err),
        }
        let line = self
            .renderer
            .diagnostic(self.metrics.now_ms(), Severity::Error, &err.to_string());
        if let Err(e) = self.write_lines(&[line]) {
            error!("Failed to write diagnostic: {}", e);
        }
        CycleOutcome::Skipped(err)
    }

    fn write_lines(&mut self, lines: &[String]) -> io::Result<()> {
        for line in lines {
            writeln!(self.sink, "{}", line)?;
        }
        self.sink.flush()
    }
}

/// Handle to a monitor running on its own thread.
#[derive(Debug)]
pub struct MonitorHandle {
    stop: StopToken,
    thread: JoinHandle<u64>,
}

impl MonitorHandle {
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Requests the loop to end at its next sleep boundary.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Waits for the loop to end and returns the number of cycles run.
    pub fn join(self) -> thread::Result<u64> {
        self.thread.join()
    }
}

/// Starts the monitor on a dedicated background thread.
///
/// Fails with [`MonitorError::Spawn`] when the thread cannot be created;
/// nothing else is attempted in that case.
pub fn spawn<S, M, W>(
    config: MonitorConfig,
    scheduler: S,
    metrics: M,
    sink: W,
) -> Result<MonitorHandle, MonitorError>
where
    S: SchedulerView + Send + 'static,
    M: MetricsSource + Send + 'static,
    W: Write + Send + 'static,
{
    let stop = StopToken::new();
    let token = stop.clone();
    let name = config.thread_name.clone();
    let stack_size = config.stack_size;
    let mut monitor = Monitor::new(config, scheduler, metrics, sink);

    let spawned = thread::Builder::new()
        .name(name.clone())
        .stack_size(stack_size)
        .spawn(move || monitor.run(&token));

    match spawned {
        Ok(thread) => {
            info!("{}() started successfully", name);
            Ok(MonitorHandle { stop, thread })
        }
        Err(e) => {
            error!(
                "{}(): Task was not created. Could not allocate required memory: {}",
                name, e
            );
            Err(MonitorError::Spawn(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportFormat;
    use crate::scheduler::mock::{MockMetrics, MockScheduler};
    use std::io::Read;
    use std::time::Instant;

    fn monitor(
        sched: MockScheduler,
        config: MonitorConfig,
    ) -> Monitor<MockScheduler, MockMetrics, Vec<u8>> {
        Monitor::new(config, sched, MockMetrics::typical_heap(), Vec::new())
    }

    fn output_lines(sink: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(sink)
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_cycle_reports() {
        let mut m = monitor(MockScheduler::small_dual_core(), MonitorConfig::default());

        let outcome = m.run_cycle();
        assert!(matches!(outcome, CycleOutcome::Reported { tasks: 3 }));

        let lines = output_lines(m.sink());
        assert_eq!(lines.len(), 10);
        assert!(lines[0].contains("TASK NAME"));
        let order: Vec<&str> = lines[1..4]
            .iter()
            .map(|l| l.split_whitespace().nth(3).unwrap())
            .collect();
        assert_eq!(order, vec!["A", "C", "B"]);
    }

    #[test]
    fn test_runtime_policy() {
        let config =
            MonitorConfig::default().with_policy(crate::config::RankingPolicy::RuntimeDescending);
        let mut m = monitor(MockScheduler::small_dual_core(), config);
        m.run_cycle();

        let lines = output_lines(m.sink());
        let order: Vec<&str> = lines[1..4]
            .iter()
            .map(|l| l.split_whitespace().nth(3).unwrap())
            .collect();
        assert_eq!(order, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_zero_runtime_writes_nothing() {
        let mut m = monitor(MockScheduler::just_booted(), MonitorConfig::default());

        assert!(matches!(m.run_cycle(), CycleOutcome::InsufficientData));
        assert!(m.sink().is_empty());
    }

    #[test]
    fn test_allocation_failure_then_recovery() {
        let mut sched = MockScheduler::small_dual_core();
        sched.set_reported_count(Some(usize::MAX));
        let config = MonitorConfig::default().with_max_tasks(usize::MAX);
        let mut m = monitor(sched, config);

        match m.run_cycle() {
            CycleOutcome::Skipped(e) => assert!(e.is_out_of_memory()),
            other => panic!("unexpected outcome: {:?}", other),
        }
        let lines = output_lines(m.sink());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("E (20000) tm: could not allocate required memory"));

        m.scheduler_mut().set_reported_count(None);
        assert!(matches!(m.run_cycle(), CycleOutcome::Reported { tasks: 3 }));
        assert_eq!(output_lines(m.sink()).len(), 11);
    }

    #[test]
    fn test_task_limit_skips_cycle() {
        let config = MonitorConfig::default().with_max_tasks(2);
        let mut m = monitor(MockScheduler::small_dual_core(), config);

        match m.run_cycle() {
            CycleOutcome::Skipped(MonitorError::TaskLimit { live, limit }) => {
                assert_eq!((live, limit), (3, 2));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(output_lines(m.sink()).len(), 1);
    }

    #[test]
    fn test_source_failure_skips_cycle() {
        let mut sched = MockScheduler::small_dual_core();
        sched.set_failure(Some("scheduler suspended"));
        let mut m = monitor(sched, MonitorConfig::default());

        assert!(matches!(
            m.run_cycle(),
            CycleOutcome::Skipped(MonitorError::Source(_))
        ));
        let lines = output_lines(m.sink());
        assert_eq!(
            lines,
            vec!["E (20000) tm: snapshot failed: parse error: scheduler suspended".to_string()]
        );
    }

    #[test]
    fn test_json_cycle() {
        let config = MonitorConfig::default().with_format(ReportFormat::Json);
        let mut m = monitor(MockScheduler::dual_core_system(), config);
        m.run_cycle();

        let lines = output_lines(m.sink());
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["tasks"].as_array().unwrap().len(), 9);
    }

    #[test]
    fn test_run_stops_when_token_set() {
        let mut m = monitor(MockScheduler::small_dual_core(), MonitorConfig::default());
        let stop = StopToken::new();
        stop.stop();
        assert_eq!(m.run(&stop), 0);
        assert!(m.sink().is_empty());
    }

    #[test]
    fn test_sleep_interrupted() {
        let stop = StopToken::new();
        let remote = stop.clone();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.stop();
        });

        let start = Instant::now();
        assert!(!stop.sleep(Duration::from_secs(30)));
        assert!(start.elapsed() < Duration::from_secs(5));
        stopper.join().unwrap();
    }

    #[test]
    fn test_sleep_completes() {
        let stop = StopToken::new();
        assert!(stop.sleep(Duration::from_millis(5)));
    }

    #[test]
    fn test_spawn_writes_to_file_and_stops() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let sink = file.reopen().unwrap();
        let config = MonitorConfig::new(Duration::from_millis(10));

        let handle = spawn(
            config,
            MockScheduler::dual_core_system().with_auto_advance(1000),
            MockMetrics::typical_heap(),
            sink,
        )
        .unwrap();
        thread::sleep(Duration::from_millis(100));
        handle.stop();
        let cycles = handle.join().unwrap();
        assert!(cycles >= 1);

        let mut content = String::new();
        file.reopen().unwrap().read_to_string(&mut content).unwrap();
        assert!(content.contains("TASK NAME"));
        assert!(content.contains("monitor_task"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_spawn_failure_is_out_of_memory() {
        let config = MonitorConfig::default().with_stack_size(1 << 60);
        let result = spawn(
            config,
            MockScheduler::small_dual_core(),
            MockMetrics::typical_heap(),
            io::sink(),
        );
        let err = result.unwrap_err();
        assert!(matches!(err, MonitorError::Spawn(_)));
        assert!(err.is_out_of_memory());
    }
}
