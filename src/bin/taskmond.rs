//! taskmond - periodic task and heap reporter.
//!
//! Prints a ranked per-thread runtime report and heap summary every
//! interval, either for a live process read from /proc or for a simulated
//! dual-core scheduler.

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use taskmon::driver::{self, CycleOutcome, Monitor};
use taskmon::fmt::{FmtStyle, format_bytes, format_duration};
use taskmon::scheduler::{
    JemallocMetrics, MetricsSource, MockScheduler, ProcfsMetrics, ProcfsScheduler, RealFs,
    SchedulerView,
};
use taskmon::{MonitorConfig, RankingPolicy, ReportFormat};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Group by core affinity, then runtime descending.
    Core,
    /// Runtime descending only.
    Runtime,
}

impl From<PolicyArg> for RankingPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Core => RankingPolicy::CoreThenRuntime,
            PolicyArg::Runtime => RankingPolicy::RuntimeDescending,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Plain,
    Color,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Plain => ReportFormat::Plain,
            FormatArg::Color => ReportFormat::Color,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceArg {
    /// Threads of a live process from the /proc filesystem.
    Procfs,
    /// Built-in dual-core scheduler whose counters advance every cycle.
    Simulated,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HeapArg {
    /// Allocator statistics of this process.
    Jemalloc,
    /// System memory from /proc/meminfo.
    Meminfo,
}

/// Periodic task and heap reporter.
#[derive(Parser)]
#[command(name = "taskmond", about = "Periodic task and heap reporter", version)]
struct Args {
    /// Report interval in seconds.
    #[arg(
        short,
        long,
        default_value = "10",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval: u64,

    /// Ranking applied to the task table.
    #[arg(long, value_enum, default_value = "core")]
    policy: PolicyArg,

    /// Report output format.
    #[arg(long, value_enum, default_value = "plain")]
    format: FormatArg,

    /// Maximum number of tasks captured per snapshot.
    #[arg(long, default_value_t = MonitorConfig::DEFAULT_MAX_TASKS)]
    max_tasks: usize,

    /// Where task snapshots come from.
    #[arg(long, value_enum, default_value = "procfs")]
    source: SourceArg,

    /// Process to observe with the procfs source (defaults to this process).
    #[arg(long)]
    pid: Option<u32>,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Where heap figures come from.
    #[arg(long, value_enum, default_value = "jemalloc")]
    heap: HeapArg,

    /// Append reports to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Name of the background reporter thread.
    #[arg(long, default_value = "monitor_task")]
    thread_name: String,

    /// Print a single report and exit.
    #[arg(long)]
    once: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber on stderr so reports on stdout stay
/// clean. Default level is INFO; -q shows errors only.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("taskmond={}", level).parse().unwrap())
        .add_directive(format!("taskmon={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn open_sink(output: Option<&str>) -> io::Result<Box<dyn Write + Send>> {
    match output {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let config = MonitorConfig::new(Duration::from_secs(args.interval))
        .with_policy(args.policy.into())
        .with_format(args.format.into())
        .with_max_tasks(args.max_tasks)
        .with_thread_name(args.thread_name.as_str());

    info!("taskmond {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: interval={}, policy={:?}, format={:?}, max_tasks={}, source={:?}, heap={:?}",
        format_duration(config.interval, FmtStyle::Detail),
        config.policy,
        config.format,
        config.max_tasks,
        args.source,
        args.heap
    );

    let sink = match open_sink(args.output.as_deref()) {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!(
                "Error opening output '{}': {}",
                args.output.as_deref().unwrap_or("-"),
                e
            );
            std::process::exit(1);
        }
    };

    match args.source {
        SourceArg::Procfs => {
            let pid = args.pid.unwrap_or_else(std::process::id);
            info!("Observing threads of pid {} via {}", pid, args.proc_path);
            let scheduler = ProcfsScheduler::new(RealFs::new(), &args.proc_path, pid);
            if !scheduler.is_alive() {
                eprintln!(
                    "Error: process {} not found under {}",
                    scheduler.pid(),
                    args.proc_path
                );
                std::process::exit(1);
            }
            with_heap(&args, config, scheduler, sink);
        }
        SourceArg::Simulated => {
            let step_us = config.interval.as_micros().min(u64::MAX as u128) as u64;
            let scheduler = MockScheduler::dual_core_system().with_auto_advance(step_us);
            info!("Using simulated dual-core scheduler");
            with_heap(&args, config, scheduler, sink);
        }
    }
}

fn with_heap<S>(args: &Args, config: MonitorConfig, scheduler: S, sink: Box<dyn Write + Send>)
where
    S: SchedulerView + Send + 'static,
{
    match args.heap {
        HeapArg::Jemalloc => launch(args, config, scheduler, JemallocMetrics::new(), sink),
        HeapArg::Meminfo => {
            let metrics = ProcfsMetrics::new(RealFs::new(), &args.proc_path);
            launch(args, config, scheduler, metrics, sink)
        }
    }
}

fn launch<S, M>(
    args: &Args,
    config: MonitorConfig,
    scheduler: S,
    metrics: M,
    sink: Box<dyn Write + Send>,
) where
    S: SchedulerView + Send + 'static,
    M: MetricsSource + Send + 'static,
{
    let heap = metrics.heap();
    info!(
        "Heap: {} total, {} free",
        format_bytes(heap.total, FmtStyle::Detail),
        format_bytes(heap.free, FmtStyle::Detail)
    );

    if args.once {
        let mut monitor = Monitor::new(config, scheduler, metrics, sink);
        match monitor.run_cycle() {
            CycleOutcome::Reported { tasks } => info!("Reported {} tasks", tasks),
            CycleOutcome::InsufficientData => warn!("No runtime elapsed yet, nothing to report"),
            CycleOutcome::Skipped(e) => {
                error!("Report failed: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let handle = match driver::spawn(config, scheduler, metrics, sink) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Setup graceful shutdown
    let stop = handle.stop_token();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        stop.stop();
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    match handle.join() {
        Ok(cycles) => info!("taskmond stopped after {} cycles", cycles),
        Err(_) => {
            error!("Monitor thread panicked");
            std::process::exit(1);
        }
    }
}
