//! Pre-built scheduler states for tests and the simulated source.

use super::filesystem::MockFs;
use super::scheduler::{MockMetrics, MockScheduler};
use crate::scheduler::model::{CoreAffinity, TaskState};

impl MockScheduler {
    /// Dual-core RTOS shortly after boot: idle tasks pinned per core,
    /// IPC and timer services, an application task and the monitor itself.
    pub fn dual_core_system() -> Self {
        let mut sched = Self::new();
        sched.add_task("main", TaskState::Blocked, CoreAffinity::Core(0), 1, 2112, 184_220);
        sched.add_task("IDLE0", TaskState::Ready, CoreAffinity::Core(0), 0, 1012, 9_402_117);
        sched.add_task("IDLE1", TaskState::Running, CoreAffinity::Core(1), 0, 1004, 9_871_530);
        sched.add_task("ipc0", TaskState::Suspended, CoreAffinity::Core(0), 24, 504, 1_206);
        sched.add_task("ipc1", TaskState::Suspended, CoreAffinity::Core(1), 24, 512, 388);
        sched.add_task("esp_timer", TaskState::Suspended, CoreAffinity::Core(0), 22, 3320, 12_044);
        sched.add_task(
            "sensor_sampler",
            TaskState::Blocked,
            CoreAffinity::Core(1),
            5,
            1460,
            251_909,
        );
        sched.add_task("monitor_task", TaskState::Running, CoreAffinity::Any, 1, 6384, 9_780);
        sched.add_task("Tmr Svc", TaskState::Blocked, CoreAffinity::Any, 1, 1412, 97);
        sched.with_total_runtime(19_750_000)
    }

    /// Three tasks across two cores with a total equal to their sum.
    pub fn small_dual_core() -> Self {
        let mut sched = Self::new();
        sched.add_simple("A", CoreAffinity::Core(0), 500);
        sched.add_simple("B", CoreAffinity::Core(1), 700);
        sched.add_simple("C", CoreAffinity::Core(0), 300);
        sched.with_total_runtime(1500)
    }

    /// Tasks exist but no runtime has elapsed yet.
    pub fn just_booted() -> Self {
        let mut sched = Self::new();
        sched.add_simple("main", CoreAffinity::Core(0), 0);
        sched.add_simple("IDLE0", CoreAffinity::Core(0), 0);
        sched.with_total_runtime(0)
    }
}

impl MockMetrics {
    /// Heap of a small microcontroller with some fragmentation history.
    pub fn typical_heap() -> Self {
        let metrics = Self::new(327_680, 251_904, 236_544);
        metrics.set_ticks(2_000);
        metrics.set_uptime_us(20_015_422);
        metrics
    }
}

/// Builds a `/proc/[tid]/stat` line with the fields the procfs source reads.
pub fn thread_stat(
    tid: u32,
    comm: &str,
    state: char,
    utime: u64,
    stime: u64,
    priority: i32,
) -> String {
    format!(
        "{tid} ({comm}) {state} 1 {tid} {tid} 0 -1 4194560 120 0 0 0 {utime} {stime} 0 0 {priority} 0 3 0 5120 9437184 512 18446744073709551615 1 1 0 0 0 0 0 4096 0 0 0 0 -1 2 0 0 0 0 0 0 0 0 0 0 0 0 0"
    )
}

/// Builds a `/proc/[tid]/status` body with name and CPU affinity.
pub fn thread_status(name: &str, tid: u32, cpus_allowed_list: &str) -> String {
    format!(
        "Name:\t{name}\nState:\tS (sleeping)\nTgid:\t4242\nPid:\t{tid}\nPPid:\t1\nThreads:\t3\nCpus_allowed:\tf\nCpus_allowed_list:\t{cpus_allowed_list}\nvoluntary_ctxt_switches:\t10\n"
    )
}

impl MockFs {
    /// Process 4242 with three threads on a four-CPU host.
    ///
    /// Thread 4243 is pinned to CPU 2, the others may run anywhere.
    pub fn threaded_process() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
",
        );
        fs.add_file("/proc/uptime", "12345.67 98765.43\n");

        // Process-wide counters include threads that already exited.
        fs.add_file("/proc/4242/stat", thread_stat(4242, "sensord", 'S', 900, 300, 20));

        fs.add_thread(
            4242,
            4242,
            &thread_stat(4242, "sensord", 'S', 250, 50, 20),
            &thread_status("sensord", 4242, "0-3"),
            "sensord\n",
        );
        fs.add_thread(
            4242,
            4243,
            &thread_stat(4243, "sampler", 'R', 400, 100, -51),
            &thread_status("sampler", 4243, "2"),
            "sampler\n",
        );
        fs.add_thread(
            4242,
            4244,
            &thread_stat(4244, "uploader", 'D', 60, 40, 20),
            &thread_status("uploader", 4244, "0-3"),
            "uploader\n",
        );

        fs
    }
}
