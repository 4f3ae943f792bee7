//! Threads of one Linux process presented as scheduler tasks.

use std::io;
use std::path::PathBuf;

use tracing::trace;

use super::parser::{
    affinity_from_cpu_list, parse_cpus_allowed_list, parse_thread_stat, task_state_from_letter,
};
use crate::error::CollectError;
use crate::scheduler::model::{CoreAffinity, TaskHandle, TaskRecord};
use crate::scheduler::traits::{FileSystem, SchedulerView};

/// Clock ticks per second (USER_HZ). Standard value for Linux.
const CLK_TCK: u64 = 100;
const US_PER_TICK: u64 = 1_000_000 / CLK_TCK;

/// Reads the task table of process `pid` from `/proc/[pid]/task/`.
///
/// Task numbers are thread ids, runtime counters are user + system time.
/// Stack margin is not observable from procfs and is reported as `None`.
pub struct ProcfsScheduler<F: FileSystem> {
    fs: F,
    proc_path: String,
    pid: u32,
}

impl<F: FileSystem> ProcfsScheduler<F> {
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    /// * `pid` - Process whose threads are reported
    pub fn new(fs: F, proc_path: impl Into<String>, pid: u32) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
            pid,
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// True while `/proc/[pid]` is present.
    pub fn is_alive(&self) -> bool {
        self.fs
            .exists(&PathBuf::from(format!("{}/{}", self.proc_path, self.pid)))
    }

    fn task_dir(&self) -> PathBuf {
        PathBuf::from(format!("{}/{}/task", self.proc_path, self.pid))
    }

    fn thread_ids(&self) -> io::Result<Vec<u32>> {
        let mut tids: Vec<u32> = self
            .fs
            .read_dir(&self.task_dir())?
            .iter()
            .filter_map(|p| p.file_name()?.to_str()?.parse().ok())
            .collect();
        tids.sort_unstable();
        Ok(tids)
    }

    /// Process-wide user + system ticks, which include exited threads.
    fn process_runtime_us(&self) -> Result<u64, CollectError> {
        let path = PathBuf::from(format!("{}/{}/stat", self.proc_path, self.pid));
        let content = self.fs.read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CollectError::ProcessGone(self.pid),
            _ => CollectError::Io(e),
        })?;
        let stat = parse_thread_stat(&content).map_err(|e| CollectError::Parse(e.message))?;
        Ok((stat.utime + stat.stime) * US_PER_TICK)
    }

    fn read_thread(&self, tid: u32) -> Option<TaskRecord> {
        let dir = self.task_dir().join(tid.to_string());

        let stat = match self
            .fs
            .read_to_string(&dir.join("stat"))
            .ok()
            .map(|c| parse_thread_stat(&c))
        {
            Some(Ok(stat)) => stat,
            Some(Err(e)) => {
                trace!("thread {}: {}", tid, e);
                return None;
            }
            None => {
                trace!("thread {} exited during snapshot", tid);
                return None;
            }
        };

        let name = self
            .fs
            .read_to_string(&dir.join("comm"))
            .map(|c| c.trim_end().to_string())
            .unwrap_or(stat.comm);

        Some(TaskRecord {
            handle: TaskHandle(tid as u64),
            name,
            state: task_state_from_letter(stat.state),
            core_affinity: self.affinity_of(TaskHandle(tid as u64)),
            task_number: tid,
            priority: stat.priority,
            stack_high_water_mark: None,
            runtime_counter: (stat.utime + stat.stime) * US_PER_TICK,
        })
    }
}

impl<F: FileSystem> SchedulerView for ProcfsScheduler<F> {
    fn count_live_tasks(&self) -> usize {
        self.thread_ids().map(|t| t.len()).unwrap_or(0)
    }

    fn snapshot_tasks(
        &self,
        buffer: &mut Vec<TaskRecord>,
        capacity: usize,
    ) -> Result<u64, CollectError> {
        buffer.clear();

        let process_total = self.process_runtime_us()?;
        let tids = self.thread_ids().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => CollectError::ProcessGone(self.pid),
            _ => CollectError::Io(e),
        })?;

        for tid in tids {
            if buffer.len() == capacity {
                break;
            }
            if let Some(record) = self.read_thread(tid) {
                buffer.push(record);
            }
        }

        // Thread and process counters are sampled separately.
        let live_total: u64 = buffer.iter().map(|r| r.runtime_counter).sum();
        Ok(process_total.max(live_total))
    }

    fn affinity_of(&self, task: TaskHandle) -> CoreAffinity {
        let path = self.task_dir().join(task.0.to_string()).join("status");
        self.fs
            .read_to_string(&path)
            .ok()
            .and_then(|status| {
                parse_cpus_allowed_list(&status).and_then(|l| affinity_from_cpu_list(l).ok())
            })
            .unwrap_or(CoreAffinity::Any)
    }
}
