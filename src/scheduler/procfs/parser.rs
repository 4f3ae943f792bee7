//! Parsers for the `/proc` files read by the procfs source.
//!
//! Pure functions over file contents so they can be tested with strings.

use crate::scheduler::model::{CoreAffinity, TaskState};

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Fields of `/proc/[pid]/task/[tid]/stat` used for task records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadStat {
    pub tid: u32,
    pub comm: String,
    pub state: char,
    /// User time in clock ticks.
    pub utime: u64,
    /// System time in clock ticks.
    pub stime: u64,
    pub priority: i32,
}

/// Parses a `stat` line.
///
/// The comm field may contain spaces and parentheses, so fields are
/// located relative to the last `)`.
pub fn parse_thread_stat(content: &str) -> Result<ThreadStat, ParseError> {
    let content = content.trim();

    let open_paren = content
        .find('(')
        .ok_or_else(|| ParseError::new("missing '(' in stat"))?;
    let close_paren = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in stat"))?;
    if close_paren <= open_paren {
        return Err(ParseError::new("invalid parentheses in stat"));
    }

    let tid: u32 = content[..open_paren]
        .trim()
        .parse()
        .map_err(|_| ParseError::new("invalid tid"))?;
    let comm = content[open_paren + 1..close_paren].to_string();

    let fields: Vec<&str> = content[close_paren + 1..].split_whitespace().collect();
    if fields.len() < 16 {
        return Err(ParseError::new(format!(
            "not enough fields in stat: expected 16+, got {}",
            fields.len()
        )));
    }

    let parse_u64 = |idx: usize, name: &str| -> Result<u64, ParseError> {
        fields[idx]
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {}", name)))
    };

    Ok(ThreadStat {
        tid,
        comm,
        state: fields[0].chars().next().unwrap_or('?'),
        utime: parse_u64(11, "utime")?,
        stime: parse_u64(12, "stime")?,
        priority: fields[15]
            .parse()
            .map_err(|_| ParseError::new("invalid priority"))?,
    })
}

/// Maps a Linux scheduler state letter onto a task state.
///
/// Linux does not separate ready from running, so `R` is reported as
/// running.
pub fn task_state_from_letter(state: char) -> TaskState {
    match state {
        'R' => TaskState::Running,
        'S' | 'D' | 'I' | 'W' => TaskState::Blocked,
        'T' | 't' => TaskState::Suspended,
        'Z' | 'X' | 'x' => TaskState::Deleted,
        other => TaskState::Unknown(u8::try_from(u32::from(other)).unwrap_or(u8::MAX)),
    }
}

/// Extracts the `Cpus_allowed_list` value from a `status` body.
pub fn parse_cpus_allowed_list(status: &str) -> Option<&str> {
    status.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == "Cpus_allowed_list").then(|| value.trim())
    })
}

/// Converts a cpu list such as `"2"`, `"0-3"` or `"1,4-5"` to an affinity.
///
/// Exactly one allowed CPU means pinned; anything wider is unpinned.
pub fn affinity_from_cpu_list(list: &str) -> Result<CoreAffinity, ParseError> {
    let mut single: Option<u32> = None;
    let mut count = 0usize;

    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((a, b)) => (parse_cpu(a)?, parse_cpu(b)?),
            None => {
                let cpu = parse_cpu(part)?;
                (cpu, cpu)
            }
        };
        if end < start {
            return Err(ParseError::new(format!("invalid cpu range '{}'", part)));
        }
        count += (end - start) as usize + 1;
        single = Some(start);
    }

    match (count, single) {
        (1, Some(cpu)) => Ok(CoreAffinity::Core(cpu)),
        (0, _) => Err(ParseError::new("empty cpu list")),
        _ => Ok(CoreAffinity::Any),
    }
}

fn parse_cpu(s: &str) -> Result<u32, ParseError> {
    s.trim()
        .parse()
        .map_err(|_| ParseError::new(format!("invalid cpu '{}'", s)))
}

/// Memory totals from `/proc/meminfo`, in kB.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_available: u64,
}

/// Parses `/proc/meminfo` content.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let mut info = MemInfo::default();

    let parse_kb = |line: &str| -> u64 {
        line.split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    };

    for line in content.lines() {
        if line.starts_with("MemTotal:") {
            info.mem_total = parse_kb(line);
        } else if line.starts_with("MemAvailable:") {
            info.mem_available = parse_kb(line);
        }
    }

    if info.mem_total == 0 {
        return Err(ParseError::new("MemTotal missing from meminfo"));
    }
    Ok(info)
}

/// Parses `/proc/uptime` into microseconds.
pub fn parse_uptime_us(content: &str) -> Result<u64, ParseError> {
    let first = content
        .split_whitespace()
        .next()
        .ok_or_else(|| ParseError::new("empty uptime"))?;
    let (secs, frac) = first.split_once('.').unwrap_or((first, "0"));
    let secs: u64 = secs
        .parse()
        .map_err(|_| ParseError::new("invalid uptime seconds"))?;

    // Fraction is in hundredths on Linux; scale whatever precision is given.
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new("invalid uptime fraction"));
    }
    let digits = frac.len().min(6);
    let frac_value: u64 = if digits == 0 {
        0
    } else {
        frac[..digits]
            .parse()
            .map_err(|_| ParseError::new("invalid uptime fraction"))?
    };
    let frac_us = frac_value * 10u64.pow((6 - digits) as u32);

    secs.checked_mul(1_000_000)
        .and_then(|us| us.checked_add(frac_us))
        .ok_or_else(|| ParseError::new("uptime out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::mock::thread_stat;

    #[test]
    fn test_parse_thread_stat_basic() {
        let content = "1234 (bash) S 1233 1234 1234 34816 1235 4194304 5000 50000 10 20 100 50 200 100 20 0 1 0 100000 25000000 2000 18446744073709551615 0 0 0 0 0 0 65536 3670020 1266777851 0 0 0 17 2 0 0 5 0 0 0 0 0 0 0 0 0 0";
        let stat = parse_thread_stat(content).unwrap();

        assert_eq!(stat.tid, 1234);
        assert_eq!(stat.comm, "bash");
        assert_eq!(stat.state, 'S');
        assert_eq!(stat.utime, 100);
        assert_eq!(stat.stime, 50);
        assert_eq!(stat.priority, 20);
    }

    #[test]
    fn test_parse_thread_stat_with_parentheses_in_comm() {
        let stat = parse_thread_stat(&thread_stat(77, "pool (io)", 'R', 5, 6, -2)).unwrap();
        assert_eq!(stat.comm, "pool (io)");
        assert_eq!(stat.state, 'R');
        assert_eq!(stat.priority, -2);
    }

    #[test]
    fn test_parse_thread_stat_truncated() {
        let err = parse_thread_stat("12 (x) S 1 2 3").unwrap_err();
        assert!(err.message.contains("not enough fields"));
        assert!(parse_thread_stat("garbage").is_err());
    }

    #[test]
    fn test_task_state_from_letter() {
        assert_eq!(task_state_from_letter('R'), TaskState::Running);
        assert_eq!(task_state_from_letter('S'), TaskState::Blocked);
        assert_eq!(task_state_from_letter('D'), TaskState::Blocked);
        assert_eq!(task_state_from_letter('T'), TaskState::Suspended);
        assert_eq!(task_state_from_letter('Z'), TaskState::Deleted);
    }

    #[test]
    fn test_unrecognized_state_letter_is_unknown() {
        let state = task_state_from_letter('?');
        assert_eq!(state, TaskState::Unknown(b'?'));
        assert_eq!(state.label(), "Unknown state");

        let wide = task_state_from_letter('\u{e9}');
        assert_eq!(wide, TaskState::Unknown(0xe9));
        assert_eq!(task_state_from_letter('\u{263a}'), TaskState::Unknown(u8::MAX));
    }

    #[test]
    fn test_affinity_from_cpu_list() {
        assert_eq!(affinity_from_cpu_list("2").unwrap(), CoreAffinity::Core(2));
        assert_eq!(affinity_from_cpu_list("5-5").unwrap(), CoreAffinity::Core(5));
        assert_eq!(affinity_from_cpu_list("0-3").unwrap(), CoreAffinity::Any);
        assert_eq!(affinity_from_cpu_list("1,4").unwrap(), CoreAffinity::Any);
        assert!(affinity_from_cpu_list("").is_err());
        assert!(affinity_from_cpu_list("3-1").is_err());
        assert!(affinity_from_cpu_list("a").is_err());
    }

    #[test]
    fn test_parse_cpus_allowed_list() {
        let status = "Name:\tx\nCpus_allowed:\tf\nCpus_allowed_list:\t0-3\n";
        assert_eq!(parse_cpus_allowed_list(status), Some("0-3"));
        assert_eq!(parse_cpus_allowed_list("Name:\tx\n"), None);
    }

    #[test]
    fn test_parse_meminfo() {
        let content = "MemTotal:       16384000 kB\nMemFree:         8192000 kB\nMemAvailable:   12000000 kB\n";
        let info = parse_meminfo(content).unwrap();
        assert_eq!(info.mem_total, 16384000);
        assert_eq!(info.mem_available, 12000000);
        assert!(parse_meminfo("MemFree: 1 kB\n").is_err());
    }

    #[test]
    fn test_parse_uptime_us() {
        assert_eq!(parse_uptime_us("12345.67 98765.43\n").unwrap(), 12_345_670_000);
        assert_eq!(parse_uptime_us("7 1").unwrap(), 7_000_000);
        assert!(parse_uptime_us("").is_err());
    }

    #[test]
    fn test_parse_uptime_us_rejects_malformed_input() {
        let err = parse_uptime_us("12.12345\u{e9} 3").unwrap_err();
        assert!(err.message.contains("fraction"));
        assert!(parse_uptime_us("12.-5 3").is_err());

        let err = parse_uptime_us("18446744073709551615.00 1").unwrap_err();
        assert!(err.message.contains("out of range"));
    }
}
