//! Error types for snapshot sources and the periodic driver.

use std::fmt;
use std::io;

/// Error type for snapshot source failures.
#[derive(Debug)]
pub enum CollectError {
    /// Observed process disappeared during collection.
    ProcessGone(u32),
    /// I/O error reading source files.
    Io(io::Error),
    /// Parse error in source files.
    Parse(String),
}

impl fmt::Display for CollectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectError::ProcessGone(pid) => write!(f, "process {} disappeared", pid),
            CollectError::Io(e) => write!(f, "I/O error: {}", e),
            CollectError::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CollectError {
    fn from(e: io::Error) -> Self {
        CollectError::Io(e)
    }
}

/// Error type for the monitor's cycle and startup.
#[derive(Debug)]
pub enum MonitorError {
    /// Snapshot buffer for `requested` records could not be allocated.
    OutOfMemory { requested: usize },
    /// Live task count exceeds the configured snapshot bound.
    TaskLimit { live: usize, limit: usize },
    /// Background monitor thread could not be created.
    Spawn(io::Error),
    /// Snapshot source failed.
    Source(CollectError),
    /// Writing to the report sink failed.
    Sink(io::Error),
}

impl MonitorError {
    /// True for failures caused by resource exhaustion at allocation or
    /// thread creation time.
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, MonitorError::OutOfMemory { .. } | MonitorError::Spawn(_))
    }
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::OutOfMemory { requested } => write!(
                f,
                "could not allocate required memory for {} task records",
                requested
            ),
            MonitorError::TaskLimit { live, limit } => write!(
                f,
                "{} live tasks exceed snapshot limit of {}",
                live, limit
            ),
            MonitorError::Spawn(e) => write!(
                f,
                "monitor task was not created, could not allocate required memory: {}",
                e
            ),
            MonitorError::Source(e) => write!(f, "snapshot failed: {}", e),
            MonitorError::Sink(e) => write!(f, "report sink: {}", e),
        }
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MonitorError::Spawn(e) | MonitorError::Sink(e) => Some(e),
            MonitorError::Source(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CollectError> for MonitorError {
    fn from(e: CollectError) -> Self {
        MonitorError::Source(e)
    }
}
