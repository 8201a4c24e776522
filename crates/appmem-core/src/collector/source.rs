//! Host process-metrics query.
//!
//! A [`ProcessMetricsSource`] answers "which processes belong to the
//! application right now, and how much memory does each use". The collector
//! treats it as an opaque dependency supplied by the hosting environment.

use crate::model::ProcessType;

/// Error type for a failed host query.
#[derive(Debug)]
pub enum CollectError {
    /// The application's root process is not running.
    RootGone(u32),
    /// I/O error enumerating processes.
    Io(std::io::Error),
    /// Failure reported by a host-supplied query.
    Host(String),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::RootGone(pid) => write!(f, "root process {} is not running", pid),
            CollectError::Io(e) => write!(f, "I/O error: {}", e),
            CollectError::Host(msg) => write!(f, "host query failed: {}", msg),
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

impl From<std::io::Error> for CollectError {
    fn from(e: std::io::Error) -> Self {
        CollectError::Io(e)
    }
}

/// Memory figures reported by the host for one process (KiB).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessMemory {
    pub working_set_size: u64,
    pub peak_working_set_size: u64,
}

/// One entry of the host process list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessMetric {
    pub pid: u32,
    pub process_type: ProcessType,
    pub name: Option<String>,
    /// `None` when the host has no memory data for the process.
    pub memory: Option<ProcessMemory>,
}

impl ProcessMetric {
    /// Creates an entry with memory figures.
    pub fn new(pid: u32, process_type: ProcessType, working_set: u64, peak: u64) -> Self {
        Self {
            pid,
            process_type,
            name: None,
            memory: Some(ProcessMemory {
                working_set_size: working_set,
                peak_working_set_size: peak,
            }),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Point-in-time list of the application's processes.
///
/// Implementations must be cheap and must not block on anything other than
/// the host's own process table.
pub trait ProcessMetricsSource: Send + Sync {
    /// Returns every live process of the application, in host order.
    fn app_metrics(&self) -> Result<Vec<ProcessMetric>, CollectError>;
}

impl<S: ProcessMetricsSource + ?Sized> ProcessMetricsSource for &S {
    fn app_metrics(&self) -> Result<Vec<ProcessMetric>, CollectError> {
        (**self).app_metrics()
    }
}

/// A fixed process list.
impl ProcessMetricsSource for Vec<ProcessMetric> {
    fn app_metrics(&self) -> Result<Vec<ProcessMetric>, CollectError> {
        Ok(self.clone())
    }
}

/// Adapts a host-supplied closure into a [`ProcessMetricsSource`].
pub struct FnSource<F>(pub F);

impl<F> ProcessMetricsSource for FnSource<F>
where
    F: Fn() -> Vec<ProcessMetric> + Send + Sync,
{
    fn app_metrics(&self) -> Result<Vec<ProcessMetric>, CollectError> {
        Ok((self.0)())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_source_returns_entries_in_order() {
        let source = vec![
            ProcessMetric::new(2, ProcessType::Renderer, 10, 20),
            ProcessMetric::new(1, ProcessType::Browser, 30, 40),
        ];

        let pids: Vec<u32> = source.app_metrics().unwrap().iter().map(|m| m.pid).collect();
        assert_eq!(pids, vec![2, 1]);
    }

    #[test]
    fn test_fn_source_is_queried_every_call() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let next_pid = AtomicU32::new(1);
        let source = FnSource(move || {
            let pid = next_pid.fetch_add(1, Ordering::SeqCst);
            vec![ProcessMetric::new(pid, ProcessType::Utility, 1, 1)]
        });

        assert_eq!(source.app_metrics().unwrap()[0].pid, 1);
        assert_eq!(source.app_metrics().unwrap()[0].pid, 2);
    }

    #[test]
    fn test_collect_error_display() {
        assert_eq!(
            CollectError::RootGone(900).to_string(),
            "root process 900 is not running"
        );
        let io = CollectError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(io.to_string().starts_with("I/O error"));
    }
}
