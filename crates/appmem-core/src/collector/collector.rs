//! Reduces one host query into a [`MemoryReport`].

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, warn};

use crate::collector::source::ProcessMetricsSource;
use crate::model::{MemoryReport, MemorySample};

/// Collects memory usage of all application processes.
///
/// Stateless: every call is a pure function of the host state at call time.
pub struct MetricsCollector<S: ProcessMetricsSource> {
    source: S,
}

impl<S: ProcessMetricsSource> MetricsCollector<S> {
    /// Creates a collector reading from `source`.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Returns the underlying host query.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Takes a snapshot of every application process.
    ///
    /// Processes without memory figures are reported with zero sizes. If the
    /// host query fails the report is empty.
    pub fn collect(&self) -> MemoryReport {
        let started = Instant::now();

        let metrics = match self.source.app_metrics() {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!(error = %e, "process query failed, reporting no processes");
                Vec::new()
            }
        };

        let samples: Vec<MemorySample> = metrics
            .into_iter()
            .map(|metric| {
                let memory = metric.memory.unwrap_or_default();
                MemorySample {
                    pid: metric.pid,
                    process_type: metric.process_type,
                    name: metric.name,
                    working_set_size: memory.working_set_size,
                    peak_working_set_size: memory.peak_working_set_size,
                }
            })
            .collect();

        let report = MemoryReport::from_samples(Utc::now().timestamp_millis(), samples);

        debug!(
            processes = report.processes().len(),
            total_working_set_kib = report.total_working_set_size(),
            duration_us = started.elapsed().as_micros() as u64,
            "memory metrics collected"
        );

        report
    }
}

/// Collects a single report from `source`.
pub fn collect_metrics<S: ProcessMetricsSource>(source: &S) -> MemoryReport {
    MetricsCollector::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{ELECTRON_BROWSER_PID, MockFs};
    use crate::collector::procfs::ProcfsSource;
    use crate::collector::source::{CollectError, FnSource, ProcessMetric};
    use crate::model::ProcessType;

    #[test]
    fn test_two_process_example() {
        let source = vec![
            ProcessMetric::new(1, ProcessType::Browser, 50000, 60000),
            ProcessMetric::new(2, ProcessType::Renderer, 30000, 35000).with_name("tabA"),
        ];

        let report = MetricsCollector::new(source).collect();

        assert_eq!(report.total_working_set_size(), 80000);
        assert_eq!(report.total_peak_working_set_size(), 95000);
        assert_eq!(report.processes().len(), 2);
        assert_eq!(report.processes()[0].pid, 1);
        assert_eq!(report.processes()[0].process_type, ProcessType::Browser);
        assert_eq!(report.processes()[1].pid, 2);
        assert_eq!(report.processes()[1].name.as_deref(), Some("tabA"));
    }

    #[test]
    fn test_empty_host() {
        let report = MetricsCollector::new(Vec::<ProcessMetric>::new()).collect();

        assert!(report.processes().is_empty());
        assert_eq!(report.total_working_set_size(), 0);
        assert_eq!(report.total_peak_working_set_size(), 0);
    }

    #[test]
    fn test_missing_memory_yields_zero() {
        let source = vec![
            ProcessMetric {
                pid: 7,
                process_type: ProcessType::Gpu,
                name: None,
                memory: None,
            },
            ProcessMetric::new(8, ProcessType::Utility, 100, 200),
        ];

        let report = MetricsCollector::new(source).collect();

        assert_eq!(report.processes().len(), 2);
        assert_eq!(report.processes()[0].working_set_size, 0);
        assert_eq!(report.processes()[0].peak_working_set_size, 0);
        assert_eq!(report.total_working_set_size(), 100);
        assert_eq!(report.total_peak_working_set_size(), 200);
    }

    #[test]
    fn test_failed_query_yields_empty_report() {
        struct Failing;
        impl ProcessMetricsSource for Failing {
            fn app_metrics(&self) -> Result<Vec<ProcessMetric>, CollectError> {
                Err(CollectError::Host("process table unavailable".to_string()))
            }
        }

        let report = MetricsCollector::new(Failing).collect();
        assert!(report.processes().is_empty());
        assert_eq!(report.total_working_set_size(), 0);
    }

    #[test]
    fn test_timestamp_is_wall_clock_millis() {
        let before = Utc::now().timestamp_millis();
        let report = collect_metrics(&Vec::<ProcessMetric>::new());
        let after = Utc::now().timestamp_millis();

        assert!(report.timestamp() >= before && report.timestamp() <= after);
    }

    #[test]
    fn test_membership_varies_between_cycles() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let cycle = AtomicUsize::new(0);
        let collector = MetricsCollector::new(FnSource(move || {
            let n = cycle.fetch_add(1, Ordering::SeqCst) + 1;
            (1..=n as u32)
                .map(|pid| ProcessMetric::new(pid, ProcessType::Renderer, 10, 20))
                .collect()
        }));

        for expected in 1..=3u64 {
            let report = collector.collect();
            assert_eq!(report.processes().len() as u64, expected);
            assert_eq!(report.total_working_set_size(), 10 * expected);
            assert_eq!(report.total_peak_working_set_size(), 20 * expected);
        }
    }

    #[test]
    fn test_procfs_totals_match_samples() {
        let collector = MetricsCollector::new(ProcfsSource::new(
            MockFs::electron_app_with_zombie(),
            "/proc",
            ELECTRON_BROWSER_PID,
        ));

        let report = collector.collect();

        assert_eq!(report.processes().len(), 7);
        assert_eq!(report.total_working_set_size(), 355000);
        assert_eq!(report.total_peak_working_set_size(), 418000);
        let ws_sum: u64 = report.processes().iter().map(|p| p.working_set_size).sum();
        let peak_sum: u64 = report
            .processes()
            .iter()
            .map(|p| p.peak_working_set_size)
            .sum();
        assert_eq!(report.total_working_set_size(), ws_sum);
        assert_eq!(report.total_peak_working_set_size(), peak_sum);
    }
}
