//! Aggregate report produced by one collection cycle.

use serde::Serialize;

use super::process::MemorySample;

/// Memory usage of every process of the application at one point in time.
///
/// Totals are computed on construction and always equal the sum of the
/// respective sample fields. The report cannot be modified afterwards.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MemoryReport {
    timestamp: i64,
    total_working_set_size: u64,
    total_peak_working_set_size: u64,
    processes: Vec<MemorySample>,
}

impl MemoryReport {
    /// Builds a report from samples in host enumeration order.
    ///
    /// # Arguments
    /// * `timestamp` - Capture time in milliseconds since the Unix epoch
    /// * `processes` - Samples observed in this cycle
    pub fn from_samples(timestamp: i64, processes: Vec<MemorySample>) -> Self {
        let (total_working_set_size, total_peak_working_set_size) =
            processes.iter().fold((0u64, 0u64), |(ws, peak), p| {
                (
                    ws.saturating_add(p.working_set_size),
                    peak.saturating_add(p.peak_working_set_size),
                )
            });

        Self {
            timestamp,
            total_working_set_size,
            total_peak_working_set_size,
            processes,
        }
    }

    /// Capture time in milliseconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Sum of all working set sizes (KiB).
    pub fn total_working_set_size(&self) -> u64 {
        self.total_working_set_size
    }

    /// Sum of all peak working set sizes (KiB).
    pub fn total_peak_working_set_size(&self) -> u64 {
        self.total_peak_working_set_size
    }

    /// Samples in host enumeration order.
    pub fn processes(&self) -> &[MemorySample] {
        &self.processes
    }

    /// Consumes the report, returning its samples.
    pub fn into_processes(self) -> Vec<MemorySample> {
        self.processes
    }
}
