//! Shared formatting helpers for human readable reports.
//!
//! All pure formatting functions live here; reporters only decide where the
//! text goes.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat};

use crate::model::{MemoryReport, MemorySample};

/// Format KiB as MiB with two decimals, rounding half up: `"78.13 MB"`.
///
/// Integer arithmetic keeps `x.xx5` ties exact.
pub fn format_kib_as_mb(kib: u64) -> String {
    let hundredths = (u128::from(kib) * 100 + 512) / 1024;
    format!("{}.{:02} MB", hundredths / 100, hundredths % 100)
}

/// Format epoch milliseconds as ISO-8601 UTC with millisecond precision.
///
/// Out-of-range values fall back to the raw number.
pub fn format_timestamp_ms(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| ms.to_string())
}

/// Format an interval as `"4h 0m"`, `"5m 30s"`, `"10s"` or `"250ms"`.
pub fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs == 0 {
        return format!("{}ms", interval.as_millis());
    }
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// One line per process: `- renderer (tabA) [PID 2]: 29.30 MB`.
fn format_sample(sample: &MemorySample) -> String {
    match &sample.name {
        Some(name) => format!(
            "    - {} ({}) [PID {}]: {}",
            sample.process_type,
            name,
            sample.pid,
            format_kib_as_mb(sample.working_set_size)
        ),
        None => format!(
            "    - {} [PID {}]: {}",
            sample.process_type,
            sample.pid,
            format_kib_as_mb(sample.working_set_size)
        ),
    }
}

/// Renders a report as diagnostic text lines.
pub fn render_report(report: &MemoryReport) -> Vec<String> {
    let mut lines = Vec::with_capacity(report.processes().len() + 4);
    lines.push(format!(
        "[Memory Metrics] {}",
        format_timestamp_ms(report.timestamp())
    ));
    lines.push(format!(
        "  Total Working Set: {}",
        format_kib_as_mb(report.total_working_set_size())
    ));
    lines.push(format!(
        "  Peak Working Set: {}",
        format_kib_as_mb(report.total_peak_working_set_size())
    ));
    lines.push(format!("  Processes: {}", report.processes().len()));
    lines.extend(report.processes().iter().map(format_sample));
    lines
}
