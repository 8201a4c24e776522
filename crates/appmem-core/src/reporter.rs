//! Reporter contract and reference reporters.
//!
//! A reporter receives one [`MemoryReport`] per collection cycle and decides
//! what to do with it (log, transmit, persist). Reporters must not panic; the
//! schedule catches and logs a panicking reporter but skips that delivery.

use std::io::Write;

use tracing::{info, warn};

use crate::fmt::render_report;
use crate::model::MemoryReport;

/// Consumer of memory reports.
///
/// Implemented for every `FnMut(MemoryReport) + Send + 'static` closure.
pub trait MetricReporter: Send + 'static {
    /// Handles one report. Called at most once per cycle, never concurrently.
    fn report(&mut self, report: MemoryReport);
}

impl<F> MetricReporter for F
where
    F: FnMut(MemoryReport) + Send + 'static,
{
    fn report(&mut self, report: MemoryReport) {
        self(report)
    }
}

/// Writes a human readable summary through `tracing` at info level.
///
/// Sizes are converted from KiB to MiB with two decimals.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl MetricReporter for ConsoleReporter {
    fn report(&mut self, report: MemoryReport) {
        for line in render_report(&report) {
            info!("{}", line);
        }
    }
}

/// Writes each report as one JSON object per line.
///
/// Write errors are logged and the report is dropped.
pub struct JsonReporter<W: Write + Send + 'static> {
    writer: W,
}

impl<W: Write + Send + 'static> JsonReporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_report(&mut self, report: &MemoryReport) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, report)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl<W: Write + Send + 'static> MetricReporter for JsonReporter<W> {
    fn report(&mut self, report: MemoryReport) {
        if let Err(e) = self.write_report(&report) {
            warn!(error = %e, timestamp = report.timestamp(), "failed to write memory report");
        }
    }
}
