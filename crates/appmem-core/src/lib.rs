//! appmem-core - periodic memory telemetry for multi-process applications.
//!
//! Provides:
//! - `collector` - per-process memory query and report assembly
//! - `model` - process samples and aggregated reports
//! - `schedule` - the recurring collection timer
//! - `reporter` - report sinks (console, JSON lines, closures)
//! - `fmt` - shared formatting helpers (sizes, timestamps, intervals)

pub mod collector;
pub mod fmt;
pub mod model;
pub mod reporter;
pub mod schedule;

pub use collector::{MetricsCollector, collect_metrics};
pub use model::{MemoryReport, MemorySample, ProcessType};
pub use reporter::MetricReporter;
pub use schedule::{DEFAULT_INTERVAL, MetricsTimer, ScheduleError};
