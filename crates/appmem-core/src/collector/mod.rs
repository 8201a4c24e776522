//! Memory metrics collection for multi-process applications.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     MetricsCollector                     │
//! │         collect() -> MemoryReport (sums, timestamp)      │
//! └─────────────────────────────┬────────────────────────────┘
//!                               │
//!                   ┌───────────▼───────────┐
//!                   │ ProcessMetricsSource  │ (trait)
//!                   └───────────┬───────────┘
//!              ┌────────────────┼────────────────┐
//!              │                │                │
//!       ┌──────▼──────┐  ┌──────▼──────┐  ┌──────▼──────┐
//!       │ ProcfsSource│  │  FnSource   │  │ Vec<Metric> │
//!       │ (/proc tree)│  │ (host query)│  │  (fixed)    │
//!       └──────┬──────┘  └─────────────┘  └─────────────┘
//!              │
//!       ┌──────▼──────┐
//!       │ FileSystem  │ (trait: RealFs, MockFs)
//!       └─────────────┘
//! ```
//!
//! # Usage
//!
//! ## Production (Linux)
//!
//! ```ignore
//! use appmem_core::collector::{MetricsCollector, ProcfsSource, RealFs};
//!
//! let source = ProcfsSource::new(RealFs::new(), "/proc", browser_pid);
//! let report = MetricsCollector::new(source).collect();
//! ```
//!
//! ## Testing (with MockFs)
//!
//! ```
//! use appmem_core::collector::mock::{ELECTRON_BROWSER_PID, MockFs};
//! use appmem_core::collector::{MetricsCollector, ProcfsSource};
//!
//! let source = ProcfsSource::new(MockFs::electron_app(), "/proc", ELECTRON_BROWSER_PID);
//! let report = MetricsCollector::new(source).collect();
//! assert_eq!(report.processes().len(), 6);
//! ```

#[allow(clippy::module_inception)]
mod collector;
pub mod mock;
pub mod procfs;
mod source;
pub mod traits;

pub use collector::{MetricsCollector, collect_metrics};
pub use mock::MockFs;
pub use procfs::ProcfsSource;
pub use source::{CollectError, FnSource, ProcessMemory, ProcessMetric, ProcessMetricsSource};
pub use traits::{FileSystem, RealFs};
