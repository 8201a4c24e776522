//! Data model for memory telemetry.
//!
//! A [`MemoryReport`] is produced once per collection cycle and owns the
//! [`MemorySample`]s observed in that cycle. Nothing here keeps history.

mod process;
mod report;

pub use process::{MemorySample, ProcessType};
pub use report::MemoryReport;
