//! Process discovery from the Linux `/proc` filesystem.
//!
//! This module provides parsers for `/proc/[pid]/*` files and a
//! [`ProcfsSource`] that walks the process tree of one application.

pub mod parser;
pub mod process;

pub use process::{ProcfsSource, is_procfs};
