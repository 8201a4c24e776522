//! Per-process memory sample.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of a process inside a multi-process application.
///
/// The set follows the Chromium process model: one browser (main) process
/// that spawns renderers, a GPU process, utility services and a zygote.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProcessType {
    /// Main process of the application.
    Browser,
    /// Web content process.
    Renderer,
    /// GPU process.
    Gpu,
    /// Utility process (network service, audio service, ...).
    Utility,
    /// Zygote used to fork renderers on Linux.
    Zygote,
    /// Any role the host does not classify.
    #[default]
    Unknown,
}

impl ProcessType {
    /// Returns the lowercase role tag.
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessType::Browser => "browser",
            ProcessType::Renderer => "renderer",
            ProcessType::Gpu => "gpu",
            ProcessType::Utility => "utility",
            ProcessType::Zygote => "zygote",
            ProcessType::Unknown => "unknown",
        }
    }

    /// Maps a Chromium `--type=` switch value to a role.
    ///
    /// `None` means the switch is absent, which marks the browser process.
    pub fn from_switch(value: Option<&str>) -> Self {
        match value {
            None => ProcessType::Browser,
            Some("renderer") => ProcessType::Renderer,
            Some("gpu-process") => ProcessType::Gpu,
            Some("utility") => ProcessType::Utility,
            Some("zygote") => ProcessType::Zygote,
            Some(_) => ProcessType::Unknown,
        }
    }
}

impl fmt::Display for ProcessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Memory usage of a single process at collection time.
///
/// Both magnitudes are in KiB and are zero when the host did not report
/// memory figures for the process.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MemorySample {
    /// Process identifier.
    pub pid: u32,

    /// Role tag of the process.
    #[serde(rename = "type")]
    pub process_type: ProcessType,

    /// Human readable name, when the host provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Resident working set (KiB).
    /// Source: `VmRSS` in `/proc/[pid]/status` on Linux.
    pub working_set_size: u64,

    /// Highest working set since the process started (KiB).
    /// Source: `VmHWM` in `/proc/[pid]/status` on Linux.
    pub peak_working_set_size: u64,
}
