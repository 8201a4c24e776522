//! Process tree source gathering per-process memory from `/proc/[pid]/`.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::collector::procfs::parser::{
    ProcStat, parse_cmdline, parse_proc_stat, parse_proc_status, switch_value,
};
use crate::collector::source::{CollectError, ProcessMemory, ProcessMetric, ProcessMetricsSource};
use crate::collector::traits::FileSystem;
use crate::model::ProcessType;

/// Display names for well-known utility services, keyed by `--utility-sub-type`.
const UTILITY_SERVICE_NAMES: &[(&str, &str)] = &[
    ("network.mojom.NetworkService", "Network Service"),
    ("audio.mojom.AudioService", "Audio Service"),
    ("storage.mojom.StorageService", "Storage Service"),
    ("video_capture.mojom.VideoCaptureService", "Video Capture"),
    ("data_decoder.mojom.DataDecoderService", "Data Decoder Service"),
    ("node.mojom.NodeService", "Node Service"),
];

/// Reports the memory of an application's root process and all of its
/// descendants.
pub struct ProcfsSource<F: FileSystem> {
    fs: F,
    proc_path: PathBuf,
    root_pid: u32,
}

impl<F: FileSystem> ProcfsSource<F> {
    /// Creates a new procfs source.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    /// * `root_pid` - Main (browser) process of the application
    pub fn new(fs: F, proc_path: impl Into<PathBuf>, root_pid: u32) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
            root_pid,
        }
    }

    /// Returns the pid whose process tree is reported.
    pub fn root_pid(&self) -> u32 {
        self.root_pid
    }

    /// Lists numeric entries of the proc directory in ascending pid order.
    fn list_pids(&self) -> Result<Vec<u32>, CollectError> {
        let mut pids: Vec<u32> = self
            .fs
            .read_dir(&self.proc_path)?
            .iter()
            .filter_map(|entry| entry.file_name().and_then(|n| n.to_str()))
            .filter_map(|name| name.parse().ok())
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }

    fn pid_file(&self, pid: u32, name: &str) -> PathBuf {
        self.proc_path.join(pid.to_string()).join(name)
    }

    /// Reads `/proc/[pid]/stat`. Returns `None` if the process disappeared.
    fn read_stat(&self, pid: u32) -> Option<ProcStat> {
        let content = match self.fs.read_to_string(&self.pid_file(pid, "stat")) {
            Ok(content) => content,
            Err(_) => {
                trace!(pid, "process gone before stat was read");
                return None;
            }
        };
        match parse_proc_stat(&content) {
            Ok(stat) => Some(stat),
            Err(e) => {
                debug!(pid, error = %e, "skipping process with unreadable stat");
                None
            }
        }
    }

    /// Reads role, name and memory of one application process.
    fn read_metric(&self, pid: u32, is_root: bool) -> ProcessMetric {
        let cmdline = self
            .fs
            .read_to_string(&self.pid_file(pid, "cmdline"))
            .unwrap_or_default();
        let args = parse_cmdline(&cmdline);

        let process_type = match switch_value(&args, "type") {
            None if !is_root => ProcessType::Unknown,
            switch => ProcessType::from_switch(switch),
        };

        let name = if process_type == ProcessType::Utility {
            switch_value(&args, "utility-sub-type").map(utility_display_name)
        } else {
            None
        };

        let memory = self
            .fs
            .read_to_string(&self.pid_file(pid, "status"))
            .ok()
            .map(|content| parse_proc_status(&content))
            .and_then(|status| match (status.vm_rss, status.vm_hwm) {
                (None, None) => None,
                (rss, hwm) => Some(ProcessMemory {
                    working_set_size: rss.unwrap_or(0),
                    peak_working_set_size: hwm.unwrap_or(0),
                }),
            });

        if memory.is_none() {
            trace!(pid, "no memory figures reported");
        }

        ProcessMetric {
            pid,
            process_type,
            name,
            memory,
        }
    }

    /// Returns the root pid and every transitive child in `stats`.
    fn tree_members(&self, stats: &[ProcStat]) -> HashSet<u32> {
        let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
        for stat in stats {
            children.entry(stat.ppid).or_default().push(stat.pid);
        }

        let mut members = HashSet::from([self.root_pid]);
        let mut pending = vec![self.root_pid];
        while let Some(pid) = pending.pop() {
            for &child in children.get(&pid).map(Vec::as_slice).unwrap_or_default() {
                if members.insert(child) {
                    pending.push(child);
                }
            }
        }
        members
    }
}

impl<F: FileSystem> ProcessMetricsSource for ProcfsSource<F> {
    fn app_metrics(&self) -> Result<Vec<ProcessMetric>, CollectError> {
        let stats: Vec<ProcStat> = self
            .list_pids()?
            .into_iter()
            .filter_map(|pid| self.read_stat(pid))
            .collect();

        if !stats.iter().any(|stat| stat.pid == self.root_pid) {
            return Err(CollectError::RootGone(self.root_pid));
        }

        let members = self.tree_members(&stats);

        Ok(stats
            .iter()
            .filter(|stat| members.contains(&stat.pid))
            .map(|stat| self.read_metric(stat.pid, stat.pid == self.root_pid))
            .collect())
    }
}

fn utility_display_name(sub_type: &str) -> String {
    UTILITY_SERVICE_NAMES
        .iter()
        .find(|(key, _)| *key == sub_type)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| sub_type.to_string())
}

/// Returns `true` if `path` looks like a procfs mount (has `self/stat`).
pub fn is_procfs<F: FileSystem>(fs: &F, path: &Path) -> bool {
    fs.exists(&path.join("self").join("stat"))
}
