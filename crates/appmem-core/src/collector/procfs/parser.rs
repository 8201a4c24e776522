//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of `/proc/[pid]/*` files
//! into structured data. They are designed to be easily testable with string inputs.

use std::collections::HashMap;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parsed data from `/proc/[pid]/stat`.
///
/// Only the leading fields needed to rebuild the process tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcStat {
    pub pid: u32,
    pub ppid: u32,
}

/// Parses `/proc/[pid]/stat` content.
///
/// The format is tricky because the comm field can contain spaces and parentheses.
/// Format: pid (comm) state ppid pgrp session tty_nr ...
pub fn parse_proc_stat(content: &str) -> Result<ProcStat, ParseError> {
    let content = content.trim();

    let open_paren = content
        .find('(')
        .ok_or_else(|| ParseError::new("missing '(' in stat"))?;
    let close_paren = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in stat"))?;

    if close_paren <= open_paren {
        return Err(ParseError::new("invalid parentheses in stat"));
    }

    let pid: u32 = content[..open_paren]
        .trim()
        .parse()
        .map_err(|_| ParseError::new("invalid pid"))?;

    // comm may hold anything, so fields are counted from the last ')'
    let mut fields = content[close_paren + 1..].split_whitespace();

    fields
        .next()
        .ok_or_else(|| ParseError::new("missing field state"))?;
    let ppid = fields
        .next()
        .ok_or_else(|| ParseError::new("missing field ppid"))?
        .parse()
        .map_err(|_| ParseError::new("invalid ppid"))?;

    Ok(ProcStat { pid, ppid })
}

/// Memory figures from `/proc/[pid]/status`.
///
/// Fields are `None` when the kernel does not print them, which is the case
/// for zombies and kernel threads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcStatus {
    /// Resident set size (kB). Source: `VmRSS`.
    pub vm_rss: Option<u64>,
    /// Peak resident set size (kB). Source: `VmHWM`.
    pub vm_hwm: Option<u64>,
}

/// Parses `/proc/[pid]/status` content.
///
/// Format is key:\tvalue pairs, one per line.
pub fn parse_proc_status(content: &str) -> ProcStatus {
    let fields: HashMap<&str, &str> = content
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect();

    // Memory fields are in kB format: "12345 kB"
    let parse_kb = |key: &str| -> Option<u64> {
        fields
            .get(key)
            .and_then(|s| s.split_whitespace().next())
            .and_then(|s| s.parse().ok())
    };

    ProcStatus {
        vm_rss: parse_kb("VmRSS"),
        vm_hwm: parse_kb("VmHWM"),
    }
}

/// Splits `/proc/[pid]/cmdline` into arguments.
///
/// Arguments are NUL separated; an empty file (zombie, kernel thread) yields
/// no arguments.
pub fn parse_cmdline(content: &str) -> Vec<&str> {
    content.split('\0').filter(|arg| !arg.is_empty()).collect()
}

/// Returns the value of a `--name=value` switch, if present.
///
/// Chromium stops parsing switches at a bare `--`.
pub fn switch_value<'a>(args: &[&'a str], name: &str) -> Option<&'a str> {
    args.iter()
        .skip(1)
        .take_while(|arg| **arg != "--")
        .find_map(|arg| {
            arg.strip_prefix("--")
                .and_then(|rest| rest.strip_prefix(name))
                .and_then(|rest| rest.strip_prefix('='))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_proc_stat_basic() {
        let stat = parse_proc_stat("900 (electron) S 850 900 850 0 -1 4194560").unwrap();
        assert_eq!(stat, ProcStat { pid: 900, ppid: 850 });
    }

    #[test]
    fn test_parse_proc_stat_with_spaces_in_comm() {
        let stat = parse_proc_stat("5000 (Web Content) S 4999 5000 5000 0 -1").unwrap();
        assert_eq!(stat, ProcStat { pid: 5000, ppid: 4999 });
    }

    #[test]
    fn test_parse_proc_stat_with_parentheses_in_comm() {
        let stat = parse_proc_stat("6000 (a) 2 (c)) R 1 6000 6000").unwrap();
        assert_eq!(stat, ProcStat { pid: 6000, ppid: 1 });
    }

    #[test]
    fn test_parse_proc_stat_errors() {
        assert!(parse_proc_stat("").is_err());
        assert!(parse_proc_stat("12 (electron)").is_err());
        assert!(parse_proc_stat("12 electron S 1").is_err());
        assert!(parse_proc_stat("x (electron) S 1").is_err());
        assert!(parse_proc_stat("12 (electron) S").is_err());
        assert!(parse_proc_stat("12 (electron) S parent").is_err());
    }

    #[test]
    fn test_parse_proc_status_memory() {
        let status = parse_proc_status(
            "Name:\telectron\nVmPeak:\t 1600000 kB\nVmHWM:\t  150000 kB\nVmRSS:\t  120000 kB\n",
        );
        assert_eq!(status.vm_rss, Some(120000));
        assert_eq!(status.vm_hwm, Some(150000));
    }

    #[test]
    fn test_parse_proc_status_zombie() {
        let status = parse_proc_status("Name:\telectron\nState:\tZ (zombie)\nThreads:\t1\n");
        assert_eq!(status.vm_rss, None);
        assert_eq!(status.vm_hwm, None);
    }

    #[test]
    fn test_parse_cmdline() {
        assert_eq!(
            parse_cmdline("/opt/app/electron\0--type=renderer\0"),
            vec!["/opt/app/electron", "--type=renderer"]
        );
        assert!(parse_cmdline("").is_empty());
    }

    #[test]
    fn test_switch_value() {
        let args = [
            "/opt/app/electron",
            "--type=utility",
            "--utility-sub-type=network.mojom.NetworkService",
        ];
        assert_eq!(switch_value(&args, "type"), Some("utility"));
        assert_eq!(
            switch_value(&args, "utility-sub-type"),
            Some("network.mojom.NetworkService")
        );
        assert_eq!(switch_value(&args, "lang"), None);
    }

    #[test]
    fn test_switch_value_ignores_program_and_positional_args() {
        let args = ["--type=renderer", "main.js", "--", "--type=gpu-process"];
        assert_eq!(switch_value(&args, "type"), None);
    }
}
