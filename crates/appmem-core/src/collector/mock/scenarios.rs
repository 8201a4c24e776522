//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` states of a Chromium-style
//! multi-process application running next to unrelated system processes.

use super::filesystem::MockFs;

/// Pid of the browser process in [`MockFs::electron_app`].
pub const ELECTRON_BROWSER_PID: u32 = 900;

fn stat_line(pid: u32, comm: &str, state: char, ppid: u32) -> String {
    format!(
        "{pid} ({comm}) {state} {ppid} {pid} {ppid} 0 -1 4194560 5000 0 0 0 100 50 0 0 20 0 12 0 100000 1500000000 30000 18446744073709551615 0 0 0 0 0 0 0 4096 0 0 0 0 17 2 0 0 0 0 0 0 0 0 0 0 0 0 0"
    )
}

fn status_text(name: &str, pid: u32, ppid: u32, rss_kb: u64, hwm_kb: u64) -> String {
    format!(
        "\
Name:\t{name}
State:\tS (sleeping)
Pid:\t{pid}
PPid:\t{ppid}
Uid:\t1000\t1000\t1000\t1000
Gid:\t1000\t1000\t1000\t1000
VmPeak:\t 1600000 kB
VmSize:\t 1500000 kB
VmHWM:\t  {hwm_kb} kB
VmRSS:\t  {rss_kb} kB
VmData:\t   90000 kB
VmStk:\t     136 kB
VmSwap:\t       0 kB
Threads:\t12
voluntary_ctxt_switches:\t500
nonvoluntary_ctxt_switches:\t50
"
    )
}

impl MockFs {
    /// Adds a process whose `status` reports the given memory figures.
    pub fn add_app_process(
        &mut self,
        pid: u32,
        ppid: u32,
        comm: &str,
        cmdline: &[&str],
        rss_kb: u64,
        hwm_kb: u64,
    ) {
        let mut cmdline = cmdline.join("\0");
        cmdline.push('\0');
        self.add_process(
            pid,
            &stat_line(pid, comm, 'S', ppid),
            &status_text(comm, pid, ppid, rss_kb, hwm_kb),
            &cmdline,
        );
    }

    /// Creates an Electron application with its helper processes.
    ///
    /// Tree: bash (850) -> browser (900) -> {zygote (905), gpu (910),
    /// network utility (915)}; zygote -> renderers (920, 1200).
    /// PIDs 1 and 850 do not belong to the application.
    ///
    /// Working sets sum to 355000 KiB, peaks to 418000 KiB.
    pub fn electron_app() -> Self {
        let mut fs = Self::new();

        fs.add_app_process(1, 0, "systemd", &["/sbin/init"], 12000, 14000);
        fs.add_app_process(850, 1, "bash", &["/bin/bash", "--login"], 8000, 9000);

        fs.add_app_process(
            ELECTRON_BROWSER_PID,
            850,
            "electron",
            &["/opt/app/electron", "--no-sandbox", "."],
            120000,
            150000,
        );
        fs.add_app_process(
            905,
            900,
            "electron",
            &["/opt/app/electron", "--type=zygote", "--no-zygote-sandbox"],
            20000,
            22000,
        );
        fs.add_app_process(
            910,
            900,
            "electron",
            &[
                "/opt/app/electron",
                "--type=gpu-process",
                "--gpu-preferences=UAAAAAAAAAAgAAAEAAAAAAAAAAAAAAAAAABgAAAAAAA",
            ],
            80000,
            95000,
        );
        fs.add_app_process(
            915,
            900,
            "electron",
            &[
                "/opt/app/electron",
                "--type=utility",
                "--utility-sub-type=network.mojom.NetworkService",
                "--lang=en-US",
            ],
            30000,
            31000,
        );
        fs.add_app_process(
            920,
            905,
            "electron",
            &[
                "/opt/app/electron",
                "--type=renderer",
                "--renderer-client-id=4",
            ],
            60000,
            70000,
        );
        fs.add_app_process(
            1200,
            905,
            "electron",
            &[
                "/opt/app/electron",
                "--type=renderer",
                "--renderer-client-id=5",
            ],
            45000,
            50000,
        );

        // Seen from the browser
        fs.add_file(
            "/proc/self/stat",
            &stat_line(ELECTRON_BROWSER_PID, "electron", 'S', 850),
        );

        fs
    }

    /// Electron application with a renderer that already exited but was not
    /// reaped yet. Zombies have no `VmRSS`/`VmHWM` lines in `status`.
    pub fn electron_app_with_zombie() -> Self {
        let mut fs = Self::electron_app();

        fs.add_process(
            1300,
            &stat_line(1300, "electron", 'Z', 905),
            "\
Name:\telectron
State:\tZ (zombie)
Pid:\t1300
PPid:\t905
Threads:\t1
",
            "",
        );

        fs
    }

    /// Electron application with a renderer that disappeared between the
    /// directory listing and reading its files.
    pub fn electron_app_with_vanished_child() -> Self {
        let mut fs = Self::electron_app();
        fs.add_dir("/proc/1250");
        fs
    }
}
