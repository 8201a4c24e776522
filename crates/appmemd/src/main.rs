//! appmemd - Application memory telemetry daemon.
//!
//! Periodically samples the working set of an application's process tree from
//! /proc and reports it as text or JSON lines until interrupted.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::sync::Notify;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(target_os = "linux")]
use appmem_core::collector::RealFs;
#[cfg(not(target_os = "linux"))]
use appmem_core::collector::mock::{ELECTRON_BROWSER_PID, MockFs};
use appmem_core::collector::{FileSystem, MetricsCollector, ProcfsSource};
use appmem_core::fmt::format_interval;
use appmem_core::reporter::{ConsoleReporter, JsonReporter};
use appmem_core::schedule::MetricsTimer;

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Human readable summary in the log.
    Text,
    /// One JSON object per line on stdout.
    Json,
}

/// Application memory telemetry daemon.
#[derive(Parser, Debug)]
#[command(name = "appmemd", about = "Application memory telemetry daemon", version)]
struct Args {
    /// Root pid of the application; it and all of its descendants are reported.
    /// Required on Linux. Elsewhere a built-in demo process tree is used.
    #[arg(short, long, required = cfg!(target_os = "linux"))]
    pid: Option<u32>,

    /// Reporting interval in seconds.
    #[arg(short, long, env = "APPMEM_INTERVAL", default_value = "14400", value_parser = parse_interval)]
    interval: Duration,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Report output format.
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors. Text reports are still printed.
    #[arg(short, long)]
    quiet: bool,
}

/// Parses a positive number of seconds.
fn parse_interval(s: &str) -> Result<Duration, String> {
    let secs = s
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid interval '{}': {}", s, e))?;
    if secs == 0 {
        return Err("interval must be at least 1 second".to_string());
    }
    Ok(Duration::from_secs(secs))
}

/// Builds the filter directives for the crate targets.
///
/// Console reports are info-level log lines, so the reporter target stays at
/// info in quiet mode.
fn log_directives(verbose: u8, quiet: bool) -> Vec<String> {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut directives: Vec<String> = ["appmemd", "appmem_core"]
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect();
    if quiet {
        directives.push(format!("appmem_core::reporter={}", Level::INFO));
    }
    directives
}

/// Initializes the tracing subscriber. Default level is INFO, -q limits output to errors.
fn init_logging(verbose: u8, quiet: bool) {
    let mut filter = EnvFilter::from_default_env();
    for directive in log_directives(verbose, quiet) {
        match directive.parse() {
            Ok(parsed) => filter = filter.add_directive(parsed),
            Err(e) => eprintln!("invalid log directive {}: {}", directive, e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(target_os = "linux")]
fn filesystem() -> RealFs {
    RealFs::new()
}

/// Outside Linux there is no /proc, so a canned Electron-style tree is served.
#[cfg(not(target_os = "linux"))]
fn filesystem() -> MockFs {
    MockFs::electron_app()
}

#[cfg(target_os = "linux")]
fn default_pid() -> Option<u32> {
    None
}

#[cfg(not(target_os = "linux"))]
fn default_pid() -> Option<u32> {
    Some(ELECTRON_BROWSER_PID)
}

/// Runs the schedule until `shutdown` is notified.
async fn run<F: FileSystem + 'static>(
    source: ProcfsSource<F>,
    args: &Args,
    shutdown: Arc<Notify>,
) -> ExitCode {
    let mut timer = MetricsTimer::new(MetricsCollector::new(source));

    let started = match args.format {
        Format::Text => timer.start(ConsoleReporter::new(), Some(args.interval)),
        Format::Json => timer.start(JsonReporter::new(std::io::stdout()), Some(args.interval)),
    };
    if let Err(e) = started {
        error!("Failed to start memory metrics timer: {}", e);
        return ExitCode::FAILURE;
    }

    shutdown.notified().await;

    timer.stop();
    info!("appmemd stopped");
    ExitCode::SUCCESS
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    let Some(root_pid) = args.pid.or_else(default_pid) else {
        error!("--pid is required");
        return ExitCode::FAILURE;
    };
    info!("appmemd {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: pid={}, interval={}, proc={}, format={:?}",
        root_pid,
        format_interval(args.interval),
        args.proc_path,
        args.format
    );

    let fs = filesystem();
    if !appmem_core::collector::procfs::is_procfs(&fs, Path::new(&args.proc_path)) {
        warn!("{} does not look like a procfs mount", args.proc_path);
    }
    let source = ProcfsSource::new(fs, &args.proc_path, root_pid);

    let shutdown = Arc::new(Notify::new());
    let notify = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        notify.notify_one();
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    run(source, &args, shutdown).await
}
