//! Recurring collection schedule.
//!
//! A [`MetricsTimer`] owns at most one active schedule. Starting it delivers a
//! report right away and then once per interval from a Tokio task until
//! [`MetricsTimer::stop`] is called or the timer is dropped.
//!
//! The task never keeps the process alive: Tokio drops pending tasks when the
//! runtime shuts down, so an application that returns from `main` exits even
//! with a schedule still active.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::collector::{MetricsCollector, ProcessMetricsSource};
use crate::fmt::format_interval;
use crate::model::MemoryReport;
use crate::reporter::MetricReporter;

/// Interval used when `start` is given none: four hours.
///
/// Sampling every process is not free and the data is only useful at coarse
/// granularity.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(4 * 60 * 60);

/// Reasons a schedule cannot be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The interval is zero or too large to schedule.
    InvalidInterval(Duration),
    /// `start` was called outside a Tokio runtime.
    NoRuntime,
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::InvalidInterval(interval) => {
                write!(f, "invalid metrics interval: {:?}", interval)
            }
            ScheduleError::NoRuntime => write!(f, "no Tokio runtime to run the metrics timer on"),
        }
    }
}

impl std::error::Error for ScheduleError {}

/// State shared between the owner and the timer task.
struct Shared<S: ProcessMetricsSource> {
    collector: MetricsCollector<S>,
    /// Emptied by `stop`; ticks that find it empty do nothing.
    reporter: Mutex<Option<Box<dyn MetricReporter>>>,
}

impl<S: ProcessMetricsSource> Shared<S> {
    /// Runs one collect-then-deliver cycle.
    ///
    /// Returns `false` without collecting when no reporter is installed. The
    /// slot stays locked during delivery, so once `stop` has emptied it no
    /// delivery can follow.
    fn run_cycle(&self) -> bool {
        let mut slot = self.reporter.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(reporter) = slot.as_mut() else {
            return false;
        };
        let report = self.collector.collect();
        deliver(reporter.as_mut(), report);
        true
    }

    fn set_reporter(&self, reporter: Option<Box<dyn MetricReporter>>) {
        *self.reporter.lock().unwrap_or_else(PoisonError::into_inner) = reporter;
    }
}

/// Hands `report` to the reporter, containing a panic to this cycle.
fn deliver(reporter: &mut dyn MetricReporter, report: MemoryReport) {
    let timestamp = report.timestamp();
    if panic::catch_unwind(AssertUnwindSafe(|| reporter.report(report))).is_err() {
        error!(timestamp, "memory metrics reporter panicked, report dropped");
    }
}

/// Runs a cycle at `first_tick` and every `interval` after it until the
/// reporter slot is emptied.
///
/// Ticks missed while a cycle was running are delivered back to back, so the
/// number of reports matches the elapsed time.
async fn tick_loop<S: ProcessMetricsSource + 'static>(
    shared: Arc<Shared<S>>,
    first_tick: Instant,
    interval: Duration,
) {
    let mut ticker = time::interval_at(first_tick, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
    let mut cycle_count: u64 = 0;

    loop {
        ticker.tick().await;

        // /proc reads and the reporter may block
        let cycle_shared = Arc::clone(&shared);
        let t0 = std::time::Instant::now();
        let result = task::spawn_blocking(move || cycle_shared.run_cycle()).await;
        let elapsed = t0.elapsed();

        match result {
            Ok(true) => {
                cycle_count += 1;
                debug!(
                    duration_ms = elapsed.as_millis() as u64,
                    cycle_count, "memory metrics cycle completed"
                );
            }
            Ok(false) => break,
            Err(e) => {
                error!(error = %e, "memory metrics cycle failed in spawn_blocking");
                continue;
            }
        }

        if elapsed > interval / 2 {
            warn!(
                duration_ms = elapsed.as_millis() as u64,
                interval_ms = interval.as_millis() as u64,
                "memory metrics cycle exceeded 50% of interval"
            );
        }
    }
}

enum Schedule {
    Absent,
    Active {
        task: JoinHandle<()>,
        interval: Duration,
    },
}

/// Owner of the memory metrics schedule.
///
/// Construct one per application and keep it with whatever manages the
/// application lifecycle. Dropping it stops the schedule.
pub struct MetricsTimer<S: ProcessMetricsSource + 'static> {
    shared: Arc<Shared<S>>,
    schedule: Schedule,
}

impl<S: ProcessMetricsSource + 'static> MetricsTimer<S> {
    /// Creates an inactive timer around `collector`.
    pub fn new(collector: MetricsCollector<S>) -> Self {
        Self {
            shared: Arc::new(Shared {
                collector,
                reporter: Mutex::new(None),
            }),
            schedule: Schedule::Absent,
        }
    }

    /// Returns the collector driven by this timer.
    pub fn collector(&self) -> &MetricsCollector<S> {
        &self.shared.collector
    }

    /// Returns `true` while a schedule is active.
    pub fn is_active(&self) -> bool {
        matches!(self.schedule, Schedule::Active { .. })
    }

    /// Interval of the active schedule.
    pub fn interval(&self) -> Option<Duration> {
        match self.schedule {
            Schedule::Active { interval, .. } => Some(interval),
            Schedule::Absent => None,
        }
    }

    /// Starts reporting to `reporter`: once now, then every `interval`
    /// ([`DEFAULT_INTERVAL`] if `None`).
    ///
    /// If a schedule is already active this logs a warning and returns
    /// `Ok(())`; the running schedule and its reporter are kept. Must be
    /// called from within a Tokio runtime.
    pub fn start<R: MetricReporter>(
        &mut self,
        reporter: R,
        interval: Option<Duration>,
    ) -> Result<(), ScheduleError> {
        if let Schedule::Active { interval, .. } = self.schedule {
            warn!(
                interval_ms = interval.as_millis() as u64,
                "memory metrics timer is already running"
            );
            return Ok(());
        }

        let interval = interval.unwrap_or(DEFAULT_INTERVAL);
        if interval.is_zero() {
            return Err(ScheduleError::InvalidInterval(interval));
        }
        let first_tick = Instant::now()
            .checked_add(interval)
            .ok_or(ScheduleError::InvalidInterval(interval))?;
        let runtime = Handle::try_current().map_err(|_| ScheduleError::NoRuntime)?;

        self.shared.set_reporter(Some(Box::new(reporter)));
        self.shared.run_cycle();

        let task = runtime.spawn(tick_loop(Arc::clone(&self.shared), first_tick, interval));

        self.schedule = Schedule::Active { task, interval };
        info!(
            interval = %format_interval(interval),
            "memory metrics timer started"
        );
        Ok(())
    }

    /// Cancels the schedule and releases the reporter.
    ///
    /// No delivery happens after this returns. Does nothing when inactive.
    pub fn stop(&mut self) {
        if let Schedule::Active { task, .. } = std::mem::replace(&mut self.schedule, Schedule::Absent)
        {
            task.abort();
            self.shared.set_reporter(None);
            info!("memory metrics timer stopped");
        }
    }
}

impl<S: ProcessMetricsSource + 'static> Drop for MetricsTimer<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
