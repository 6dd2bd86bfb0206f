//! Visibility-aware periodic refresh.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

/// How often dashboards re-fetch when left open.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(5 * 60);

/// Shortest period a driver runs with; shorter ones are raised to it.
pub const MIN_POLL_PERIOD: Duration = Duration::from_millis(1);

/// Whether the consuming view is currently in the foreground.
pub trait Visibility: Send + Sync + 'static {
    fn is_foreground(&self) -> bool;
}

impl<F> Visibility for F
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    fn is_foreground(&self) -> bool {
        self()
    }
}

/// A view that is always in the foreground.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysVisible;

impl Visibility for AlwaysVisible {
    fn is_foreground(&self) -> bool {
        true
    }
}

/// A shared, switchable visibility flag.
#[derive(Debug, Clone)]
pub struct VisibilityFlag(Arc<AtomicBool>);

impl VisibilityFlag {
    pub fn new(visible: bool) -> Self {
        Self(Arc::new(AtomicBool::new(visible)))
    }

    pub fn set(&self, visible: bool) {
        self.0.store(visible, Ordering::Release);
    }
}

impl Default for VisibilityFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Visibility for VisibilityFlag {
    fn is_foreground(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Calls a refresh callback every `period` while the view is visible.
///
/// Ticks that fall while the view is hidden are dropped, not queued, and
/// ticks missed because the runtime was busy are skipped as well. The first
/// tick comes one full period after [`PollingDriver::spawn`].
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use kafkawatch_sync::{PollingDriver, VisibilityFlag};
///
/// # async fn demo() {
/// let visible = VisibilityFlag::new(true);
/// let polling = PollingDriver::new(Duration::from_secs(300))
///     .with_visibility(visible.clone())
///     .spawn(|| println!("refresh"));
///
/// visible.set(false); // stops firing until set back to true
/// polling.stop();
/// # }
/// ```
#[derive(Debug)]
pub struct PollingDriver<V = AlwaysVisible> {
    period: Duration,
    visibility: V,
}

impl PollingDriver<AlwaysVisible> {
    /// A driver with the given period that always considers the view visible.
    ///
    /// A period below [`MIN_POLL_PERIOD`] is raised to it.
    pub fn new(period: Duration) -> Self {
        if period < MIN_POLL_PERIOD {
            warn!(?period, "poll period too short, using {:?}", MIN_POLL_PERIOD);
        }
        Self {
            period: period.max(MIN_POLL_PERIOD),
            visibility: AlwaysVisible,
        }
    }
}

impl Default for PollingDriver<AlwaysVisible> {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_PERIOD)
    }
}

impl<V: Visibility> PollingDriver<V> {
    /// Replace the visibility predicate.
    pub fn with_visibility<W: Visibility>(self, visibility: W) -> PollingDriver<W> {
        PollingDriver {
            period: self.period,
            visibility,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start the timer task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(self, mut on_tick: F) -> PollingHandle
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let Self { period, visibility } = self;

        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            debug!(?period, "polling started");

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        if visibility.is_foreground() {
                            trace!("poll tick");
                            on_tick();
                        } else {
                            trace!("view hidden, skipping poll tick");
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            debug!("polling stopped");
        });

        PollingHandle { stop_tx, task }
    }
}

/// Handle for a running [`PollingDriver`].
///
/// Dropping the handle stops polling too.
#[derive(Debug)]
pub struct PollingHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollingHandle {
    /// Stop polling.
    pub fn stop(self) {
        let _ = self.stop_tx.send(true);
    }

    /// True once the timer task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
