//! Runs one machine per active view and exposes it to presentation code.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use kafkawatch_types::TimeDuration;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::kind::MetricsKind;
use crate::machine::{Effect, Event, Machine};
use crate::port::{FetchTarget, MetricsFetchPort};
use crate::view::MetricsView;

/// Owner of one running machine.
///
/// Events are queued and applied strictly in submission order by a single
/// task. Fetches run in their own tasks and post their result back into the
/// queue, tagged with the selection they were launched for.
///
/// Dropping the service disposes it: results that arrive afterwards are
/// discarded without touching the machine.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use kafkawatch_sync::{Credentials, DiskSpace, FetchTarget, MachineService, MetricsFetchPort};
/// use kafkawatch_types::{DiskSpaceSelection, TimeDuration};
///
/// # async fn demo(port: Arc<dyn MetricsFetchPort<DiskSpace>>) {
/// let target = FetchTarget::new("kafka-1", "https://api.example.com", Credentials::bearer("t"));
/// let service = MachineService::spawn(port, target, DiskSpaceSelection::default());
///
/// let mut views = service.subscribe();
/// service.on_duration_change(TimeDuration::OneDay);
/// let view = views.wait_for(|v| v.is_settled()).await.unwrap().clone();
/// println!("disk samples: {}", view.data.len());
/// # }
/// ```
#[derive(Debug)]
pub struct MachineService<K: MetricsKind> {
    events: mpsc::UnboundedSender<Event<K>>,
    view: watch::Receiver<MetricsView<K>>,
    active: Arc<AtomicBool>,
    stop: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<K: MetricsKind> MachineService<K> {
    /// Start a machine and its initial fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        port: Arc<dyn MetricsFetchPort<K>>,
        target: FetchTarget,
        selection: K::Selection,
    ) -> Self {
        let machine = Machine::new(selection);
        let (view_tx, view_rx) = watch::channel(MetricsView::from_machine(&machine));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        let active = Arc::new(AtomicBool::new(true));

        let driver = Driver {
            machine,
            port,
            target,
            inbox: events_rx,
            outbox: events_tx.clone(),
            view: view_tx,
            active: Arc::clone(&active),
        };
        let task = tokio::spawn(driver.run(stop_rx));

        Self {
            events: events_tx,
            view: view_rx,
            active,
            stop: stop_tx,
            task: Mutex::new(Some(task)),
        }
    }

    /// Current view.
    pub fn read(&self) -> MetricsView<K> {
        self.view.borrow().clone()
    }

    /// A receiver notified whenever the view changes.
    pub fn subscribe(&self) -> watch::Receiver<MetricsView<K>> {
        self.view.clone()
    }

    /// Queue an event. A no-op once disposed.
    pub fn send(&self, event: Event<K>) {
        if !self.is_active() {
            return;
        }
        let _ = self.events.send(event);
    }

    pub fn on_duration_change(&self, duration: TimeDuration) {
        self.send(Event::SelectDuration(duration));
    }

    pub fn on_topic_change(&self, topic: Option<String>) {
        self.send(Event::SelectTopic(topic));
    }

    pub fn on_refresh(&self) {
        self.send(Event::Refresh);
    }

    /// False once the service has been disposed.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stop processing events. Idempotent.
    pub fn dispose(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            debug!(kind = K::NAME, "disposing metrics machine");
        }
        let _ = self.stop.send(true);
    }

    /// Dispose and wait for the machine task to finish.
    pub async fn shutdown(self) {
        self.dispose();
        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

impl<K: MetricsKind> Drop for MachineService<K> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// The task-side half of a service.
struct Driver<K: MetricsKind> {
    machine: Machine<K>,
    port: Arc<dyn MetricsFetchPort<K>>,
    target: FetchTarget,
    inbox: mpsc::UnboundedReceiver<Event<K>>,
    outbox: mpsc::UnboundedSender<Event<K>>,
    view: watch::Sender<MetricsView<K>>,
    active: Arc<AtomicBool>,
}

impl<K: MetricsKind> Driver<K> {
    async fn run(mut self, mut stop: watch::Receiver<bool>) {
        info!(
            kind = K::NAME,
            instance = %self.target.instance_id,
            "metrics machine started"
        );

        let initial = self.machine.start();
        self.perform(initial);

        loop {
            tokio::select! {
                biased;

                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }

                Some(event) = self.inbox.recv() => {
                    let mut effects = self.apply(event);
                    // Apply the rest of the burst before launching anything,
                    // so a fetch always carries the newest selection.
                    while let Ok(event) = self.inbox.try_recv() {
                        effects.extend(self.apply(event));
                    }
                    self.perform(effects);
                }
            }
        }

        debug!(kind = K::NAME, "metrics machine stopped");
    }

    fn apply(&mut self, event: Event<K>) -> Vec<Effect> {
        if !self.active.load(Ordering::Acquire) {
            return Vec::new();
        }

        let effects = self.machine.send(event);
        let next = MetricsView::from_machine(&self.machine);
        self.view.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        effects
    }

    fn perform(&self, effects: Vec<Effect>) {
        let mut fetch = false;
        for effect in effects {
            match effect {
                Effect::Fetch => fetch = true,
                Effect::ScheduleRetry(delay) => self.schedule_retry(delay),
            }
        }
        if fetch {
            self.launch_fetch();
        }
    }

    fn launch_fetch(&self) {
        let selection = self.machine.context().selection.clone();
        let request = K::request(&self.target, &selection);
        let port = Arc::clone(&self.port);
        let outbox = self.outbox.clone();
        let active = Arc::clone(&self.active);

        debug!(
            kind = K::NAME,
            duration = %request.time_duration,
            topic = ?request.selected_topic,
            state = %self.machine.state(),
            "launching metrics fetch"
        );

        tokio::spawn(async move {
            let event = match port.fetch(request).await {
                Ok(snapshot) => Event::FetchSuccess {
                    selection,
                    snapshot,
                },
                Err(err) => {
                    warn!(kind = K::NAME, error = %err, "metrics fetch failed");
                    Event::FetchFail { selection }
                }
            };
            if active.load(Ordering::Acquire) {
                let _ = outbox.send(event);
            }
        });
    }

    fn schedule_retry(&self, delay: Duration) {
        let outbox = self.outbox.clone();
        let active = Arc::clone(&self.active);

        debug!(kind = K::NAME, ?delay, "scheduling fetch retry");

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if active.load(Ordering::Acquire) {
                let _ = outbox.send(Event::RetryElapsed);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{DiskSpace, Topics};
    use crate::machine::{State, MAX_RETRIES, RETRY_DELAY};
    use crate::port::Credentials;
    use crate::testing::ScriptedPort;
    use kafkawatch_types::{DiskSpaceSelection, DiskSpaceSnapshot, TopicSelection, TopicSnapshot};

    fn target() -> FetchTarget {
        FetchTarget::new("kafka-1", "https://api.test", Credentials::bearer("token"))
    }

    fn disk(samples: &[(u64, f64)]) -> DiskSpaceSnapshot {
        DiskSpaceSnapshot::from_samples(samples.iter().copied())
    }

    async fn wait_for_state<K: MetricsKind>(service: &MachineService<K>, state: State) -> MetricsView<K> {
        let mut views = service.subscribe();
        let view = views
            .wait_for(|v| v.state == state)
            .await
            .expect("service stopped")
            .clone();
        view
    }

    #[tokio::test(start_paused = true)]
    async fn initial_load_reaches_with_data() {
        let port = ScriptedPort::<DiskSpace>::new();
        port.reply_ok(disk(&[(1_000, 500.0)]));

        let service = MachineService::spawn(port.clone(), target(), DiskSpaceSelection::default());
        assert!(service.read().is_loading);

        let view = wait_for_state(&service, State::WithData).await;
        assert_eq!(view.data, disk(&[(1_000, 500.0)]));
        assert_eq!(port.requests().len(), 1);
        assert_eq!(port.requests()[0].instance_id, "kafka-1");
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_failure_ends_critical_after_retries() {
        let port = ScriptedPort::<DiskSpace>::new();
        let started = tokio::time::Instant::now();

        let service = MachineService::spawn(port.clone(), target(), DiskSpaceSelection::default());
        let view = wait_for_state(&service, State::CriticalFail).await;

        assert!(view.is_failed);
        assert_eq!(view.fetch_failures, MAX_RETRIES);
        assert_eq!(port.requests().len(), MAX_RETRIES as usize);
        assert!(started.elapsed() >= RETRY_DELAY * (MAX_RETRIES - 1));

        port.reply_ok(disk(&[(1_000, 1.0)]));
        service.on_refresh();
        let view = wait_for_state(&service, State::WithData).await;
        assert_eq!(view.fetch_failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_failure_keeps_data() {
        let port = ScriptedPort::<DiskSpace>::new();
        port.reply_ok(disk(&[(1_000, 500.0)]));

        let service = MachineService::spawn(port.clone(), target(), DiskSpaceSelection::default());
        wait_for_state(&service, State::WithData).await;

        port.reply_err_after(Duration::from_millis(200));
        service.on_refresh();
        let view = wait_for_state(&service, State::Refreshing).await;
        assert_eq!(view.data, disk(&[(1_000, 500.0)]));

        let view = wait_for_state(&service, State::WithData).await;
        assert_eq!(view.data, disk(&[(1_000, 500.0)]));
        assert_eq!(view.fetch_failures, 0);
        assert_eq!(port.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_selection_changes_fetches_once_with_both() {
        let port = ScriptedPort::<Topics>::new();
        let mut first = TopicSnapshot::default();
        first.topics.insert("payments".into());
        first.bytes_incoming.insert(1_000, 1.0);
        port.reply_ok(first);

        let service = MachineService::spawn(port.clone(), target(), TopicSelection::default());
        wait_for_state(&service, State::WithData).await;

        let mut second = TopicSnapshot::default();
        second.topics.insert("orders".into());
        second.bytes_incoming.insert(2_000, 2.0);
        port.reply_ok(second);

        service.on_duration_change(TimeDuration::SixHours);
        service.on_topic_change(Some("orders".into()));

        let mut views = service.subscribe();
        let view = views
            .wait_for(|v| v.state == State::WithData && v.data.topics.contains("orders"))
            .await
            .unwrap()
            .clone();

        let requests = port.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].time_duration, TimeDuration::SixHours);
        assert_eq!(requests[1].selected_topic.as_deref(), Some("orders"));
        assert_eq!(view.selection.selected_topic.as_deref(), Some("orders"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_stale_response_never_overwrites_newer_selection() {
        let port = ScriptedPort::<DiskSpace>::new();
        port.reply_ok(disk(&[(1, 1.0)]));

        let service = MachineService::spawn(port.clone(), target(), DiskSpaceSelection::default());
        wait_for_state(&service, State::WithData).await;

        port.reply_ok_after(Duration::from_secs(5), disk(&[(5, 5.0)]));
        port.reply_ok(disk(&[(7, 7.0)]));

        service.on_duration_change(TimeDuration::FiveMinutes);
        tokio::time::sleep(Duration::from_secs(1)).await;
        service.on_duration_change(TimeDuration::SevenDays);

        let mut views = service.subscribe();
        let view = views
            .wait_for(|v| v.state == State::WithData)
            .await
            .unwrap()
            .clone();

        assert_eq!(view.data, disk(&[(7, 7.0)]));
        assert_eq!(view.selection.time_duration, TimeDuration::SevenDays);

        let requests = port.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].time_duration, TimeDuration::FiveMinutes);
        assert_eq!(requests[2].time_duration, TimeDuration::SevenDays);
        assert_eq!(port.max_in_flight(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_while_loading_is_ignored() {
        let port = ScriptedPort::<DiskSpace>::new();
        port.reply_ok_after(Duration::from_millis(500), disk(&[(1, 1.0)]));

        let service = MachineService::spawn(port.clone(), target(), DiskSpaceSelection::default());
        service.on_refresh();
        service.on_topic_change(Some("ignored".into()));

        wait_for_state(&service, State::WithData).await;
        assert_eq!(port.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn results_after_dispose_are_dropped() {
        let port = ScriptedPort::<DiskSpace>::new();
        port.reply_ok_after(Duration::from_secs(2), disk(&[(1, 1.0)]));

        let service = MachineService::spawn(port.clone(), target(), DiskSpaceSelection::default());
        let views = service.subscribe();
        tokio::time::sleep(Duration::from_millis(100)).await;

        service.dispose();
        assert!(!service.is_active());
        service.on_refresh();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(views.borrow().state, State::Loading);
        assert_eq!(service.read().state, State::Loading);
        assert_eq!(port.requests().len(), 1);

        service.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn independent_services_do_not_share_state() {
        let port = ScriptedPort::<DiskSpace>::new();
        port.reply_ok(disk(&[(1, 1.0)]));
        port.reply_ok(DiskSpaceSnapshot::default());

        let a = MachineService::spawn(port.clone(), target(), DiskSpaceSelection::default());
        let a_view = wait_for_state(&a, State::WithData).await;
        let b = MachineService::spawn(port.clone(), target(), DiskSpaceSelection::default());
        let b_view = wait_for_state(&b, State::NoData).await;

        assert_eq!(a_view.data.len(), 1);
        assert!(b_view.data.is_empty());
        assert_eq!(a.read().state, State::WithData);
    }
}
