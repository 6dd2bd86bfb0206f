//! The running set of metric views for one Kafka instance.

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

use kafkawatch_sync::{
    DiskSpace, DiskSpaceService, MetricsFetchPort, MetricsKind, MetricsView, PollingDriver,
    PollingHandle, TopicService, Topics,
};
use kafkawatch_types::TimeDuration;

use crate::console::Command;
use crate::report;
use crate::settings::Settings;

/// Services for the views selected in [`Settings`].
#[derive(Debug)]
pub struct Dashboard {
    disk: Option<Arc<DiskSpaceService>>,
    topics: Option<Arc<TopicService>>,
}

impl Dashboard {
    /// Spawn one service per selected view; each starts its initial load.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        settings: &Settings,
        disk_port: Arc<dyn MetricsFetchPort<DiskSpace>>,
        topic_port: Arc<dyn MetricsFetchPort<Topics>>,
    ) -> Result<Self> {
        let target = settings.target();

        let disk = if settings.view.wants_disk() {
            let selection = settings.disk_selection()?;
            Some(Arc::new(DiskSpaceService::spawn(disk_port, target.clone(), selection)))
        } else {
            None
        };

        let topics = if settings.view.wants_topics() {
            let selection = settings.topic_selection()?;
            Some(Arc::new(TopicService::spawn(topic_port, target, selection)))
        } else {
            None
        };

        info!(instance = %settings.instance, view = settings.view.as_str(), "Dashboard started");
        Ok(Self { disk, topics })
    }

    pub fn disk(&self) -> Option<&DiskSpaceService> {
        self.disk.as_deref()
    }

    pub fn topics(&self) -> Option<&TopicService> {
        self.topics.as_deref()
    }

    /// Refresh every view.
    pub fn refresh(&self) {
        if let Some(disk) = &self.disk {
            disk.on_refresh();
        }
        if let Some(topics) = &self.topics {
            topics.on_refresh();
        }
    }

    /// Change the window of every view.
    pub fn select_duration(&self, duration: TimeDuration) {
        if let Some(disk) = &self.disk {
            disk.on_duration_change(duration);
        }
        if let Some(topics) = &self.topics {
            topics.on_duration_change(duration);
        }
    }

    /// Narrow the topics view to one topic, or `None` for all.
    pub fn select_topic(&self, topic: Option<String>) {
        if let Some(topics) = &self.topics {
            topics.on_topic_change(topic);
        }
    }

    /// Apply a console command. Returns `false` when the user asked to quit.
    pub fn apply(&self, command: Command) -> bool {
        match command {
            Command::Refresh => self.refresh(),
            Command::Duration(duration) => self.select_duration(duration),
            Command::Topic(topic) => self.select_topic(topic),
            Command::Help => {}
            Command::Quit => return false,
        }
        true
    }

    /// Refresh all views on every visible poll tick.
    pub fn start_polling(&self, driver: PollingDriver) -> PollingHandle {
        let disk = self.disk.clone();
        let topics = self.topics.clone();
        driver.spawn(move || {
            if let Some(disk) = &disk {
                disk.on_refresh();
            }
            if let Some(topics) = &topics {
                topics.on_refresh();
            }
        })
    }

    /// Current status line of every view.
    pub fn status_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(disk) = &self.disk {
            lines.push(report::disk_line(&disk.read()));
        }
        if let Some(topics) = &self.topics {
            lines.push(report::topic_line(&topics.read()));
        }
        lines
    }

    /// Stream a status line whenever a view's line changes.
    ///
    /// The current lines are sent first.
    pub fn watch_lines(&self) -> (mpsc::UnboundedReceiver<String>, Vec<JoinHandle<()>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut tasks = Vec::new();
        if let Some(disk) = &self.disk {
            tasks.push(forward_lines(disk.subscribe(), tx.clone(), report::disk_line));
        }
        if let Some(topics) = &self.topics {
            tasks.push(forward_lines(topics.subscribe(), tx, report::topic_line));
        }
        (rx, tasks)
    }

    /// Wait until no view is loading or refreshing.
    pub async fn settled(&self) {
        if let Some(disk) = &self.disk {
            wait_settled(disk.subscribe()).await;
        }
        if let Some(topics) = &self.topics {
            wait_settled(topics.subscribe()).await;
        }
    }

    /// The current views as JSON.
    pub fn export(&self) -> serde_json::Value {
        json!({
            "disk_space": self.disk.as_ref().map(|s| s.read()),
            "topics": self.topics.as_ref().map(|s| s.read()),
        })
    }

    /// Dispose every view and wait for their tasks where possible.
    pub async fn shutdown(self) {
        if let Some(disk) = self.disk {
            shutdown_service(disk).await;
        }
        if let Some(topics) = self.topics {
            shutdown_service(topics).await;
        }
        info!("Dashboard stopped");
    }
}

fn forward_lines<K: MetricsKind>(
    mut views: watch::Receiver<MetricsView<K>>,
    tx: mpsc::UnboundedSender<String>,
    render: fn(&MetricsView<K>) -> String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last = String::new();
        loop {
            let line = render(&views.borrow_and_update());
            if line != last {
                if tx.send(line.clone()).is_err() {
                    break;
                }
                last = line;
            }
            if views.changed().await.is_err() {
                break;
            }
        }
    })
}

async fn wait_settled<K: MetricsKind>(mut views: watch::Receiver<MetricsView<K>>) {
    let _ = views.wait_for(|view| view.is_settled()).await;
}

async fn shutdown_service<K: MetricsKind>(service: Arc<kafkawatch_sync::MachineService<K>>) {
    match Arc::try_unwrap(service) {
        Ok(service) => service.shutdown().await,
        // Still shared with the poller; disposing stops it all the same.
        Err(shared) => shared.dispose(),
    }
}
