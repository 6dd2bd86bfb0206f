//! # kafkawatch-sync
//!
//! Keeps a dashboard's view of Kafka instance metrics in step with a remote
//! metrics API: periodic, retryable, cancel-safe fetching, and a derived view
//! that tells presentation code which of five states to show.
//!
//! ## Architecture
//!
//! ```text
//! PollingDriver ──┐
//!                 ├─▶ MachineService ──events──▶ Machine (transition)
//! user commands ──┘        │   ▲                    │
//!                          │   └──tagged results────┤ effects
//!                          ▼                        ▼
//!                   watch<MetricsView>       MetricsFetchPort
//! ```
//!
//! - [`machine`]: the pure state machine ([`transition`], [`Machine`])
//! - [`MachineService`]: runs a machine on tokio, launches fetches, exposes
//!   [`MetricsView`] through a watch channel
//! - [`PollingDriver`]: visibility-aware refresh timer
//! - [`MetricsFetchPort`]: the seam to whatever performs the HTTP query
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use kafkawatch_sync::{
//!     Credentials, FetchTarget, MachineService, MetricsFetchPort, PollingDriver, Topics,
//! };
//! use kafkawatch_types::TopicSelection;
//!
//! # async fn demo(port: Arc<dyn MetricsFetchPort<Topics>>) {
//! let target = FetchTarget::new("kafka-1", "https://api.example.com", Credentials::bearer("t"));
//! let service = Arc::new(MachineService::spawn(port, target, TopicSelection::default()));
//!
//! let refresher = Arc::clone(&service);
//! let _polling = PollingDriver::new(Duration::from_secs(300)).spawn(move || refresher.on_refresh());
//!
//! service.on_topic_change(Some("orders".to_string()));
//! let view = service.read();
//! if view.is_failed {
//!     service.on_refresh();
//! }
//! # }
//! ```

mod kind;
pub mod machine;
mod polling;
mod port;
mod service;
mod view;

#[cfg(test)]
mod testing;

pub use kind::{DiskSpace, MetricsKind, Topics};
pub use machine::{
    transition, Context, Effect, Event, Machine, State, Step, Tag, MAX_RETRIES, RETRY_DELAY,
};
pub use polling::{
    AlwaysVisible, PollingDriver, PollingHandle, Visibility, VisibilityFlag, DEFAULT_POLL_PERIOD,
    MIN_POLL_PERIOD,
};
pub use port::{Credentials, FetchError, FetchRequest, FetchTarget, MetricsFetchPort};
pub use service::MachineService;
pub use view::MetricsView;

/// Service synchronizing disk-space metrics.
pub type DiskSpaceService = MachineService<DiskSpace>;

/// Service synchronizing topic metrics.
pub type TopicService = MachineService<Topics>;
