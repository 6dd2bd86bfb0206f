//! # kafkawatch
//!
//! A headless dashboard for the disk space and topic metrics of a managed
//! Kafka instance.
//!
//! Each metric view runs as a [`kafkawatch_sync::MachineService`]; this crate
//! wires those services to the management API, a poll timer, console
//! commands, and one-line status output.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                          kafkawatch                            │
//! │  ┌──────────┐   ┌────────────┐   ┌─────────┐   ┌────────────┐  │
//! │  │ settings │──▶│ dashboard  │──▶│ report  │──▶│  stdout    │  │
//! │  │ (layers) │   │ (services) │   │ (lines) │   │            │  │
//! │  └──────────┘   └─────┬──────┘   └─────────┘   └────────────┘  │
//! │                       ▲                                        │
//! │  ┌──────────┐         │      ┌──────────────────────────────┐  │
//! │  │ console  │─────────┘      │ PollingDriver (refresh ticks)│  │
//! │  │ (stdin)  │                └──────────────────────────────┘  │
//! │  └──────────┘                                                  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Watch both views, polling every 5 minutes
//! KAFKAWATCH_TOKEN=... kafkawatch --instance kafka-1
//!
//! # Topic view over one day for a single topic
//! kafkawatch --instance kafka-1 --view topics --duration 1d --topic orders
//!
//! # Export the settled views to JSON and exit
//! kafkawatch --instance kafka-1 --export metrics.json
//! ```
//!
//! ### Parsing console commands
//!
//! ```
//! use kafkawatch::console::{parse_command, Command};
//! use kafkawatch_types::TimeDuration;
//!
//! let command = parse_command("d 7d").unwrap();
//! assert_eq!(command, Some(Command::Duration(TimeDuration::SevenDays)));
//! ```
//!
//! ### Running a dashboard
//!
//! ```no_run
//! use std::sync::Arc;
//! use kafkawatch::{Dashboard, Overrides, Settings};
//! use kafkawatch_adapters::{DiskSpaceAdapter, MetricsApiClient, TopicMetricsAdapter};
//!
//! # tokio_test::block_on(async {
//! let overrides = Overrides { instance: Some("kafka-1".into()), ..Default::default() };
//! let settings = Settings::load(None, &overrides).unwrap();
//! let client = MetricsApiClient::builder().build().unwrap();
//!
//! let dashboard = Dashboard::start(
//!     &settings,
//!     Arc::new(DiskSpaceAdapter::new(client.clone())),
//!     Arc::new(TopicMetricsAdapter::new(client)),
//! )
//! .unwrap();
//! dashboard.settled().await;
//! for line in dashboard.status_lines() {
//!     println!("{line}");
//! }
//! # });
//! ```

pub mod console;
pub mod dashboard;
pub mod period;
pub mod report;
pub mod settings;

pub use console::{parse_command, Command};
pub use dashboard::Dashboard;
pub use settings::{Overrides, Settings, ViewChoice};
