//! # kafkawatch-adapters
//!
//! Fetch ports that answer [`kafkawatch_sync::MetricsFetchPort`] by querying
//! the managed Kafka metrics API.
//!
//! ## Supported Queries
//!
//! - **Disk space** ([`DiskSpaceAdapter`]) - used bytes summed across all
//!   broker volumes
//! - **Topics** ([`TopicMetricsAdapter`]) - topic list, incoming/outgoing
//!   bytes and log size per topic or partition
//!
//! The HTTP client lives behind the `http` feature (on by default). Decoding
//! and aggregation of `query_range` responses ([`range_query`]) is always
//! available.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kafkawatch_adapters::{DiskSpaceAdapter, MetricsApiClient};
//! use kafkawatch_sync::{Credentials, FetchRequest, FetchTarget};
//! use kafkawatch_types::TimeDuration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MetricsApiClient::builder().build()?;
//!     let adapter = DiskSpaceAdapter::new(client);
//!
//!     let target = FetchTarget::new("kafka-1", "https://api.example.com", Credentials::bearer("t"));
//!     let request = FetchRequest::new(&target, TimeDuration::OneHour, None);
//!     let snapshot = adapter.collect(&request).await?;
//!
//!     println!("Collected {} samples", snapshot.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod range_query;

#[cfg(feature = "http")]
pub mod mgmt_api;

pub use error::AdapterError;

#[cfg(feature = "http")]
pub use mgmt_api::{DiskSpaceAdapter, MetricsApiClient, MetricsApiClientBuilder, TopicMetricsAdapter};

// Re-export types for convenience
pub use kafkawatch_types::{DiskSpaceSnapshot, TopicSnapshot};
