//! # kafkawatch-types
//!
//! Plain data shared by the kafkawatch metrics synchronization core: the
//! query windows a user can pick, the selections that parameterize a fetch,
//! and the snapshots a successful fetch produces.
//!
//! ## Features
//!
//! - `serde`: serialization of every type via serde. [`TimeDuration`] is
//!   encoded as its minute count.
//!
//! ## Example
//!
//! ```rust
//! use kafkawatch_types::{TimeDuration, TopicSelection, TopicSnapshot};
//!
//! let selection = TopicSelection::default().with_topic("orders");
//! assert_eq!(selection.time_duration, TimeDuration::OneHour);
//!
//! let mut snapshot = TopicSnapshot::default();
//! snapshot.topics.insert("orders".to_string());
//! snapshot.bytes_incoming.insert(1_000, 10.0);
//! assert!(snapshot.has_series());
//! ```

mod duration;
mod selection;
mod snapshot;

pub use duration::*;
pub use selection::*;
pub use snapshot::*;
