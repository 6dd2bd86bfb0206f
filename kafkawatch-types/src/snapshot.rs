//! Payloads produced by a successful metrics fetch.

use std::collections::{BTreeMap, BTreeSet};

/// A time series keyed by Unix timestamp in milliseconds.
pub type TimeSeries = BTreeMap<u64, f64>;

/// Aggregated disk usage of a Kafka instance over a window.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct DiskSpaceSnapshot {
    /// Bytes used across all broker volumes, per timestamp.
    pub used_bytes: TimeSeries,
}

impl DiskSpaceSnapshot {
    /// Wrap a series of used-byte samples.
    pub fn new(used_bytes: TimeSeries) -> Self {
        Self { used_bytes }
    }

    /// Build a snapshot from `(timestamp_ms, bytes)` pairs.
    pub fn from_samples(samples: impl IntoIterator<Item = (u64, f64)>) -> Self {
        Self::new(samples.into_iter().collect())
    }

    /// True when no samples were returned.
    pub fn is_empty(&self) -> bool {
        self.used_bytes.is_empty()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.used_bytes.len()
    }

    /// Most recent sample, if any.
    pub fn latest(&self) -> Option<(u64, f64)> {
        self.used_bytes.iter().next_back().map(|(ts, v)| (*ts, *v))
    }
}

/// Topic traffic of a Kafka instance over a window.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TopicSnapshot {
    /// Every (non-internal) topic the instance reported.
    pub topics: BTreeSet<String>,
    /// Bytes received by the brokers, per timestamp.
    pub bytes_incoming: TimeSeries,
    /// Bytes sent by the brokers, per timestamp.
    pub bytes_outgoing: TimeSeries,
    /// Log size per topic, or per partition when a topic is selected.
    pub bytes_per_partition: BTreeMap<String, TimeSeries>,
}

impl TopicSnapshot {
    /// True when at least one byte series carries a sample.
    pub fn has_series(&self) -> bool {
        !self.bytes_incoming.is_empty()
            || !self.bytes_outgoing.is_empty()
            || self.bytes_per_partition.values().any(|s| !s.is_empty())
    }

    /// True when there are no topics and no samples.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty() && !self.has_series()
    }

    /// Total bytes received over the window.
    pub fn total_incoming(&self) -> f64 {
        self.bytes_incoming.values().sum()
    }

    /// Total bytes sent over the window.
    pub fn total_outgoing(&self) -> f64 {
        self.bytes_outgoing.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_snapshot_latest_is_highest_timestamp() {
        let snapshot = DiskSpaceSnapshot::from_samples([(3_000, 30.0), (1_000, 10.0), (2_000, 20.0)]);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.latest(), Some((3_000, 30.0)));
        assert!(DiskSpaceSnapshot::default().latest().is_none());
    }

    #[test]
    fn topic_snapshot_series_detection() {
        let mut snapshot = TopicSnapshot::default();
        assert!(snapshot.is_empty());
        assert!(!snapshot.has_series());

        snapshot.topics.insert("orders".to_string());
        assert!(!snapshot.is_empty());
        assert!(!snapshot.has_series());

        snapshot
            .bytes_per_partition
            .insert("orders".to_string(), TimeSeries::new());
        assert!(!snapshot.has_series(), "empty partition series do not count");

        snapshot.bytes_outgoing.insert(1_000, 4.0);
        assert!(snapshot.has_series());
    }

    #[test]
    fn topic_snapshot_totals() {
        let mut snapshot = TopicSnapshot::default();
        snapshot.bytes_incoming.insert(1_000, 10.0);
        snapshot.bytes_incoming.insert(2_000, 5.5);
        snapshot.bytes_outgoing.insert(1_000, 1.0);
        assert_eq!(snapshot.total_incoming(), 15.5);
        assert_eq!(snapshot.total_outgoing(), 1.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn disk_snapshot_serializes_as_plain_map() {
        let snapshot = DiskSpaceSnapshot::from_samples([(1_000, 500.0)]);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"1000":500.0}"#);
    }
}
