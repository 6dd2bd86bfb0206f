//! Decoding and aggregation of `query_range` responses.
//!
//! The metrics API answers with one series per label set. These functions
//! fold those series into the snapshot shapes the sync core works with.

use std::collections::BTreeMap;

use serde::Deserialize;

use kafkawatch_types::{DiskSpaceSnapshot, TimeSeries, TopicSnapshot};

use crate::AdapterError;

/// Used bytes per broker volume.
pub const VOLUME_USED_BYTES: &str = "kubelet_volume_stats_used_bytes";
/// Bytes received per topic.
pub const TOPIC_BYTES_IN: &str = "kafka_server_brokertopicmetrics_bytes_in_total";
/// Bytes sent per topic.
pub const TOPIC_BYTES_OUT: &str = "kafka_server_brokertopicmetrics_bytes_out_total";
/// Log size per topic partition.
pub const TOPIC_LOG_SIZE: &str = "kafka_topic:kafka_log_log_size:sum";

/// Filters requested for the disk space view.
pub const DISK_SPACE_FILTERS: &[&str] = &[VOLUME_USED_BYTES];
/// Filters requested for the topics view.
pub const TOPIC_FILTERS: &[&str] = &[TOPIC_BYTES_IN, TOPIC_BYTES_OUT, TOPIC_LOG_SIZE];

const NAME_LABEL: &str = "__name__";
const TOPIC_LABEL: &str = "topic";
const PARTITION_LABEL: &str = "partition";
const INTERNAL_TOPIC_PREFIX: &str = "__";

/// Body of a `query_range` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeQueryList {
    #[serde(default)]
    pub items: Vec<RangeQuery>,
}

/// One series: its labels and samples.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    #[serde(default)]
    pub values: Vec<Sample>,
}

impl RangeQuery {
    fn label(&self, name: &str) -> Option<&str> {
        self.metric.get(name).map(String::as_str)
    }

    fn name(&self) -> Option<&str> {
        self.label(NAME_LABEL)
    }

    fn add_to(&self, series: &mut TimeSeries) {
        for sample in &self.values {
            *series.entry(sample.timestamp).or_insert(0.0) += sample.value;
        }
    }
}

/// A single `(timestamp, value)` point.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Sample {
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    pub value: f64,
}

/// Decode a raw response body.
pub fn parse(body: &[u8]) -> Result<RangeQueryList, AdapterError> {
    serde_json::from_slice(body).map_err(|e| AdapterError::Decode(e.to_string()))
}

/// True for Kafka's own bookkeeping topics, such as `__consumer_offsets`.
pub fn is_internal_topic(topic: &str) -> bool {
    topic.starts_with(INTERNAL_TOPIC_PREFIX)
}

/// Sum used bytes across all volumes at each timestamp.
pub fn disk_space(list: &RangeQueryList) -> DiskSpaceSnapshot {
    let mut used_bytes = TimeSeries::new();
    for item in list
        .items
        .iter()
        .filter(|item| item.name() == Some(VOLUME_USED_BYTES))
    {
        item.add_to(&mut used_bytes);
    }
    DiskSpaceSnapshot::new(used_bytes)
}

/// Fold topic series into a [`TopicSnapshot`].
///
/// Internal topics are skipped entirely. Every other topic is listed, but
/// only series of `selected_topic` (when set) contribute samples. Log size is
/// keyed by topic, or by partition once a topic is selected.
pub fn topics(list: &RangeQueryList, selected_topic: Option<&str>) -> TopicSnapshot {
    let mut snapshot = TopicSnapshot::default();

    for item in &list.items {
        let topic = item.label(TOPIC_LABEL);
        if let Some(topic) = topic {
            if is_internal_topic(topic) {
                continue;
            }
            snapshot.topics.insert(topic.to_string());
        }

        if selected_topic.is_some() && topic != selected_topic {
            continue;
        }

        match item.name() {
            Some(TOPIC_BYTES_IN) => item.add_to(&mut snapshot.bytes_incoming),
            Some(TOPIC_BYTES_OUT) => item.add_to(&mut snapshot.bytes_outgoing),
            Some(TOPIC_LOG_SIZE) => {
                let key = match selected_topic {
                    Some(_) => item.label(PARTITION_LABEL).or(topic),
                    None => topic,
                };
                if let Some(key) = key {
                    item.add_to(
                        snapshot
                            .bytes_per_partition
                            .entry(key.to_string())
                            .or_default(),
                    );
                }
            }
            _ => {}
        }
    }

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISK_BODY: &str = r#"{
        "kind": "MetricsRangeQueryList",
        "id": "kafka-1",
        "items": [
            {
                "metric": {"__name__": "kubelet_volume_stats_used_bytes", "persistentvolumeclaim": "data-0"},
                "values": [{"timestamp": 1000, "value": 100.0}, {"timestamp": 2000, "value": 150.0}]
            },
            {
                "metric": {"__name__": "kubelet_volume_stats_used_bytes", "persistentvolumeclaim": "data-1"},
                "values": [{"timestamp": 1000, "value": 50.0}, {"timestamp": 2000, "value": 70.0}]
            },
            {
                "metric": {"__name__": "something_else"},
                "values": [{"timestamp": 1000, "value": 9999.0}]
            }
        ]
    }"#;

    const TOPIC_BODY: &str = r#"{
        "items": [
            {
                "metric": {"__name__": "kafka_server_brokertopicmetrics_bytes_in_total", "topic": "orders"},
                "values": [{"timestamp": 1000, "value": 10.0}]
            },
            {
                "metric": {"__name__": "kafka_server_brokertopicmetrics_bytes_in_total", "topic": "payments"},
                "values": [{"timestamp": 1000, "value": 5.0}]
            },
            {
                "metric": {"__name__": "kafka_server_brokertopicmetrics_bytes_out_total", "topic": "orders"},
                "values": [{"timestamp": 1000, "value": 3.0}]
            },
            {
                "metric": {"__name__": "kafka_topic:kafka_log_log_size:sum", "topic": "orders", "partition": "0"},
                "values": [{"timestamp": 1000, "value": 400.0}]
            },
            {
                "metric": {"__name__": "kafka_topic:kafka_log_log_size:sum", "topic": "orders", "partition": "1"},
                "values": [{"timestamp": 1000, "value": 600.0}]
            },
            {
                "metric": {"__name__": "kafka_topic:kafka_log_log_size:sum", "topic": "payments", "partition": "0"},
                "values": [{"timestamp": 1000, "value": 80.0}]
            },
            {
                "metric": {"__name__": "kafka_server_brokertopicmetrics_bytes_in_total", "topic": "__consumer_offsets"},
                "values": [{"timestamp": 1000, "value": 777.0}]
            }
        ]
    }"#;

    #[test]
    fn test_disk_space_sums_volumes() {
        let list = parse(DISK_BODY.as_bytes()).unwrap();
        let snapshot = disk_space(&list);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.used_bytes[&1000], 150.0);
        assert_eq!(snapshot.used_bytes[&2000], 220.0);
    }

    #[test]
    fn test_empty_response() {
        let list = parse(br#"{"items": []}"#).unwrap();
        assert!(disk_space(&list).is_empty());
        assert!(topics(&list, None).is_empty());

        let list = parse(b"{}").unwrap();
        assert!(list.items.is_empty());
    }

    #[test]
    fn test_parse_error() {
        let err = parse(b"not json").unwrap_err();
        assert!(matches!(err, AdapterError::Decode(_)));
    }

    #[test]
    fn test_topics_all() {
        let list = parse(TOPIC_BODY.as_bytes()).unwrap();
        let snapshot = topics(&list, None);

        let names: Vec<_> = snapshot.topics.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["orders", "payments"]);
        assert_eq!(snapshot.bytes_incoming[&1000], 15.0);
        assert_eq!(snapshot.bytes_outgoing[&1000], 3.0);
        assert_eq!(snapshot.bytes_per_partition["orders"][&1000], 1000.0);
        assert_eq!(snapshot.bytes_per_partition["payments"][&1000], 80.0);
    }

    #[test]
    fn test_topics_selected_keys_by_partition() {
        let list = parse(TOPIC_BODY.as_bytes()).unwrap();
        let snapshot = topics(&list, Some("orders"));

        // The full topic list is still reported.
        assert_eq!(snapshot.topics.len(), 2);
        assert_eq!(snapshot.bytes_incoming[&1000], 10.0);
        assert_eq!(snapshot.bytes_per_partition.len(), 2);
        assert_eq!(snapshot.bytes_per_partition["0"][&1000], 400.0);
        assert_eq!(snapshot.bytes_per_partition["1"][&1000], 600.0);
    }

    #[test]
    fn test_internal_topics_skipped() {
        assert!(is_internal_topic("__consumer_offsets"));
        assert!(!is_internal_topic("orders"));

        let list = parse(TOPIC_BODY.as_bytes()).unwrap();
        let snapshot = topics(&list, None);
        assert!(!snapshot.topics.contains("__consumer_offsets"));
        assert!(snapshot.total_incoming() < 777.0);
    }
}
