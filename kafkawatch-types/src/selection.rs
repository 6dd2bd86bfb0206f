//! User-chosen query parameters.

use crate::TimeDuration;

/// Selection for the disk-space dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiskSpaceSelection {
    /// Window the query looks back over.
    pub time_duration: TimeDuration,
}

impl DiskSpaceSelection {
    /// Create a selection for the given window.
    pub fn new(time_duration: TimeDuration) -> Self {
        Self { time_duration }
    }
}

/// Selection for the topic dashboard.
///
/// `selected_topic == None` means "all topics".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TopicSelection {
    /// Window the query looks back over.
    pub time_duration: TimeDuration,
    /// Topic the byte series are narrowed to.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub selected_topic: Option<String>,
}

impl TopicSelection {
    /// Create a selection for the given window over all topics.
    pub fn new(time_duration: TimeDuration) -> Self {
        Self {
            time_duration,
            selected_topic: None,
        }
    }

    /// Narrow the selection to one topic.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.selected_topic = Some(topic.into());
        self
    }
}
