//! The two metric kinds a dashboard can synchronize.

use std::fmt::Debug;

use kafkawatch_types::{
    DiskSpaceSelection, DiskSpaceSnapshot, TimeDuration, TopicSelection, TopicSnapshot,
};

use crate::port::{FetchRequest, FetchTarget};

/// Kind-specific parts of a metrics state machine.
///
/// The transition table is shared; a kind only contributes its selection and
/// snapshot types, the emptiness check, and how a selection becomes a request.
pub trait MetricsKind: Debug + Clone + PartialEq + Default + Send + Sync + 'static {
    /// Query parameters the user controls.
    type Selection: Debug + Clone + PartialEq + Default + Send + Sync + 'static;

    /// Payload of a successful fetch.
    type Snapshot: Debug + Clone + PartialEq + Default + Send + Sync + 'static;

    /// Short name used in logs.
    const NAME: &'static str;

    /// Whether `NoData` reacts to selection changes by refreshing.
    const SELECT_FROM_NO_DATA: bool;

    /// Whether a fetched snapshot is worth showing.
    fn has_data(snapshot: &Self::Snapshot) -> bool;

    /// Window currently selected.
    fn duration(selection: &Self::Selection) -> TimeDuration;

    /// Replace the selected window.
    fn set_duration(selection: &mut Self::Selection, duration: TimeDuration);

    /// Replace the selected topic.
    ///
    /// Returns `false` when the kind has no topic filter.
    fn set_topic(selection: &mut Self::Selection, topic: Option<String>) -> bool;

    /// Describe the query for `selection`.
    fn request(target: &FetchTarget, selection: &Self::Selection) -> FetchRequest;
}

/// Disk space used by the instance's broker volumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiskSpace;

impl MetricsKind for DiskSpace {
    type Selection = DiskSpaceSelection;
    type Snapshot = DiskSpaceSnapshot;

    const NAME: &'static str = "disk-space";
    const SELECT_FROM_NO_DATA: bool = false;

    fn has_data(snapshot: &DiskSpaceSnapshot) -> bool {
        !snapshot.is_empty()
    }

    fn duration(selection: &DiskSpaceSelection) -> TimeDuration {
        selection.time_duration
    }

    fn set_duration(selection: &mut DiskSpaceSelection, duration: TimeDuration) {
        selection.time_duration = duration;
    }

    fn set_topic(_selection: &mut DiskSpaceSelection, _topic: Option<String>) -> bool {
        false
    }

    fn request(target: &FetchTarget, selection: &DiskSpaceSelection) -> FetchRequest {
        FetchRequest::new(target, selection.time_duration, None)
    }
}

/// Per-topic traffic and log sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Topics;

impl MetricsKind for Topics {
    type Selection = TopicSelection;
    type Snapshot = TopicSnapshot;

    const NAME: &'static str = "topics";
    const SELECT_FROM_NO_DATA: bool = true;

    /// Needs a known topic and at least one non-empty byte series.
    fn has_data(snapshot: &TopicSnapshot) -> bool {
        !snapshot.topics.is_empty() && snapshot.has_series()
    }

    fn duration(selection: &TopicSelection) -> TimeDuration {
        selection.time_duration
    }

    fn set_duration(selection: &mut TopicSelection, duration: TimeDuration) {
        selection.time_duration = duration;
    }

    fn set_topic(selection: &mut TopicSelection, topic: Option<String>) -> bool {
        selection.selected_topic = topic;
        true
    }

    fn request(target: &FetchTarget, selection: &TopicSelection) -> FetchRequest {
        FetchRequest::new(
            target,
            selection.time_duration,
            selection.selected_topic.clone(),
        )
    }
}
