//! The projection presentation code reads.

use crate::kind::MetricsKind;
use crate::machine::{Machine, State, Tag};

/// Context of a machine plus the flags derived from its state tag.
///
/// At most one flag is set. `is_refreshing` may coexist with stale `data`,
/// which stays visible until the refresh resolves.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(serialize = "K::Selection: serde::Serialize, K::Snapshot: serde::Serialize"))
)]
pub struct MetricsView<K: MetricsKind> {
    pub state: State,
    pub selection: K::Selection,
    pub data: K::Snapshot,
    pub fetch_failures: u32,
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub is_failed: bool,
    pub is_data_unavailable: bool,
}

impl<K: MetricsKind> MetricsView<K> {
    /// Project the machine's current state and context.
    pub fn from_machine(machine: &Machine<K>) -> Self {
        let state = machine.state();
        let tag = state.tag();
        let context = machine.context();
        Self {
            state,
            selection: context.selection.clone(),
            data: context.data.clone(),
            fetch_failures: context.fetch_failures,
            is_loading: tag == Some(Tag::Loading),
            is_refreshing: tag == Some(Tag::Refreshing),
            is_failed: tag == Some(Tag::Failed),
            is_data_unavailable: tag == Some(Tag::NoData),
        }
    }

    pub fn tag(&self) -> Option<Tag> {
        self.state.tag()
    }

    /// True once the view shows a settled outcome (nothing in flight or pending).
    pub fn is_settled(&self) -> bool {
        !self.is_loading && !self.is_refreshing
    }

    /// True when populated data is on screen and nothing is in flight.
    pub fn is_ready(&self) -> bool {
        self.tag().is_none()
    }
}
