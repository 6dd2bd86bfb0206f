//! The fetch/retry/refresh state machine.
//!
//! [`transition`] is a pure function from `(state, context, event)` to the next
//! state, the next context, and the effects the driver must run. Nothing in
//! this module performs I/O or waits; [`crate::MachineService`] does that.
//!
//! ```text
//!  ┌ CallApi ─────────────────────┐
//!  │ Loading ──fail──▶ Failure    │──retries spent──▶ CriticalFail
//!  │    ▲                 │       │                        │
//!  │    └──── 1s, retry ◀─┘       │◀────────refresh────────┘
//!  └──────┬───────────────────────┘
//!         │ success
//!         ▼
//!    (VerifyData) ──empty──▶ NoData ──refresh──▶ Loading
//!         │                    │ select (topics)
//!         ▼ data               ▼
//!      WithData ◀──────── Refreshing
//!         └──refresh/select──▶ ▲
//! ```

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::kind::MetricsKind;

/// Failed initial-load attempts tolerated before giving up.
pub const MAX_RETRIES: u32 = 3;

/// Pause between a failed initial-load attempt and the next one.
pub const RETRY_DELAY: Duration = Duration::from_millis(1000);

/// A state of the machine.
///
/// `VerifyData` is transient and resolved inside [`transition`], so it never
/// appears here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum State {
    /// `CallApi.Loading`: initial fetch in flight.
    Loading,
    /// `CallApi.Failure`: waiting out the retry delay.
    Failure,
    /// Retries exhausted; only `refresh` gets out.
    CriticalFail,
    /// Last successful fetch had nothing to show.
    NoData,
    /// Data is available and nothing is in flight.
    WithData,
    /// Background fetch in flight over data already shown.
    Refreshing,
}

/// UI-facing label derived from a [`State`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Tag {
    Loading,
    Refreshing,
    Failed,
    NoData,
}

impl State {
    /// The tag shown for this state; `WithData` has none ("ready").
    pub const fn tag(self) -> Option<Tag> {
        match self {
            State::Loading | State::Failure => Some(Tag::Loading),
            State::CriticalFail => Some(Tag::Failed),
            State::NoData => Some(Tag::NoData),
            State::Refreshing => Some(Tag::Refreshing),
            State::WithData => None,
        }
    }

    /// True while a fetch is logically in flight.
    pub const fn is_fetching(self) -> bool {
        matches!(self, State::Loading | State::Refreshing)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Loading => "CallApi.Loading",
            State::Failure => "CallApi.Failure",
            State::CriticalFail => "CriticalFail",
            State::NoData => "NoData",
            State::WithData => "WithData",
            State::Refreshing => "Refreshing",
        };
        f.write_str(name)
    }
}

/// Everything a machine remembers besides its state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Context<K: MetricsKind> {
    /// Parameters the next fetch will use.
    pub selection: K::Selection,
    /// Last successfully fetched snapshot; a failure never clears it.
    pub data: K::Snapshot,
    /// Failed attempts in the current initial-load run.
    pub fetch_failures: u32,
}

impl<K: MetricsKind> Context<K> {
    /// Fresh context: the given selection, no data, no failures.
    pub fn new(selection: K::Selection) -> Self {
        Self {
            selection,
            data: K::Snapshot::default(),
            fetch_failures: 0,
        }
    }

    /// `canRetryFetching`.
    pub fn can_retry(&self) -> bool {
        self.fetch_failures < MAX_RETRIES
    }
}

/// Inputs to the machine.
///
/// Fetch results carry the selection they were launched with so that results
/// overtaken by a newer selection can be recognised and dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<K: MetricsKind> {
    /// Placeholder; fetches start on entering a fetching state.
    Fetch,
    FetchSuccess {
        selection: K::Selection,
        snapshot: K::Snapshot,
    },
    FetchFail {
        selection: K::Selection,
    },
    /// The retry delay scheduled on entering `Failure` has passed.
    RetryElapsed,
    Refresh,
    SelectDuration(kafkawatch_types::TimeDuration),
    SelectTopic(Option<String>),
}

/// Work the driver must perform after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Launch one fetch.
    ///
    /// The driver snapshots the context's selection when it launches and tags
    /// the result event with it, after applying any events already queued.
    Fetch,
    /// Deliver [`Event::RetryElapsed`] after this delay.
    ScheduleRetry(Duration),
}

/// Result of a [`transition`].
#[derive(Debug, Clone, PartialEq)]
pub struct Step<K: MetricsKind> {
    pub state: State,
    pub context: Context<K>,
    pub effects: Vec<Effect>,
}

impl<K: MetricsKind> Step<K> {
    fn stay(state: State, context: Context<K>) -> Self {
        Self {
            state,
            context,
            effects: Vec::new(),
        }
    }

    /// Enter `state`, running its entry action.
    fn enter(state: State, context: Context<K>) -> Self {
        let effects = entry_effects(state);
        Self {
            state,
            context,
            effects,
        }
    }
}

fn entry_effects(state: State) -> Vec<Effect> {
    match state {
        State::Loading | State::Refreshing => vec![Effect::Fetch],
        State::Failure => vec![Effect::ScheduleRetry(RETRY_DELAY)],
        State::CriticalFail | State::NoData | State::WithData => Vec::new(),
    }
}

/// `VerifyData`: route on whatever data the context holds now.
fn verify_data<K: MetricsKind>(context: Context<K>) -> Step<K> {
    if K::has_data(&context.data) {
        Step::enter(State::WithData, context)
    } else {
        Step::enter(State::NoData, context)
    }
}

/// A result for an outdated selection: drop it and fetch the current one.
fn superseded<K: MetricsKind>(state: State, context: Context<K>) -> Step<K> {
    debug!(kind = K::NAME, %state, "dropping superseded fetch result");
    Step {
        state,
        context,
        effects: vec![Effect::Fetch],
    }
}

/// React to a selection that has already been written into the context.
fn after_selection<K: MetricsKind>(state: State, context: Context<K>) -> Step<K> {
    match state {
        State::WithData => Step::enter(State::Refreshing, context),
        State::NoData if K::SELECT_FROM_NO_DATA => Step::enter(State::Refreshing, context),
        // In flight: the pending result will be superseded. Failure: the retry
        // picks the new selection up. CriticalFail/NoData: wait for refresh.
        _ => Step::stay(state, context),
    }
}

/// The transition function.
///
/// Events a state has no entry for leave state and context untouched.
pub fn transition<K: MetricsKind>(
    state: State,
    mut context: Context<K>,
    event: Event<K>,
) -> Step<K> {
    match (state, event) {
        (State::Loading | State::Refreshing, Event::FetchSuccess { selection, snapshot }) => {
            if selection != context.selection {
                return superseded(state, context);
            }
            context.data = snapshot;
            verify_data(context)
        }

        (State::Loading, Event::FetchFail { selection }) => {
            if selection != context.selection {
                return superseded(state, context);
            }
            context.fetch_failures = context.fetch_failures.saturating_add(1);
            Step::enter(State::Failure, context)
        }

        // Refresh failures are swallowed: no counter, data kept.
        (State::Refreshing, Event::FetchFail { selection }) => {
            if selection != context.selection {
                return superseded(state, context);
            }
            verify_data(context)
        }

        (State::Failure, Event::RetryElapsed) => {
            if context.can_retry() {
                Step::enter(State::Loading, context)
            } else {
                Step::enter(State::CriticalFail, context)
            }
        }

        (State::CriticalFail | State::NoData, Event::Refresh) => {
            context.fetch_failures = 0;
            Step::enter(State::Loading, context)
        }

        (State::WithData, Event::Refresh) => {
            context.fetch_failures = 0;
            Step::enter(State::Refreshing, context)
        }

        (state, Event::SelectDuration(duration)) => {
            K::set_duration(&mut context.selection, duration);
            after_selection(state, context)
        }

        (state, Event::SelectTopic(topic)) => {
            if !K::set_topic(&mut context.selection, topic) {
                return Step::stay(state, context);
            }
            after_selection(state, context)
        }

        (state, _) => Step::stay(state, context),
    }
}

/// A machine instance: current state plus context.
#[derive(Debug, Clone, PartialEq)]
pub struct Machine<K: MetricsKind> {
    state: State,
    context: Context<K>,
}

impl<K: MetricsKind> Machine<K> {
    /// A machine in `CallApi.Loading` with the given selection.
    ///
    /// Call [`Machine::start`] to obtain the initial fetch.
    pub fn new(selection: K::Selection) -> Self {
        Self {
            state: State::Loading,
            context: Context::new(selection),
        }
    }

    /// Entry effects of the initial state.
    pub fn start(&self) -> Vec<Effect> {
        entry_effects(self.state)
    }

    /// Apply one event and return the effects to run.
    pub fn send(&mut self, event: Event<K>) -> Vec<Effect> {
        let context = std::mem::take(&mut self.context);
        let step = transition(self.state, context, event);

        if step.state != self.state {
            debug!(kind = K::NAME, from = %self.state, to = %step.state, "transition");
        }

        self.state = step.state;
        self.context = step.context;
        step.effects
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn context(&self) -> &Context<K> {
        &self.context
    }

    pub fn tag(&self) -> Option<Tag> {
        self.state.tag()
    }
}
