use std::collections::HashMap;

use crate::error::EngineError;
use crate::ids::{EventIdent, StateIdent};

/// A pure observer of engine and runner lifecycle events.
///
/// Every method has an empty default body, so an extension only overrides the hooks it
/// cares about. Notification order equals registration order (see
/// [`crate::container::StateContainer::add_extension`]).
///
/// The transition hooks (`transition_*`) are invoked by [`crate::transition_logic::fire_once`]
/// on whichever thread calls it. The lifecycle hooks (`started_state_machine`,
/// `event_queued`, ...) are invoked by the active runner in the facade crate, always from the
/// worker thread. Extensions are trusted to be safe to call from that thread; the engine makes
/// no further concurrency guarantee about them.
pub trait Extension<S, E, A>: Send
where
    S: StateIdent,
    E: EventIdent,
{
    /// No transition at any level accepted `event`; `current_state` is unchanged.
    fn transition_declined(&mut self, _event: &E, _argument: &A, _state: &S) {}

    /// A guard accepted `event`; exit/action/entry is about to run. `source` is the state
    /// that was current when `fire` was called (pre-exit).
    fn transition_begin(&mut self, _event: &E, _argument: &A, _source: &S) {}

    /// The transition ran to completion. `new_state` is the post-entry leaf.
    fn transition_completed(&mut self, _event: &E, _argument: &A, _new_state: &S) {}

    /// A guard or action raised during the firing of `event`. Firing still completes:
    /// the entry chain runs to completion regardless of this notification.
    fn transition_exception_thrown(&mut self, _event: Option<&E>, _state: Option<&S>, _error: &EngineError) {}

    /// The active runner's worker thread has started processing events.
    fn started_state_machine(&mut self) {}

    /// The active runner's worker thread has stopped.
    fn stopped_state_machine(&mut self) {}

    /// `event` was appended to the back of the active runner's queue.
    fn event_queued(&mut self, _event: &E) {}

    /// `event` was prepended to the front of the active runner's queue.
    fn event_queued_with_priority(&mut self, _event: &E) {}

    /// A `load` completed successfully, restoring `current` and `history`.
    fn loaded(&mut self, _current: Option<&S>, _history: &HashMap<S, S>) {}
}
