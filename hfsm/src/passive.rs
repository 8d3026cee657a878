//! The synchronous façade (C5): `fire` runs a transition to completion on the caller's
//! thread. See `active` for the worker-thread runner.

use hfsm_core::{state_logic, Extension, FireOutcome, StateContainer, StateGraph};
use hfsm_core::{EventIdent, StateIdent};

use crate::error::StateMachineError;
use crate::report::Reporter;

/// Drives a [`StateGraph`] one `fire` at a time, on whatever thread calls it. Not safe to
/// call concurrently from multiple threads — callers that need that should use
/// [`crate::active::ActiveStateMachine`] instead.
pub struct PassiveStateMachine<S, E, A>
where
    S: StateIdent,
    E: EventIdent,
{
    graph: StateGraph<S, E, A>,
    container: StateContainer<S, E, A>,
    initialized: bool,
    initial_state_id: Option<S>,
}

impl<S, E, A> PassiveStateMachine<S, E, A>
where
    S: StateIdent,
    E: EventIdent,
{
    pub fn new(graph: StateGraph<S, E, A>) -> Self {
        Self {
            graph,
            container: StateContainer::new(),
            initialized: false,
            initial_state_id: None,
        }
    }

    pub fn with_name(graph: StateGraph<S, E, A>, name: impl Into<String>) -> Self {
        Self {
            graph,
            container: StateContainer::with_name(name),
            initialized: false,
            initial_state_id: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn current_state(&self) -> Option<&S> {
        self.container.current_state()
    }

    /// Enter `initial` (running its entry chain, including any composite descent) and mark
    /// the machine ready for `fire`. Fails with `AlreadyInitialized` on a second call.
    pub fn initialize(&mut self, initial: S) -> Result<(), StateMachineError> {
        if self.initialized {
            return Err(StateMachineError::AlreadyInitialized);
        }
        state_logic::enter_state(&self.graph, &mut self.container, &initial);
        self.initialized = true;
        self.initial_state_id = Some(initial.clone());
        tracing::debug!(?initial, "passive state machine initialized");
        Ok(())
    }

    /// Run one event to completion. Requires a prior `initialize` or `load`.
    pub fn fire(&mut self, event: E, argument: A) -> Result<FireOutcome<S>, StateMachineError> {
        if !self.initialized || self.container.current_state().is_none() {
            return Err(StateMachineError::NotInitialized);
        }
        Ok(hfsm_core::fire_once(&self.graph, &mut self.container, event, argument))
    }

    /// Snapshot `current_state` and the history map through `saver` (§4.7).
    pub fn save<W: crate::persistence::Saver<S>>(&self, saver: &mut W) -> Result<(), StateMachineError> {
        crate::persistence::save(&self.container, saver)
    }

    /// Restore `current_state` and history from `loader`. Legal only before `initialize`.
    pub fn load<L: crate::persistence::Loader<S>>(&mut self, loader: &mut L) -> Result<(), StateMachineError> {
        crate::persistence::load(&self.graph, &mut self.container, self.initialized, loader)?;
        self.initialized = true;
        self.initial_state_id = self.container.current_state().cloned();
        Ok(())
    }

    pub fn add_extension(&mut self, extension: Box<dyn Extension<S, E, A>>) {
        self.container.add_extension(extension);
    }

    pub fn clear_extensions(&mut self) {
        self.container.clear_extensions();
    }

    /// Read-only traversal of the underlying graph (§6 report generator contract).
    pub fn report<R: Reporter<S, E, A>>(&self, reporter: &mut R) {
        crate::report::walk(&self.graph, self.container.name(), self.initial_state_id.as_ref(), reporter);
    }
}
