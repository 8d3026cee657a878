use crate::ids::StateIdent;

/// Structural violation of one of the state/transition-model invariants, raised by
/// [`crate::graph::StateGraphBuilder::build`].
#[derive(Debug, thiserror::Error)]
pub enum GraphError<S: StateIdent> {
    #[error("duplicate state id {0:?}")]
    DuplicateState(S),

    #[error("state {0:?} is referenced but was never defined")]
    UnknownState(S),

    #[error(
        "state {child:?} declares super-state {parent:?}, but {parent:?} does not list {child:?} as a sub-state"
    )]
    SuperSubMismatch { child: S, parent: S },

    #[error("composite state {state:?} has sub-states but no initial sub-state")]
    MissingInitialSubState { state: S },

    #[error("initial sub-state {initial:?} of {state:?} is not one of its sub-states")]
    InitialNotASubState { state: S, initial: S },

    #[error("state {state:?} declares a history kind but has no sub-states")]
    HistoryOnLeaf { state: S },

    #[error("cycle detected in the super-state chain starting at {0:?}")]
    CycleDetected(S),
}

/// A guard predicate returned `Err` instead of `true`/`false`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("guard {name} failed: {message}")]
pub struct GuardError {
    pub name: &'static str,
    pub message: String,
}

impl GuardError {
    pub fn new(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            message: message.into(),
        }
    }
}

/// An entry/exit/transition action returned `Err`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("action {name} failed: {message}")]
pub struct ActionError {
    pub name: &'static str,
    pub message: String,
}

impl ActionError {
    pub fn new(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            message: message.into(),
        }
    }
}

/// Either a guard or an action raised during a single `fire`, surfaced to extensions as
/// `TransitionExceptionThrown` rather than unwinding the worker thread.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Guard(#[from] GuardError),
    #[error(transparent)]
    Action(#[from] ActionError),
}
