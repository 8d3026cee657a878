use hfsm_core::EngineError;

/// Lifecycle and persistence errors raised by the passive/active façade and by
/// `save`/`load` (§7). Guard/action failures never reach this type — they are
/// captured by the engine and surfaced through `Extension::transition_exception_thrown`
/// instead.
#[derive(Debug, thiserror::Error)]
pub enum StateMachineError {
    #[error("fire called before initialize/load")]
    NotInitialized,

    #[error("initialize or load called on an already-initialized machine")]
    AlreadyInitialized,

    #[error("history entry for {super_state:?} points to {leaf:?}, which is not one of its descendants")]
    InvalidHistoryState { super_state: String, leaf: String },

    #[error("active runner's worker thread faulted: {0}")]
    WorkerFault(String),

    #[error("persistence load failed: {0}")]
    LoadFailed(String),

    #[error("persistence save failed: {0}")]
    SaveFailed(String),
}

impl StateMachineError {
    pub(crate) fn invalid_history<S: std::fmt::Debug>(super_state: &S, leaf: &S) -> Self {
        Self::InvalidHistoryState {
            super_state: format!("{super_state:?}"),
            leaf: format!("{leaf:?}"),
        }
    }
}

/// A guard or action raised during a `fire` driven through the façade. Re-exported so
/// callers matching on extension callbacks don't need a direct `hfsm-core` dependency.
pub type TransitionFault = EngineError;
