//! Data model and transition engine for a hierarchical finite state machine.
//!
//! This crate is the ~70% "core" described in the specification: the state/transition
//! graph (C1), the mutable runtime container (C2), entry/exit logic with history
//! restoration (C3), and the event-dispatch engine with LCA-based exit/entry sequencing
//! and hierarchical bubbling (C4). It has no opinion on threading or persistence — see the
//! `hfsm` crate for the active/passive runners, save/load, and reporting built on top of it.

pub mod container;
pub mod error;
pub mod extension;
pub mod graph;
pub mod history;
pub mod ids;
pub mod state_logic;
pub mod transition_logic;

pub use container::StateContainer;
pub use error::{ActionError, EngineError, GraphError, GuardError};
pub use extension::Extension;
pub use graph::{
    Guard, StateAction, StateDef, StateGraph, StateGraphBuilder, StateSpec, TransitionAction,
    TransitionContext, TransitionDef, TransitionSpec,
};
pub use history::HistoryKind;
pub use ids::{EventIdent, StateIdent};
pub use transition_logic::{fire_once, FireOutcome};
