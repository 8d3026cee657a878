//! Active and passive runners, persistence, and reporting over [`hfsm_core`].
//!
//! `hfsm-core` owns the state/transition data model and the transition engine (C1–C4) with
//! no opinion on threading or I/O. This crate is the ~30% built on top of it: the
//! synchronous passive façade (C5), the worker-thread active runner (C6), and save/load
//! persistence against external `Saver`/`Loader` contracts (C7).

pub mod active;
pub mod error;
pub mod passive;
pub mod persistence;
pub mod report;

pub use active::{ActiveStateMachine, ActiveStateMachineConfig};
pub use error::StateMachineError;
pub use passive::PassiveStateMachine;
pub use persistence::{InMemoryLoader, InMemorySaver, Loader, Saver};
pub use report::{Reporter, TextReporter};

#[cfg(feature = "json-persistence")]
pub use persistence::{JsonFileLoader, JsonFileSaver};

pub use hfsm_core::{
    EventIdent, Extension, FireOutcome, GraphError, HistoryKind, StateDef, StateGraph,
    StateGraphBuilder, StateIdent, StateSpec, TransitionSpec,
};
