//! Report generator contract (§6): a pure, read-only traversal of a machine's graph.
//! Concrete renderers beyond the reference one below are external to the core.

use std::fmt::Write as _;

use hfsm_core::{EventIdent, StateDef, StateGraph, StateIdent};

/// A read-only visitor over a built graph, driven by [`walk`].
pub trait Reporter<S, E, A>
where
    S: StateIdent,
    E: EventIdent,
{
    /// Called once, before any state, with the machine's display name (if any) and its
    /// initial state id (if the machine has been initialized or loaded at least once).
    fn machine(&mut self, name: Option<&str>, initial_state_id: Option<&S>);

    /// Called once per state in the graph, in [`StateGraph::iter`] order.
    fn state(&mut self, state: &StateDef<S, E, A>);
}

pub(crate) fn walk<S, E, A, R>(
    graph: &StateGraph<S, E, A>,
    name: Option<&str>,
    initial_state_id: Option<&S>,
    reporter: &mut R,
) where
    S: StateIdent,
    E: EventIdent,
    R: Reporter<S, E, A>,
{
    reporter.machine(name, initial_state_id);
    for state in graph.iter() {
        reporter.state(state);
    }
}

/// A reference `Reporter` rendering an indented, human-readable tree, grouped by level.
/// Not a mandated format — just the one concrete renderer this crate ships (§1).
#[derive(Default)]
pub struct TextReporter {
    buffer: String,
}

impl TextReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_text(self) -> String {
        self.buffer
    }
}

impl<S, E, A> Reporter<S, E, A> for TextReporter
where
    S: StateIdent,
    E: EventIdent,
{
    fn machine(&mut self, name: Option<&str>, initial_state_id: Option<&S>) {
        let _ = writeln!(self.buffer, "machine {}", name.unwrap_or("<unnamed>"));
        if let Some(initial) = initial_state_id {
            let _ = writeln!(self.buffer, "  initial: {initial:?}");
        }
    }

    fn state(&mut self, state: &StateDef<S, E, A>) {
        let indent = "  ".repeat(state.level + 1);
        let history = if state.history == hfsm_core::HistoryKind::None {
            String::new()
        } else {
            format!(" [{:?} history]", state.history)
        };
        let _ = writeln!(self.buffer, "{indent}{:?}{history}", state.id);
    }
}
