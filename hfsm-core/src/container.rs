use std::collections::HashMap;

use crate::extension::Extension;
use crate::ids::{EventIdent, StateIdent};

/// Mutable runtime state for one machine instance (C2).
///
/// Holds everything C3/C4 mutate while driving the (immutable) [`crate::graph::StateGraph`]:
/// the current leaf, the shallow/deep history map, the registered extensions, and an optional
/// display name. Thread-safety is the caller's responsibility: in passive mode the caller must
/// not fire concurrently; in active mode only the worker thread touches this after `start()`.
pub struct StateContainer<S, E, A>
where
    S: StateIdent,
    E: EventIdent,
{
    name: Option<String>,
    current_state: Option<S>,
    last_active_states: HashMap<S, S>,
    extensions: Vec<Box<dyn Extension<S, E, A>>>,
}

impl<S, E, A> StateContainer<S, E, A>
where
    S: StateIdent,
    E: EventIdent,
{
    pub fn new() -> Self {
        Self {
            name: None,
            current_state: None,
            last_active_states: HashMap::new(),
            extensions: Vec::new(),
        }
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        let mut container = Self::new();
        container.name = Some(name.into());
        container
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn current_state(&self) -> Option<&S> {
        self.current_state.as_ref()
    }

    pub fn set_current_state(&mut self, state: Option<S>) {
        self.current_state = state;
    }

    pub fn set_last_active_state_for(&mut self, super_id: S, state: S) {
        self.last_active_states.insert(super_id, state);
    }

    pub fn get_last_active_state_for(&self, super_id: &S) -> Option<&S> {
        self.last_active_states.get(super_id)
    }

    pub fn history(&self) -> &HashMap<S, S> {
        &self.last_active_states
    }

    /// Replaces the whole history map, used by persistence's `load`.
    pub fn set_history(&mut self, history: HashMap<S, S>) {
        self.last_active_states = history;
    }

    pub fn add_extension(&mut self, extension: Box<dyn Extension<S, E, A>>) {
        self.extensions.push(extension);
    }

    pub fn clear_extensions(&mut self) {
        self.extensions.clear();
    }

    pub fn extensions_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Extension<S, E, A>>> {
        self.extensions.iter_mut()
    }
}

impl<S, E, A> Default for StateContainer<S, E, A>
where
    S: StateIdent,
    E: EventIdent,
{
    fn default() -> Self {
        Self::new()
    }
}
