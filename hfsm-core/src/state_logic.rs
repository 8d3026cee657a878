//! Entry/exit of a single state, including initial-substate descent and history
//! restoration (C3). Used by the transition engine (C4) both mid-transition and for the
//! very first entry into a machine's initial state.

use std::cell::RefCell;

use crate::container::StateContainer;
use crate::error::{ActionError, EngineError};
use crate::graph::{StateAction, StateGraph};
use crate::history::HistoryKind;
use crate::ids::{EventIdent, StateIdent};

fn run_actions<S, E, A>(
    actions: &RefCell<Vec<StateAction>>,
    container: &mut StateContainer<S, E, A>,
    state: &S,
) where
    S: StateIdent,
    E: EventIdent,
{
    for action in actions.borrow_mut().iter_mut() {
        if let Err(err) = action() {
            notify_exception(container, state, err);
        }
    }
}

fn notify_exception<S, E, A>(container: &mut StateContainer<S, E, A>, state: &S, err: ActionError)
where
    S: StateIdent,
    E: EventIdent,
{
    let err = EngineError::Action(err);
    for ext in container.extensions_mut() {
        ext.transition_exception_thrown(None, Some(state), &err);
    }
    tracing::warn!(?state, error = %err, "action failed during entry/exit");
}

/// Enter `state_id`: run its entry actions, then (if composite) resolve the substate to
/// descend into per its history kind, recursing until a leaf is reached and `current_state`
/// is set to it.
pub fn enter_state<S, E, A>(graph: &StateGraph<S, E, A>, container: &mut StateContainer<S, E, A>, state_id: &S)
where
    S: StateIdent,
    E: EventIdent,
{
    let def = graph
        .get(state_id)
        .unwrap_or_else(|| panic!("enter_state: unknown state {state_id:?}"));
    run_actions(def.entry_actions(), container, state_id);

    if !def.is_composite() {
        container.set_current_state(Some(state_id.clone()));
        return;
    }

    match def.history {
        HistoryKind::None => {
            let child = def
                .initial_sub_state
                .clone()
                .expect("composite state without initial_sub_state (invariant 2 violated)");
            enter_state(graph, container, &child);
        }
        HistoryKind::Shallow => {
            let child = match container.get_last_active_state_for(state_id).cloned() {
                Some(leaf) => graph.path_from_to(state_id, &leaf)[0].clone(),
                None => def
                    .initial_sub_state
                    .clone()
                    .expect("composite state without initial_sub_state (invariant 2 violated)"),
            };
            enter_with_initial_only(graph, container, &child);
        }
        HistoryKind::Deep => match container.get_last_active_state_for(state_id).cloned() {
            Some(leaf) => {
                let path = graph.path_from_to(state_id, &leaf);
                enter_along_fixed_path(graph, container, &path);
            }
            None => {
                let child = def
                    .initial_sub_state
                    .clone()
                    .expect("composite state without initial_sub_state (invariant 2 violated)");
                enter_state(graph, container, &child);
            }
        },
    }
}

/// Enter `state_id` and, for every composite on the way down, always take the initial
/// sub-state — used by shallow history once its one history-selected level has been chosen,
/// per the rule that deeper descents ignore history.
fn enter_with_initial_only<S, E, A>(graph: &StateGraph<S, E, A>, container: &mut StateContainer<S, E, A>, state_id: &S)
where
    S: StateIdent,
    E: EventIdent,
{
    let def = graph
        .get(state_id)
        .unwrap_or_else(|| panic!("enter_with_initial_only: unknown state {state_id:?}"));
    run_actions(def.entry_actions(), container, state_id);

    if !def.is_composite() {
        container.set_current_state(Some(state_id.clone()));
        return;
    }
    let child = def
        .initial_sub_state
        .clone()
        .expect("composite state without initial_sub_state (invariant 2 violated)");
    enter_with_initial_only(graph, container, &child);
}

/// Enter every state in `path`, in order, running entry actions for each. Every element
/// except the last is a known waypoint (its child is already determined by the path, so no
/// history/initial resolution happens for it); the last element gets a full [`enter_state`]
/// so that, if it is itself composite, its own descent still applies.
pub(crate) fn enter_along_fixed_path<S, E, A>(
    graph: &StateGraph<S, E, A>,
    container: &mut StateContainer<S, E, A>,
    path: &[S],
) where
    S: StateIdent,
    E: EventIdent,
{
    let (intermediates, last) = path
        .split_last()
        .map(|(last, rest)| (rest, last))
        .expect("enter_along_fixed_path: path must be non-empty");
    for state_id in intermediates {
        let def = graph
            .get(state_id)
            .unwrap_or_else(|| panic!("enter_along_fixed_path: unknown state {state_id:?}"));
        run_actions(def.entry_actions(), container, state_id);
    }
    enter_state(graph, container, last);
}

/// Exit `state_id`: if composite with a history kind, record the current leaf (still held in
/// `current_state`, which exit never clears) as its last-active descendant, then run its exit
/// actions.
pub fn exit_state<S, E, A>(graph: &StateGraph<S, E, A>, container: &mut StateContainer<S, E, A>, state_id: &S)
where
    S: StateIdent,
    E: EventIdent,
{
    let def = graph
        .get(state_id)
        .unwrap_or_else(|| panic!("exit_state: unknown state {state_id:?}"));

    if def.is_composite() && def.history != HistoryKind::None {
        if let Some(leaf) = container.current_state().cloned() {
            container.set_last_active_state_for(state_id.clone(), leaf);
        }
    }
    run_actions(def.exit_actions(), container, state_id);
}
