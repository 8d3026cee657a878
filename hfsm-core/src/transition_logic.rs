//! Firing a single event to completion: guard evaluation, LCA computation, exit/entry
//! sequencing, and hierarchical bubbling on no-match (C4).

use crate::container::StateContainer;
use crate::error::EngineError;
use crate::graph::{StateGraph, TransitionContext, TransitionDef};
use crate::ids::{EventIdent, StateIdent};
use crate::state_logic::{enter_along_fixed_path, enter_state, exit_state};

/// The outcome of a single [`fire_once`] call.
#[derive(Debug, Clone)]
pub enum FireOutcome<S> {
    /// A transition matched and ran to completion; `new_state` is the post-entry leaf
    /// (unchanged from the pre-fire leaf for internal transitions).
    Completed { new_state: S },
    /// No transition at any level in the hierarchy accepted the event.
    Declined,
}

/// Run one event to completion against `container`'s current state, per §4.4.
///
/// Requires `container.current_state()` to be `Some` — callers (the passive and active
/// runners) are responsible for rejecting `fire` before initialization.
pub fn fire_once<S, E, A>(
    graph: &StateGraph<S, E, A>,
    container: &mut StateContainer<S, E, A>,
    event: E,
    argument: A,
) -> FireOutcome<S>
where
    S: StateIdent,
    E: EventIdent,
{
    let s = container
        .current_state()
        .cloned()
        .expect("fire_once requires an initialized container");

    let mut level = Some(s.clone());
    while let Some(state_id) = level {
        let def = graph
            .get(&state_id)
            .unwrap_or_else(|| panic!("fire_once: unknown state {state_id:?}"));

        if let Some(candidates) = def.transitions_for(&event) {
            for candidate in candidates {
                let ctx = TransitionContext {
                    event: &event,
                    argument: &argument,
                    source: &s,
                };
                match evaluate_guard(candidate, &ctx) {
                    Ok(true) => {
                        tracing::debug!(?event, source = ?s, target = ?candidate.target, "transition begin");
                        notify_begin(container, &ctx);
                        let new_state = execute_transition(graph, container, &s, candidate, &ctx);
                        notify_completed(container, &event, &argument, &new_state);
                        tracing::debug!(?event, new_state = ?new_state, "transition completed");
                        return FireOutcome::Completed { new_state };
                    }
                    Ok(false) => continue,
                    Err(err) => {
                        notify_exception(container, Some(&event), Some(&state_id), EngineError::Guard(err));
                        continue;
                    }
                }
            }
        }

        level = def.super_state.clone();
    }

    tracing::debug!(?event, state = ?s, "transition declined");
    notify_declined(container, &event, &argument, &s);
    FireOutcome::Declined
}

fn evaluate_guard<S, E, A>(
    candidate: &TransitionDef<S, E, A>,
    ctx: &TransitionContext<'_, S, E, A>,
) -> Result<bool, crate::error::GuardError> {
    match candidate.guard_mut().as_mut() {
        Some(guard) => guard(ctx),
        None => Ok(true),
    }
}

/// Decide the exit/entry boundary for a transition from `src` to `tgt`, and whether the
/// boundary itself is exited/entered (see SPEC_FULL.md §4.4 for the derivation). `None` means
/// there is no shared ancestor to stop at: `src` and `tgt` live in different trees of the
/// forest, so the exit chain runs all the way to `src`'s root and the entry chain runs all the
/// way down from `tgt`'s root.
fn transition_boundary<S, E, A>(graph: &StateGraph<S, E, A>, src: &S, tgt: &S) -> (Option<S>, bool)
where
    S: StateIdent,
    E: EventIdent,
{
    if src == tgt || graph.is_descendant_of(src, tgt) {
        (Some(tgt.clone()), true)
    } else if graph.is_descendant_of(tgt, src) {
        (Some(src.clone()), false)
    } else {
        (graph.common_ancestor(src, tgt), false)
    }
}

fn execute_transition<S, E, A>(
    graph: &StateGraph<S, E, A>,
    container: &mut StateContainer<S, E, A>,
    s: &S,
    candidate: &TransitionDef<S, E, A>,
    ctx: &TransitionContext<'_, S, E, A>,
) -> S
where
    S: StateIdent,
    E: EventIdent,
{
    let Some(tgt) = &candidate.target else {
        run_transition_actions(candidate, container, ctx);
        return s.clone();
    };

    let (boundary, inclusive) = transition_boundary(graph, &candidate.source, tgt);

    let mut cursor = Some(s.clone());
    while let Some(id) = cursor {
        if boundary.as_ref() == Some(&id) {
            if inclusive {
                exit_state(graph, container, &id);
            }
            break;
        }
        exit_state(graph, container, &id);
        cursor = graph
            .get(&id)
            .unwrap_or_else(|| panic!("execute_transition: unknown state {id:?}"))
            .super_state
            .clone();
    }

    run_transition_actions(candidate, container, ctx);

    match &boundary {
        Some(b) if b == tgt => enter_state(graph, container, tgt),
        Some(b) => {
            let path = graph.path_from_to(b, tgt);
            enter_along_fixed_path(graph, container, &path);
        }
        None => {
            let mut path = graph.path_to_root(tgt);
            path.reverse();
            enter_along_fixed_path(graph, container, &path);
        }
    }

    container
        .current_state()
        .cloned()
        .expect("entry chain always leaves current_state set")
}

fn run_transition_actions<S, E, A>(
    candidate: &TransitionDef<S, E, A>,
    container: &mut StateContainer<S, E, A>,
    ctx: &TransitionContext<'_, S, E, A>,
) where
    S: StateIdent,
    E: EventIdent,
{
    for action in candidate.actions_mut().iter_mut() {
        if let Err(err) = action(ctx) {
            notify_exception(container, Some(ctx.event), Some(ctx.source), EngineError::Action(err));
        }
    }
}

fn notify_begin<S, E, A>(container: &mut StateContainer<S, E, A>, ctx: &TransitionContext<'_, S, E, A>)
where
    S: StateIdent,
    E: EventIdent,
{
    for ext in container.extensions_mut() {
        ext.transition_begin(ctx.event, ctx.argument, ctx.source);
    }
}

fn notify_completed<S, E, A>(container: &mut StateContainer<S, E, A>, event: &E, argument: &A, new_state: &S)
where
    S: StateIdent,
    E: EventIdent,
{
    for ext in container.extensions_mut() {
        ext.transition_completed(event, argument, new_state);
    }
}

fn notify_declined<S, E, A>(container: &mut StateContainer<S, E, A>, event: &E, argument: &A, state: &S)
where
    S: StateIdent,
    E: EventIdent,
{
    for ext in container.extensions_mut() {
        ext.transition_declined(event, argument, state);
    }
}

fn notify_exception<S, E, A>(
    container: &mut StateContainer<S, E, A>,
    event: Option<&E>,
    state: Option<&S>,
    error: EngineError,
) where
    S: StateIdent,
    E: EventIdent,
{
    for ext in container.extensions_mut() {
        ext.transition_exception_thrown(event, state, &error);
    }
    tracing::warn!(?event, ?state, error = %error, "transition exception thrown");
}
