use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::error::{ActionError, GraphError, GuardError};
use crate::history::HistoryKind;
use crate::ids::{EventIdent, StateIdent};

/// An entry or exit action. Returning `Err` does not abort the entry/exit sequence; the
/// error is surfaced to extensions as `TransitionExceptionThrown` and the next action
/// (or the rest of the sequence) still runs.
pub type StateAction = Box<dyn FnMut() -> Result<(), ActionError> + Send>;

/// A transition action, run between the exit chain and the entry chain.
pub type TransitionAction<S, E, A> =
    Box<dyn FnMut(&TransitionContext<'_, S, E, A>) -> Result<(), ActionError> + Send>;

/// A transition guard. Absent guards count as `true`; an `Err` counts as `false` and is
/// surfaced as `TransitionExceptionThrown`.
pub type Guard<S, E, A> =
    Box<dyn FnMut(&TransitionContext<'_, S, E, A>) -> Result<bool, GuardError> + Send>;

/// The event/argument/originating-state triple visible to guards and transition actions.
///
/// Borrows rather than owns its fields so the same `argument` can be offered, unmodified, to
/// every guard candidate considered while bubbling up the hierarchy for a single `fire`.
pub struct TransitionContext<'a, S, E, A> {
    pub event: &'a E,
    pub argument: &'a A,
    /// The state that was current when `fire` was called (may differ from the transition's
    /// declared source when the event bubbled up from a descendant).
    pub source: &'a S,
}

/// One transition definition, reachable from the state whose event map it lives in.
pub struct TransitionDef<S, E, A> {
    /// The state this transition is declared on (§3 invariant 4: always the owning state).
    pub source: S,
    /// Absent means an internal transition: actions run, no exit/entry.
    pub target: Option<S>,
    guard: RefCell<Option<Guard<S, E, A>>>,
    actions: RefCell<Vec<TransitionAction<S, E, A>>>,
}

impl<S, E, A> TransitionDef<S, E, A> {
    pub(crate) fn guard_mut(&self) -> std::cell::RefMut<'_, Option<Guard<S, E, A>>> {
        self.guard.borrow_mut()
    }

    pub(crate) fn actions_mut(&self) -> std::cell::RefMut<'_, Vec<TransitionAction<S, E, A>>> {
        self.actions.borrow_mut()
    }

    pub fn is_internal(&self) -> bool {
        self.target.is_none()
    }
}

/// One state definition, immutable after [`StateGraphBuilder::build`] succeeds.
pub struct StateDef<S, E, A> {
    pub id: S,
    pub super_state: Option<S>,
    pub sub_states: Vec<S>,
    pub initial_sub_state: Option<S>,
    pub history: HistoryKind,
    /// Depth from the root; a root state has level 0.
    pub level: usize,
    entry_actions: RefCell<Vec<StateAction>>,
    exit_actions: RefCell<Vec<StateAction>>,
    transitions: HashMap<E, Vec<TransitionDef<S, E, A>>>,
}

impl<S, E, A> StateDef<S, E, A>
where
    E: EventIdent,
{
    pub fn is_composite(&self) -> bool {
        !self.sub_states.is_empty()
    }

    pub fn transitions_for(&self, event: &E) -> Option<&[TransitionDef<S, E, A>]> {
        self.transitions.get(event).map(Vec::as_slice)
    }

    pub(crate) fn entry_actions(&self) -> &RefCell<Vec<StateAction>> {
        &self.entry_actions
    }

    pub(crate) fn exit_actions(&self) -> &RefCell<Vec<StateAction>> {
        &self.exit_actions
    }
}

/// The immutable, post-build graph of states and transitions (C1).
pub struct StateGraph<S, E, A>
where
    S: StateIdent,
    E: EventIdent,
{
    states: HashMap<S, StateDef<S, E, A>>,
}

impl<S, E, A> StateGraph<S, E, A>
where
    S: StateIdent,
    E: EventIdent,
{
    pub fn get(&self, id: &S) -> Option<&StateDef<S, E, A>> {
        self.states.get(id)
    }

    pub fn contains(&self, id: &S) -> bool {
        self.states.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// All state definitions, in unspecified but (for a given built graph) stable order.
    /// Used by the report generator contract and by tests that enumerate the whole graph.
    pub fn iter(&self) -> impl Iterator<Item = &StateDef<S, E, A>> {
        self.states.values()
    }

    /// Ordered ancestor chain starting at `s` itself and ending at its root.
    pub fn path_to_root(&self, s: &S) -> Vec<S> {
        let mut path = Vec::new();
        let mut current = Some(s.clone());
        let mut seen = HashSet::new();
        while let Some(id) = current {
            if !seen.insert(id.clone()) {
                break;
            }
            let next = self.states.get(&id).and_then(|d| d.super_state.clone());
            path.push(id);
            current = next;
        }
        path
    }

    /// Whether `a` is a strict descendant of `b`.
    pub fn is_descendant_of(&self, a: &S, b: &S) -> bool {
        if a == b {
            return false;
        }
        self.path_to_root(a).iter().skip(1).any(|ancestor| ancestor == b)
    }

    /// The lowest ancestor shared by `a` and `b` (possibly `a` or `b` itself), or `None` if
    /// they live in disjoint trees of a forest.
    pub fn common_ancestor(&self, a: &S, b: &S) -> Option<S> {
        let b_chain: HashSet<S> = self.path_to_root(b).into_iter().collect();
        self.path_to_root(a).into_iter().find(|candidate| b_chain.contains(candidate))
    }

    /// The ordered chain from the direct child of `ancestor` down to `descendant` inclusive.
    /// Panics if `descendant` is not `ancestor` or a descendant of it — callers only invoke
    /// this once that relationship has already been established by the transition engine.
    pub(crate) fn path_from_to(&self, ancestor: &S, descendant: &S) -> Vec<S> {
        let mut chain = self.path_to_root(descendant);
        let idx = chain
            .iter()
            .position(|id| id == ancestor)
            .expect("path_from_to: descendant must be ancestor itself or a true descendant");
        chain.truncate(idx);
        chain.reverse();
        chain
    }
}

/// A state, as supplied to the builder, before cross-referential invariants are checked.
pub struct StateSpec<S, E, A> {
    id: S,
    super_state: Option<S>,
    sub_states: Vec<S>,
    initial_sub_state: Option<S>,
    history: HistoryKind,
    entry_actions: Vec<StateAction>,
    exit_actions: Vec<StateAction>,
    transitions: Vec<(E, TransitionSpec<S, E, A>)>,
}

impl<S, E, A> StateSpec<S, E, A> {
    pub fn new(id: S) -> Self {
        Self {
            id,
            super_state: None,
            sub_states: Vec::new(),
            initial_sub_state: None,
            history: HistoryKind::None,
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn super_state(mut self, id: S) -> Self {
        self.super_state = Some(id);
        self
    }

    pub fn sub_state(mut self, id: S) -> Self {
        self.sub_states.push(id);
        self
    }

    pub fn initial_sub_state(mut self, id: S) -> Self {
        self.initial_sub_state = Some(id);
        self
    }

    pub fn history(mut self, kind: HistoryKind) -> Self {
        self.history = kind;
        self
    }

    pub fn on_entry(mut self, action: StateAction) -> Self {
        self.entry_actions.push(action);
        self
    }

    pub fn on_exit(mut self, action: StateAction) -> Self {
        self.exit_actions.push(action);
        self
    }

    pub fn on(mut self, event: E, transition: TransitionSpec<S, E, A>) -> Self {
        self.transitions.push((event, transition));
        self
    }
}

/// A transition, as supplied to the builder, before its `source` is stamped in by
/// [`StateGraphBuilder::build`].
pub struct TransitionSpec<S, E, A> {
    target: Option<S>,
    guard: Option<Guard<S, E, A>>,
    actions: Vec<TransitionAction<S, E, A>>,
}

impl<S, E, A> TransitionSpec<S, E, A> {
    /// An internal transition: no target, no exit/entry.
    pub fn internal() -> Self {
        Self {
            target: None,
            guard: None,
            actions: Vec::new(),
        }
    }

    /// An external (or, if `target` equals the owning state, self-) transition.
    pub fn external(target: S) -> Self {
        Self {
            target: Some(target),
            guard: None,
            actions: Vec::new(),
        }
    }

    pub fn guard(mut self, guard: Guard<S, E, A>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn action(mut self, action: TransitionAction<S, E, A>) -> Self {
        self.actions.push(action);
        self
    }
}

/// Plain, non-macro construction of a [`StateGraph`] (§4.1.1). Not the fluent builder DSL
/// mentioned as out of scope in the specification — this is the ordinary imperative path
/// such a DSL (or a hand-written caller, or a test) would drive to produce the data model.
#[derive(Default)]
pub struct StateGraphBuilder<S, E, A> {
    specs: Vec<StateSpec<S, E, A>>,
}

impl<S, E, A> StateGraphBuilder<S, E, A>
where
    S: StateIdent,
    E: EventIdent,
{
    pub fn new() -> Self {
        Self { specs: Vec::new() }
    }

    pub fn add_state(mut self, spec: StateSpec<S, E, A>) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn build(self) -> Result<StateGraph<S, E, A>, GraphError<S>> {
        let mut by_id: HashMap<S, &StateSpec<S, E, A>> = HashMap::new();
        for spec in &self.specs {
            if by_id.insert(spec.id.clone(), spec).is_some() {
                return Err(GraphError::DuplicateState(spec.id.clone()));
            }
        }

        for spec in &self.specs {
            if let Some(parent_id) = &spec.super_state {
                let parent = by_id
                    .get(parent_id)
                    .ok_or_else(|| GraphError::UnknownState(parent_id.clone()))?;
                if !parent.sub_states.contains(&spec.id) {
                    return Err(GraphError::SuperSubMismatch {
                        child: spec.id.clone(),
                        parent: parent_id.clone(),
                    });
                }
            }
            for child_id in &spec.sub_states {
                let child = by_id
                    .get(child_id)
                    .ok_or_else(|| GraphError::UnknownState(child_id.clone()))?;
                if child.super_state.as_ref() != Some(&spec.id) {
                    return Err(GraphError::SuperSubMismatch {
                        child: child_id.clone(),
                        parent: spec.id.clone(),
                    });
                }
            }
            if !spec.sub_states.is_empty() {
                match &spec.initial_sub_state {
                    None => {
                        return Err(GraphError::MissingInitialSubState {
                            state: spec.id.clone(),
                        })
                    }
                    Some(initial) if !spec.sub_states.contains(initial) => {
                        return Err(GraphError::InitialNotASubState {
                            state: spec.id.clone(),
                            initial: initial.clone(),
                        })
                    }
                    Some(_) => {}
                }
            } else if spec.history != HistoryKind::None {
                return Err(GraphError::HistoryOnLeaf {
                    state: spec.id.clone(),
                });
            }
            for (_, transition) in &spec.transitions {
                if let Some(target) = &transition.target {
                    if !by_id.contains_key(target) {
                        return Err(GraphError::UnknownState(target.clone()));
                    }
                }
            }
        }

        for spec in &self.specs {
            let mut seen = HashSet::new();
            let mut cursor = Some(spec.id.clone());
            let mut steps = 0usize;
            loop {
                let Some(id) = cursor else { break };
                if !seen.insert(id.clone()) {
                    return Err(GraphError::CycleDetected(spec.id.clone()));
                }
                steps += 1;
                if steps > self.specs.len() {
                    return Err(GraphError::CycleDetected(spec.id.clone()));
                }
                cursor = by_id.get(&id).and_then(|s| s.super_state.clone());
            }
        }

        let mut levels: HashMap<S, usize> = HashMap::new();
        for spec in &self.specs {
            if levels.contains_key(&spec.id) {
                continue;
            }
            let mut chain = vec![spec.id.clone()];
            let mut cursor = spec.super_state.clone();
            while let Some(id) = cursor {
                if let Some(known) = levels.get(&id) {
                    let base = *known;
                    for (i, id) in chain.iter().rev().enumerate() {
                        levels.insert(id.clone(), base + 1 + i);
                    }
                    chain.clear();
                    break;
                }
                chain.push(id.clone());
                cursor = by_id.get(&id).and_then(|s| s.super_state.clone());
            }
            if !chain.is_empty() {
                for (i, id) in chain.iter().rev().enumerate() {
                    levels.insert(id.clone(), i);
                }
            }
        }

        let mut states = HashMap::new();
        for spec in self.specs {
            let StateSpec {
                id,
                super_state,
                sub_states,
                initial_sub_state,
                history,
                entry_actions,
                exit_actions,
                transitions,
            } = spec;
            let mut grouped: HashMap<E, Vec<TransitionDef<S, E, A>>> = HashMap::new();
            for (event, transition) in transitions {
                let TransitionSpec {
                    target,
                    guard,
                    actions,
                } = transition;
                grouped.entry(event).or_default().push(TransitionDef {
                    source: id.clone(),
                    target,
                    guard: RefCell::new(guard),
                    actions: RefCell::new(actions),
                });
            }
            let level = levels[&id];
            states.insert(
                id.clone(),
                StateDef {
                    id,
                    super_state,
                    sub_states,
                    initial_sub_state,
                    history,
                    level,
                    entry_actions: RefCell::new(entry_actions),
                    exit_actions: RefCell::new(exit_actions),
                    transitions: grouped,
                },
            );
        }

        Ok(StateGraph { states })
    }
}
