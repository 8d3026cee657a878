//! The active runner (C6): a single dedicated worker thread draining an event queue with
//! FIFO ordering for normal events and LIFO-at-head ordering for priority events (§4.6/§5).

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use hfsm_core::{state_logic, Extension, StateContainer, StateGraph};
use hfsm_core::{EventIdent, StateIdent};

use crate::error::StateMachineError;
use crate::persistence::{Loader, Saver};
use crate::report::Reporter;

/// Construction-time knobs for [`ActiveStateMachine`]'s worker thread and queue. The queue
/// discipline itself (FIFO + LIFO-at-head) is fixed by the spec and not configurable here.
#[derive(Debug, Clone)]
pub struct ActiveStateMachineConfig {
    pub worker_name: String,
    pub queue_capacity_hint: usize,
}

impl Default for ActiveStateMachineConfig {
    fn default() -> Self {
        Self {
            worker_name: "hfsm-worker".to_string(),
            queue_capacity_hint: 16,
        }
    }
}

impl ActiveStateMachineConfig {
    pub fn with_worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = name.into();
        self
    }

    pub fn with_queue_capacity_hint(mut self, hint: usize) -> Self {
        self.queue_capacity_hint = hint;
        self
    }
}

struct RunnerState<S, E, A>
where
    S: StateIdent,
    E: EventIdent,
{
    graph: StateGraph<S, E, A>,
    container: StateContainer<S, E, A>,
    initialized: bool,
    pending_initialization: bool,
    initial_state_id: Option<S>,
}

struct QueueState<E, A> {
    events: VecDeque<(E, A)>,
    cancelled: bool,
}

/// A panic inside a guard/action is caught at the worker's `catch_unwind` boundary, but it
/// happens while holding `state`'s lock, which would otherwise poison it for the lifetime of
/// the machine. Recovering the guard keeps `current_state`/`stop`/`save` usable afterwards;
/// `stop` is what actually surfaces the fault via `StateMachineError::WorkerFault`.
fn lock_state<S, E, A>(inner: &Inner<S, E, A>) -> std::sync::MutexGuard<'_, RunnerState<S, E, A>>
where
    S: StateIdent,
    E: EventIdent,
{
    inner.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lock_queue<E, A>(queue: &Mutex<QueueState<E, A>>) -> std::sync::MutexGuard<'_, QueueState<E, A>> {
    queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Inner<S, E, A>
where
    S: StateIdent,
    E: EventIdent,
{
    state: Mutex<RunnerState<S, E, A>>,
    queue: Mutex<QueueState<E, A>>,
    queue_cv: Condvar,
    worker: Mutex<Option<JoinHandle<()>>>,
    fault: Mutex<Option<String>>,
    config: ActiveStateMachineConfig,
}

/// Owns a worker-thread event loop over a [`StateGraph`]. `initialize` only records the
/// requested initial state; the first worker tick after `start` actually enters it, so
/// extensions observing `started_state_machine` see the machine already running (§4.6).
pub struct ActiveStateMachine<S, E, A>
where
    S: StateIdent,
    E: EventIdent,
{
    inner: Arc<Inner<S, E, A>>,
}

impl<S, E, A> ActiveStateMachine<S, E, A>
where
    S: StateIdent,
    E: EventIdent,
    A: Send + 'static,
{
    pub fn new(graph: StateGraph<S, E, A>) -> Self {
        Self::with_config(graph, ActiveStateMachineConfig::default())
    }

    pub fn with_config(graph: StateGraph<S, E, A>, config: ActiveStateMachineConfig) -> Self {
        let state = RunnerState {
            graph,
            container: StateContainer::new(),
            initialized: false,
            pending_initialization: false,
            initial_state_id: None,
        };
        let queue = QueueState {
            events: VecDeque::with_capacity(config.queue_capacity_hint),
            cancelled: false,
        };
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                queue: Mutex::new(queue),
                queue_cv: Condvar::new(),
                worker: Mutex::new(None),
                fault: Mutex::new(None),
                config,
            }),
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.worker.lock().unwrap().is_some()
    }

    pub fn current_state(&self) -> Option<S> {
        lock_state(&self.inner).container.current_state().cloned()
    }

    /// Records `initial` and marks the machine ready to `start`. Entry itself runs on the
    /// worker's first tick, not here. Fails with `AlreadyInitialized` on a second call.
    pub fn initialize(&self, initial: S) -> Result<(), StateMachineError> {
        let mut state = lock_state(&self.inner);
        if state.initialized {
            return Err(StateMachineError::AlreadyInitialized);
        }
        state.initial_state_id = Some(initial);
        state.initialized = true;
        state.pending_initialization = true;
        Ok(())
    }

    /// Spawns the worker thread. Idempotent: calling `start` while already running is a
    /// no-op.
    pub fn start(&self) -> Result<(), StateMachineError> {
        let mut handle_guard = self.inner.worker.lock().unwrap();
        if handle_guard.is_some() {
            return Ok(());
        }
        {
            let mut queue = lock_queue(&self.inner.queue);
            queue.cancelled = false;
        }

        let inner = Arc::clone(&self.inner);
        let handle = thread::Builder::new()
            .name(self.inner.config.worker_name.clone())
            .spawn(move || {
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| worker_loop(&inner)));
                if let Err(panic) = outcome {
                    *inner.fault.lock().unwrap() = Some(panic_message(&panic));
                }
            })
            .expect("failed to spawn hfsm worker thread");
        *handle_guard = Some(handle);
        Ok(())
    }

    /// Signals cancellation, wakes the worker, and joins it. Events left in the queue are
    /// retained for a subsequent `start`. Idempotent; re-raises a prior worker fault to
    /// whichever caller of `stop` observes it first.
    pub fn stop(&self) -> Result<(), StateMachineError> {
        {
            let mut queue = lock_queue(&self.inner.queue);
            queue.cancelled = true;
        }
        self.inner.queue_cv.notify_all();

        let handle = self.inner.worker.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }

        if let Some(fault) = self.inner.fault.lock().unwrap().take() {
            return Err(StateMachineError::WorkerFault(fault));
        }
        Ok(())
    }

    /// Appends `event` to the back of the queue and wakes the worker.
    pub fn fire(&self, event: E, argument: A) -> Result<(), StateMachineError> {
        self.require_initialized()?;
        {
            let mut queue = lock_queue(&self.inner.queue);
            queue.events.push_back((event.clone(), argument));
        }
        self.inner.queue_cv.notify_one();
        let mut state = lock_state(&self.inner);
        for ext in state.container.extensions_mut() {
            ext.event_queued(&event);
        }
        Ok(())
    }

    /// Prepends `event` to the front of the queue (LIFO-at-head) and wakes the worker.
    pub fn fire_priority(&self, event: E, argument: A) -> Result<(), StateMachineError> {
        self.require_initialized()?;
        {
            let mut queue = lock_queue(&self.inner.queue);
            queue.events.push_front((event.clone(), argument));
        }
        self.inner.queue_cv.notify_one();
        let mut state = lock_state(&self.inner);
        for ext in state.container.extensions_mut() {
            ext.event_queued_with_priority(&event);
        }
        Ok(())
    }

    pub fn add_extension(&self, extension: Box<dyn Extension<S, E, A>>) {
        lock_state(&self.inner).container.add_extension(extension);
    }

    pub fn clear_extensions(&self) {
        lock_state(&self.inner).container.clear_extensions();
    }

    pub fn save<W: Saver<S>>(&self, saver: &mut W) -> Result<(), StateMachineError> {
        let state = lock_state(&self.inner);
        crate::persistence::save(&state.container, saver)
    }

    /// Legal only before `initialize`/`load`; restores `current_state` and history and
    /// leaves `pending_initialization` unset, since the restored state is already entered.
    pub fn load<L: Loader<S>>(&self, loader: &mut L) -> Result<(), StateMachineError> {
        let mut state = lock_state(&self.inner);
        let was_initialized = state.initialized;
        crate::persistence::load(&state.graph, &mut state.container, was_initialized, loader)?;
        state.initialized = true;
        state.pending_initialization = false;
        state.initial_state_id = state.container.current_state().cloned();
        Ok(())
    }

    pub fn report<R: Reporter<S, E, A>>(&self, reporter: &mut R) {
        let state = lock_state(&self.inner);
        crate::report::walk(&state.graph, state.container.name(), state.initial_state_id.as_ref(), reporter);
    }

    fn require_initialized(&self) -> Result<(), StateMachineError> {
        let state = lock_state(&self.inner);
        if !state.initialized || (!state.pending_initialization && state.container.current_state().is_none()) {
            return Err(StateMachineError::NotInitialized);
        }
        Ok(())
    }
}

fn worker_loop<S, E, A>(inner: &Inner<S, E, A>)
where
    S: StateIdent,
    E: EventIdent,
{
    {
        let mut state = lock_state(inner);
        for ext in state.container.extensions_mut() {
            ext.started_state_machine();
        }
    }
    tracing::debug!("hfsm worker started");

    loop {
        {
            let mut state = lock_state(inner);
            if state.pending_initialization {
                if let Some(initial) = state.initial_state_id.clone() {
                    state_logic::enter_state(&state.graph, &mut state.container, &initial);
                }
                state.pending_initialization = false;
            }
        }

        let next = {
            let mut queue = lock_queue(&inner.queue);
            loop {
                if let Some(event) = queue.events.pop_front() {
                    break Some(event);
                }
                if queue.cancelled {
                    break None;
                }
                queue = inner.queue_cv.wait(queue).unwrap();
            }
        };

        let Some((event, argument)) = next else { break };
        let mut state = lock_state(inner);
        let outcome = hfsm_core::fire_once(&state.graph, &mut state.container, event, argument);
        tracing::trace!(?outcome, "hfsm worker processed event");
    }

    let mut state = lock_state(inner);
    for ext in state.container.extensions_mut() {
        ext.stopped_state_machine();
    }
    tracing::debug!("hfsm worker stopped");
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker thread panicked with a non-string payload".to_string()
    }
}
