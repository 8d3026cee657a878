use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use hfsm::{ActiveStateMachine, StateGraphBuilder, StateSpec, TransitionSpec};

#[test]
fn lifecycle_initialize_start_fire_stop() {
    let graph = StateGraphBuilder::<&'static str, &'static str, ()>::new()
        .add_state(StateSpec::new("A").on("e", TransitionSpec::external("B")))
        .add_state(StateSpec::new("B"))
        .build()
        .expect("well-formed graph");

    let machine = ActiveStateMachine::new(graph);
    machine.initialize("A").unwrap();
    machine.start().unwrap();
    assert!(machine.is_running());

    machine.fire("e", ()).unwrap();
    machine.stop().unwrap();

    assert!(!machine.is_running());
    assert_eq!(machine.current_state(), Some("B"));
}

#[test]
fn stop_is_idempotent_and_start_is_idempotent() {
    let graph = StateGraphBuilder::<&'static str, &'static str, ()>::new()
        .add_state(StateSpec::new("A"))
        .build()
        .expect("well-formed graph");

    let machine = ActiveStateMachine::new(graph);
    machine.initialize("A").unwrap();

    machine.start().unwrap();
    machine.start().unwrap();
    assert!(machine.is_running());

    machine.stop().unwrap();
    machine.stop().unwrap();
    assert!(!machine.is_running());
}

#[test]
fn fire_before_initialize_is_rejected() {
    let graph = StateGraphBuilder::<&'static str, &'static str, ()>::new()
        .add_state(StateSpec::new("A"))
        .build()
        .expect("well-formed graph");

    let machine = ActiveStateMachine::new(graph);
    assert!(machine.fire("e", ()).is_err());
}

#[test]
fn double_initialize_is_rejected() {
    let graph = StateGraphBuilder::<&'static str, &'static str, ()>::new()
        .add_state(StateSpec::new("A"))
        .build()
        .expect("well-formed graph");

    let machine = ActiveStateMachine::new(graph);
    machine.initialize("A").unwrap();
    assert!(machine.initialize("A").is_err());
}

/// S5 — priority ordering. `fire(e1)` is picked up first and its action blocks the worker on
/// a latch until released; `fire(e2)`, `fire_priority(p1)`, `fire_priority(p2)` are all queued
/// while the worker sits on that latch. Releasing it should drain the queue in the order the
/// FIFO-with-LIFO-at-head discipline predicts: e1 (already popped), then p2, then p1, then e2.
#[test]
fn s5_priority_events_jump_the_normal_queue() {
    let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let (started_tx, started_rx) = mpsc::channel::<()>();
    let started_tx = Arc::new(Mutex::new(Some(started_tx)));
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Arc::new(Mutex::new(release_rx));

    let record = |name: &'static str, log: Arc<Mutex<Vec<&'static str>>>| {
        Box::new(move |_ctx: &hfsm_core::TransitionContext<'_, &'static str, &'static str, ()>| {
            log.lock().unwrap().push(name);
            Ok(())
        }) as hfsm_core::TransitionAction<&'static str, &'static str, ()>
    };

    let e1_action = {
        let log = log.clone();
        let started_tx = started_tx.clone();
        let release_rx = release_rx.clone();
        Box::new(move |_ctx: &hfsm_core::TransitionContext<'_, &'static str, &'static str, ()>| {
            if let Some(tx) = started_tx.lock().unwrap().take() {
                let _ = tx.send(());
            }
            let _ = release_rx.lock().unwrap().recv();
            log.lock().unwrap().push("e1");
            Ok(())
        }) as hfsm_core::TransitionAction<&'static str, &'static str, ()>
    };

    let graph = StateGraphBuilder::<&'static str, &'static str, ()>::new()
        .add_state(
            StateSpec::new("S")
                .on("e1", TransitionSpec::internal().action(e1_action))
                .on("e2", TransitionSpec::internal().action(record("e2", log.clone())))
                .on("p1", TransitionSpec::internal().action(record("p1", log.clone())))
                .on("p2", TransitionSpec::internal().action(record("p2", log.clone()))),
        )
        .build()
        .expect("well-formed graph");

    let machine = ActiveStateMachine::new(graph);
    machine.initialize("S").unwrap();
    machine.start().unwrap();

    machine.fire("e1", ()).unwrap();
    started_rx
        .recv_timeout(std::time::Duration::from_secs(5))
        .expect("worker should pick up e1 and block on the latch");

    machine.fire("e2", ()).unwrap();
    machine.fire_priority("p1", ()).unwrap();
    machine.fire_priority("p2", ()).unwrap();

    release_tx.send(()).unwrap();
    machine.stop().unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["e1", "p2", "p1", "e2"]);
}

#[test]
fn queued_events_survive_a_stop_and_are_drained_after_restart() {
    let graph = StateGraphBuilder::<&'static str, &'static str, ()>::new()
        .add_state(StateSpec::new("A").on("e", TransitionSpec::external("B")))
        .add_state(StateSpec::new("B"))
        .build()
        .expect("well-formed graph");

    let machine = ActiveStateMachine::new(graph);
    machine.initialize("A").unwrap();
    machine.start().unwrap();
    machine.stop().unwrap();

    // Queue an event while stopped; nothing is running to consume it yet.
    machine.fire("e", ()).unwrap();
    assert_eq!(machine.current_state(), Some("A"));

    machine.start().unwrap();
    machine.stop().unwrap();
    assert_eq!(machine.current_state(), Some("B"));
}
