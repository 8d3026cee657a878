use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hfsm_core::{state_logic, StateContainer, StateGraphBuilder, StateSpec, TransitionSpec};

// ============================================================================
// Baseline: flat two-state machine, no guards/actions/hierarchy
// ============================================================================

fn simple_graph() -> hfsm_core::StateGraph<&'static str, &'static str, ()> {
    StateGraphBuilder::<&'static str, &'static str, ()>::new()
        .add_state(StateSpec::new("Off").on("toggle_on", TransitionSpec::external("On")))
        .add_state(StateSpec::new("On").on("toggle_off", TransitionSpec::external("Off")))
        .build()
        .expect("well-formed graph")
}

fn benchmark_simple_transition(c: &mut Criterion) {
    let graph = simple_graph();
    c.bench_function("simple_transition", |b| {
        b.iter(|| {
            let mut container = StateContainer::new();
            state_logic::enter_state(&graph, &mut container, &"Off");
            black_box(hfsm_core::fire_once(&graph, &mut container, "toggle_on", ()));
            black_box(hfsm_core::fire_once(&graph, &mut container, "toggle_off", ()));
        });
    });
}

// ============================================================================
// With a guard: every candidate transition runs one always-true guard closure
// ============================================================================

fn guarded_graph() -> hfsm_core::StateGraph<&'static str, &'static str, ()> {
    StateGraphBuilder::<&'static str, &'static str, ()>::new()
        .add_state(
            StateSpec::new("Closed").on(
                "open",
                TransitionSpec::external("Open").guard(Box::new(|_ctx| Ok(true))),
            ),
        )
        .add_state(StateSpec::new("Open").on("close", TransitionSpec::external("Closed")))
        .build()
        .expect("well-formed graph")
}

fn benchmark_guarded_transition(c: &mut Criterion) {
    let graph = guarded_graph();
    c.bench_function("guarded_transition", |b| {
        b.iter(|| {
            let mut container = StateContainer::new();
            state_logic::enter_state(&graph, &mut container, &"Closed");
            black_box(hfsm_core::fire_once(&graph, &mut container, "open", ()));
            black_box(hfsm_core::fire_once(&graph, &mut container, "close", ()));
        });
    });
}

// ============================================================================
// With entry/exit/transition actions doing minimal work
// ============================================================================

fn action_graph() -> hfsm_core::StateGraph<&'static str, &'static str, ()> {
    StateGraphBuilder::<&'static str, &'static str, ()>::new()
        .add_state(
            StateSpec::new("Stopped")
                .on_exit(Box::new(|| Ok(())))
                .on(
                    "start",
                    TransitionSpec::external("Running").action(Box::new(|_ctx| Ok(()))),
                ),
        )
        .add_state(
            StateSpec::new("Running")
                .on_entry(Box::new(|| Ok(())))
                .on("stop", TransitionSpec::external("Stopped")),
        )
        .build()
        .expect("well-formed graph")
}

fn benchmark_action_transition(c: &mut Criterion) {
    let graph = action_graph();
    c.bench_function("action_transition", |b| {
        b.iter(|| {
            let mut container = StateContainer::new();
            state_logic::enter_state(&graph, &mut container, &"Stopped");
            black_box(hfsm_core::fire_once(&graph, &mut container, "start", ()));
            black_box(hfsm_core::fire_once(&graph, &mut container, "stop", ()));
        });
    });
}

// ============================================================================
// Hierarchical: transition between two leaves whose LCA is two levels up
// ============================================================================

fn hierarchical_graph() -> hfsm_core::StateGraph<&'static str, &'static str, ()> {
    StateGraphBuilder::<&'static str, &'static str, ()>::new()
        .add_state(
            StateSpec::new("Root")
                .sub_state("Left")
                .sub_state("Right")
                .initial_sub_state("Left"),
        )
        .add_state(
            StateSpec::new("Left")
                .super_state("Root")
                .sub_state("LeafA")
                .initial_sub_state("LeafA")
                .on("cross", TransitionSpec::external("LeafB")),
        )
        .add_state(StateSpec::new("LeafA").super_state("Left"))
        .add_state(
            StateSpec::new("Right")
                .super_state("Root")
                .sub_state("LeafB")
                .initial_sub_state("LeafB"),
        )
        .add_state(
            StateSpec::new("LeafB")
                .super_state("Right")
                .on("cross", TransitionSpec::external("LeafA")),
        )
        .build()
        .expect("well-formed graph")
}

fn benchmark_hierarchical_transition(c: &mut Criterion) {
    let graph = hierarchical_graph();
    c.bench_function("hierarchical_transition", |b| {
        b.iter(|| {
            let mut container = StateContainer::new();
            state_logic::enter_state(&graph, &mut container, &"Root");
            black_box(hfsm_core::fire_once(&graph, &mut container, "cross", ()));
            black_box(hfsm_core::fire_once(&graph, &mut container, "cross", ()));
        });
    });
}

// ============================================================================
// Shallow history: leave a composite and restore its last active child
// ============================================================================

fn history_graph() -> hfsm_core::StateGraph<&'static str, &'static str, ()> {
    StateGraphBuilder::<&'static str, &'static str, ()>::new()
        .add_state(
            StateSpec::new("Root")
                .sub_state("Remembered")
                .sub_state("Parked")
                .initial_sub_state("Remembered"),
        )
        .add_state(
            StateSpec::new("Remembered")
                .super_state("Root")
                .sub_state("X")
                .sub_state("Y")
                .initial_sub_state("X")
                .history(hfsm_core::HistoryKind::Shallow)
                .on("leave", TransitionSpec::external("Parked")),
        )
        .add_state(
            StateSpec::new("X")
                .super_state("Remembered")
                .on("advance", TransitionSpec::external("Y")),
        )
        .add_state(StateSpec::new("Y").super_state("Remembered"))
        .add_state(
            StateSpec::new("Parked")
                .super_state("Root")
                .on("renter", TransitionSpec::external("Remembered")),
        )
        .build()
        .expect("well-formed graph")
}

fn benchmark_history_restore_transition(c: &mut Criterion) {
    let graph = history_graph();
    c.bench_function("history_restore_transition", |b| {
        b.iter(|| {
            let mut container = StateContainer::new();
            state_logic::enter_state(&graph, &mut container, &"Root");
            black_box(hfsm_core::fire_once(&graph, &mut container, "advance", ()));
            black_box(hfsm_core::fire_once(&graph, &mut container, "leave", ()));
            black_box(hfsm_core::fire_once(&graph, &mut container, "renter", ()));
        });
    });
}

criterion_group!(
    benches,
    benchmark_simple_transition,
    benchmark_guarded_transition,
    benchmark_action_transition,
    benchmark_hierarchical_transition,
    benchmark_history_restore_transition,
);
criterion_main!(benches);
