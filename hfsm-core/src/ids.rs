use std::fmt::Debug;
use std::hash::Hash;

/// Blanket bound for anything usable as a state identifier.
///
/// Mirrors the teacher crate's `MachineState` blanket impl: any `Clone + Eq + Hash + Debug`
/// type that can cross the active runner's worker-thread boundary qualifies, so applications
/// can use a plain `enum`, a `&'static str`, or a `u32` without writing a marker impl by hand.
pub trait StateIdent: Clone + Eq + Hash + Debug + Send + 'static {}
impl<T> StateIdent for T where T: Clone + Eq + Hash + Debug + Send + 'static {}

/// Blanket bound for anything usable as an event identifier. See [`StateIdent`].
pub trait EventIdent: Clone + Eq + Hash + Debug + Send + 'static {}
impl<T> EventIdent for T where T: Clone + Eq + Hash + Debug + Send + 'static {}
