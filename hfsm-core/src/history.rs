/// How a composite state restores its active sub-state on re-entry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    /// Re-entry always descends through `initial_sub_state`.
    #[default]
    None,
    /// Re-entry restores the immediate child that was last active; any deeper descent
    /// beneath that child uses initial sub-states, ignoring the child's own history.
    Shallow,
    /// Re-entry restores the exact leaf that was last active, replaying entry actions
    /// for every intermediate state on the path down to it.
    Deep,
}
