//! Snapshot and restore of current state plus history (C7), against external `Saver`/
//! `Loader` contracts (§4.7/§6). Two reference adapters ship here purely as test fixtures
//! and demonstrations: an in-memory pair, and a small JSON-file-backed pair behind the
//! `json-persistence` feature.

use std::collections::HashMap;

use hfsm_core::{StateContainer, StateGraph};
use hfsm_core::{EventIdent, StateIdent};

use crate::error::StateMachineError;

/// Writes a snapshot of a machine's current state and history. Write order is
/// current-state first, then history, per §4.7.
pub trait Saver<S> {
    type Error: std::error::Error + Send + Sync + 'static;

    fn save_current_state(&mut self, current: Option<&S>) -> Result<(), Self::Error>;
    fn save_history_states(&mut self, history: &HashMap<S, S>) -> Result<(), Self::Error>;
}

/// Reads back what a `Saver` produced. The format itself is the loader's concern; the
/// engine only requires that `load` round-trips a prior `save`.
pub trait Loader<S> {
    type Error: std::error::Error + Send + Sync + 'static;

    fn load_current_state(&mut self) -> Result<Option<S>, Self::Error>;
    fn load_history_states(&mut self) -> Result<HashMap<S, S>, Self::Error>;
}

pub(crate) fn save<S, E, A, W>(container: &StateContainer<S, E, A>, saver: &mut W) -> Result<(), StateMachineError>
where
    S: StateIdent,
    E: EventIdent,
    W: Saver<S>,
{
    saver
        .save_current_state(container.current_state())
        .map_err(|e| StateMachineError::SaveFailed(e.to_string()))?;
    saver
        .save_history_states(container.history())
        .map_err(|e| StateMachineError::SaveFailed(e.to_string()))?;
    Ok(())
}

/// Legal only before `initialize`/`load`; fails with `AlreadyInitialized` otherwise (§4.7).
/// Every recorded history entry is checked against `graph` — an entry whose leaf is not a
/// descendant of its super-state fails with `InvalidHistoryState` and nothing is applied.
pub(crate) fn load<S, E, A, L>(
    graph: &StateGraph<S, E, A>,
    container: &mut StateContainer<S, E, A>,
    already_initialized: bool,
    loader: &mut L,
) -> Result<bool, StateMachineError>
where
    S: StateIdent,
    E: EventIdent,
    L: Loader<S>,
{
    if already_initialized {
        return Err(StateMachineError::AlreadyInitialized);
    }

    let current = loader
        .load_current_state()
        .map_err(|e| StateMachineError::LoadFailed(e.to_string()))?;
    let history = loader
        .load_history_states()
        .map_err(|e| StateMachineError::LoadFailed(e.to_string()))?;

    for (super_state, leaf) in &history {
        if !graph.is_descendant_of(leaf, super_state) {
            return Err(StateMachineError::invalid_history(super_state, leaf));
        }
    }

    let history_for_notify = history.clone();
    container.set_current_state(current.clone());
    container.set_history(history);
    tracing::debug!(?current, "state machine loaded");
    for ext in container.extensions_mut() {
        ext.loaded(current.as_ref(), &history_for_notify);
    }
    Ok(true)
}

/// An in-memory `Saver`/`Loader` pair, used by the crate's own round-trip tests.
#[derive(Debug, Default)]
pub struct InMemorySaver<S> {
    pub current: Option<S>,
    pub history: HashMap<S, S>,
}

impl<S: Clone + std::hash::Hash + Eq> Saver<S> for InMemorySaver<S> {
    type Error = std::convert::Infallible;

    fn save_current_state(&mut self, current: Option<&S>) -> Result<(), Self::Error> {
        self.current = current.cloned();
        Ok(())
    }

    fn save_history_states(&mut self, history: &HashMap<S, S>) -> Result<(), Self::Error> {
        self.history = history.clone();
        Ok(())
    }
}

/// Reads back whatever an [`InMemorySaver`] captured. Typically constructed from one via
/// [`InMemoryLoader::from_saver`].
#[derive(Debug, Default)]
pub struct InMemoryLoader<S> {
    pub current: Option<S>,
    pub history: HashMap<S, S>,
}

impl<S: Clone> InMemoryLoader<S> {
    pub fn from_saver(saver: &InMemorySaver<S>) -> Self {
        Self {
            current: saver.current.clone(),
            history: saver.history.clone(),
        }
    }
}

impl<S: Clone + std::hash::Hash + Eq> Loader<S> for InMemoryLoader<S> {
    type Error = std::convert::Infallible;

    fn load_current_state(&mut self) -> Result<Option<S>, Self::Error> {
        Ok(self.current.clone())
    }

    fn load_history_states(&mut self) -> Result<HashMap<S, S>, Self::Error> {
        Ok(self.history.clone())
    }
}

#[cfg(feature = "json-persistence")]
pub use json::{JsonFileLoader, JsonFileSaver};

#[cfg(feature = "json-persistence")]
mod json {
    use std::collections::HashMap;
    use std::fs;
    use std::hash::Hash;
    use std::path::PathBuf;

    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Serialize};

    use super::{Loader, Saver};

    #[derive(Serialize, Deserialize)]
    struct Document<S> {
        current: Option<S>,
        history: Vec<(S, S)>,
    }

    /// Writes current state and history to a JSON file at `path` on `save_history_states`
    /// (the second of the two calls §4.7 mandates), so a single file write captures both.
    pub struct JsonFileSaver<S> {
        path: PathBuf,
        current: Option<S>,
    }

    impl<S> JsonFileSaver<S> {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self {
                path: path.into(),
                current: None,
            }
        }
    }

    impl<S> Saver<S> for JsonFileSaver<S>
    where
        S: Clone + Eq + Hash + Serialize,
    {
        type Error = std::io::Error;

        fn save_current_state(&mut self, current: Option<&S>) -> Result<(), Self::Error> {
            self.current = current.cloned();
            Ok(())
        }

        fn save_history_states(&mut self, history: &HashMap<S, S>) -> Result<(), Self::Error> {
            let doc = Document {
                current: self.current.clone(),
                history: history.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            };
            let bytes = serde_json::to_vec_pretty(&doc)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            fs::write(&self.path, bytes)
        }
    }

    /// Reads back a document written by [`JsonFileSaver`].
    pub struct JsonFileLoader<S> {
        path: PathBuf,
        doc: Option<Document<S>>,
    }

    impl<S> JsonFileLoader<S> {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self {
                path: path.into(),
                doc: None,
            }
        }

        fn ensure_loaded(&mut self) -> std::io::Result<()>
        where
            S: DeserializeOwned,
        {
            if self.doc.is_none() {
                let bytes = fs::read(&self.path)?;
                let doc: Document<S> = serde_json::from_slice(&bytes)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                self.doc = Some(doc);
            }
            Ok(())
        }
    }

    impl<S> Loader<S> for JsonFileLoader<S>
    where
        S: Clone + Eq + Hash + DeserializeOwned,
    {
        type Error = std::io::Error;

        fn load_current_state(&mut self) -> Result<Option<S>, Self::Error> {
            self.ensure_loaded()?;
            Ok(self.doc.as_ref().and_then(|d| d.current.clone()))
        }

        fn load_history_states(&mut self) -> Result<HashMap<S, S>, Self::Error> {
            self.ensure_loaded()?;
            Ok(self
                .doc
                .as_ref()
                .map(|d| d.history.iter().cloned().collect())
                .unwrap_or_default())
        }
    }
}
