//! Registry of the node's input connectors.
//!
//! Inputs are registered once and then move through [`InputStatus`]. The
//! shutdown sequence only sees the inputs that are `Running` at the moment it
//! asks, through [`InputSource::running_inputs`].

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::framework::{InputSource, MessageInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStatus {
    Created,
    Starting,
    Running,
    Failed,
    Stopped,
}

#[derive(Clone)]
pub struct InputState {
    pub input: Arc<dyn MessageInput>,
    pub status: InputStatus,
}

#[derive(Default)]
pub struct InputRegistry {
    inputs: RwLock<Vec<InputState>>,
}

impl InputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an input in the `Created` state.
    pub fn register(&self, input: Arc<dyn MessageInput>) {
        debug!(input_id = input.id(), name = input.name(), "Input registered");
        self.write().push(InputState {
            input,
            status: InputStatus::Created,
        });
    }

    /// Registers an input and marks it `Running`.
    pub fn launch(&self, input: Arc<dyn MessageInput>) {
        info!(input_id = input.id(), name = input.name(), "Input launched");
        self.write().push(InputState {
            input,
            status: InputStatus::Running,
        });
    }

    /// Updates the status of the input with `id`. Returns false if unknown.
    pub fn set_status(&self, id: &str, status: InputStatus) -> bool {
        let mut inputs = self.write();
        match inputs.iter_mut().find(|state| state.input.id() == id) {
            Some(state) => {
                debug!(input_id = id, from = ?state.status, to = ?status, "Input status change");
                state.status = status;
                true
            }
            None => {
                warn!(input_id = id, "Unknown input");
                false
            }
        }
    }

    pub fn status(&self, id: &str) -> Option<InputStatus> {
        self.read()
            .iter()
            .find(|state| state.input.id() == id)
            .map(|state| state.status)
    }

    /// Removes the input with `id`, returning its last known state.
    pub fn remove(&self, id: &str) -> Option<InputState> {
        let mut inputs = self.write();
        let index = inputs.iter().position(|state| state.input.id() == id)?;
        Some(inputs.remove(index))
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<InputState>> {
        self.inputs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<InputState>> {
        self.inputs.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InputSource for InputRegistry {
    fn running_inputs(&self) -> Vec<Arc<dyn MessageInput>> {
        self.read()
            .iter()
            .filter(|state| state.status == InputStatus::Running)
            .map(|state| state.input.clone())
            .collect()
    }
}
