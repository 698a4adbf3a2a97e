use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::shutdown::GracefulShutdown;

/// Cloneable entry point shared by everything that may start a shutdown:
/// the signal listener, admin endpoints, fatal-error paths.
///
/// Only the first [`trigger`](ShutdownTrigger::trigger) starts the sequence.
#[derive(Clone)]
pub struct ShutdownTrigger {
    pending: Arc<Mutex<Option<GracefulShutdown>>>,
}

impl ShutdownTrigger {
    pub fn new(shutdown: GracefulShutdown) -> Self {
        Self {
            pending: Arc::new(Mutex::new(Some(shutdown))),
        }
    }

    /// Spawns the shutdown sequence on its own task.
    ///
    /// Returns the task handle the first time, `None` on every later call.
    pub fn trigger(&self, reason: &str) -> Option<JoinHandle<()>> {
        let shutdown = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match shutdown {
            Some(shutdown) => {
                info!(reason, "Graceful shutdown triggered");
                Some(shutdown.spawn())
            }
            None => {
                warn!(reason, "Graceful shutdown already in progress, ignoring trigger");
                None
            }
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}
