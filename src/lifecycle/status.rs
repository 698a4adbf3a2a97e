use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, info};

use crate::framework::StatusControl;
use crate::lifecycle::Lifecycle;

/// Returned when message processing is resumed while the pause is locked.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Processing pause is locked. Unlock it before resuming message processing.")]
pub struct ProcessingPauseLocked;

/// Process-wide node status.
///
/// Shared as `Arc<ServerStatus>` by everything that reads or writes the
/// lifecycle. There is no global instance: whoever needs the state gets the
/// handle injected.
#[derive(Debug, Default)]
pub struct ServerStatus {
    lifecycle: RwLock<Lifecycle>,
    processing: AtomicBool,
    processing_pause_locked: AtomicBool,
}

impl ServerStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the node as started and processing.
    pub fn start(&self) {
        self.processing.store(true, Ordering::SeqCst);
        self.set(Lifecycle::Running);
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    pub fn is_processing_pause_locked(&self) -> bool {
        self.processing_pause_locked.load(Ordering::SeqCst)
    }

    /// Pauses message processing. With `lock` set, the pause cannot be
    /// resumed until [`StatusControl::unlock_processing_pause`] is called.
    pub fn pause_message_processing(&self, lock: bool) {
        self.processing.store(false, Ordering::SeqCst);
        if lock {
            self.processing_pause_locked.store(true, Ordering::SeqCst);
        }
        self.set(Lifecycle::Paused);
        info!(locked = lock, "Message processing paused");
    }

    fn set(&self, lifecycle: Lifecycle) {
        let mut current = self
            .lifecycle
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        debug!(from = %*current, to = %lifecycle, "Lifecycle change");
        *current = lifecycle;
    }
}

impl StatusControl for ServerStatus {
    fn set_lifecycle(&self, lifecycle: Lifecycle) {
        self.set(lifecycle);
    }

    fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn unlock_processing_pause(&self) {
        self.processing_pause_locked.store(false, Ordering::SeqCst);
    }

    fn resume_message_processing(&self) -> Result<(), ProcessingPauseLocked> {
        if self.is_processing_pause_locked() {
            return Err(ProcessingPauseLocked);
        }
        self.processing.store(true, Ordering::SeqCst);
        self.set(Lifecycle::Running);
        info!("Message processing resumed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_fails_while_pause_is_locked() {
        let status = ServerStatus::new();
        status.start();
        status.pause_message_processing(true);

        assert_eq!(status.resume_message_processing(), Err(ProcessingPauseLocked));
        assert!(!status.is_processing());
        assert_eq!(status.lifecycle(), Lifecycle::Paused);

        status.unlock_processing_pause();
        assert_eq!(status.resume_message_processing(), Ok(()));
        assert!(status.is_processing());
    }

    #[test]
    fn test_resume_overwrites_lifecycle_with_running() {
        let status = ServerStatus::new();
        status.set_lifecycle(Lifecycle::Halting);
        status.resume_message_processing().unwrap();
        assert_eq!(status.lifecycle(), Lifecycle::Running);
    }
}
