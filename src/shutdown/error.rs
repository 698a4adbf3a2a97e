//! # Shutdown Errors
//!
//! The sequence has exactly one failure it reports: message processing could
//! not be resumed, which would leave the buffers and caches undrainable. Every
//! other collaborator call either completes or blocks.

use thiserror::Error;

use crate::lifecycle::ProcessingPauseLocked;
use crate::runtime::EXIT_FATAL;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShutdownError {
    /// Resuming message processing failed after the pause lock was released.
    #[error("Seems like unlocking the processing pause did not succeed.")]
    ProcessingPauseLocked(#[source] ProcessingPauseLocked),
}

impl ShutdownError {
    /// Process exit code used when the sequence aborts with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ShutdownError::ProcessingPauseLocked(_) => EXIT_FATAL,
        }
    }
}

impl From<ProcessingPauseLocked> for ShutdownError {
    fn from(err: ProcessingPauseLocked) -> Self {
        ShutdownError::ProcessingPauseLocked(err)
    }
}
