//! # Collaborator Contracts
//!
//! This module defines the narrow interfaces the shutdown sequencer drives.
//! Every subsystem of the node (inputs, buffers, caches, periodicals, storage,
//! activity log) is reached only through one of these traits, so the sequence
//! can be wired against the real in-process implementations or against the
//! recording doubles in [`mock`](crate::framework::mock).
//!
//! ## Key Traits
//!
//! - [`StatusControl`]: lifecycle state and the message-processing pause.
//! - [`InputSource`] / [`MessageInput`]: running input connectors.
//! - [`DrainSignal`]: "wait until empty" for buffers and caches.
//! - [`PeriodicalSource`] / [`CancelHandle`]: scheduled background jobs.
//! - [`StorageEngine`]: the index/storage handle closed at the very end.
//! - [`ActivitySink`]: fire-and-forget audit records.
//! - [`ProcessHalt`]: the terminal process exit.

use std::sync::Arc;

use async_trait::async_trait;

use crate::activity::Activity;
use crate::lifecycle::{Lifecycle, ProcessingPauseLocked};

// =============================================================================
// 1. NODE STATUS
// =============================================================================

/// Process-wide lifecycle state plus the message-processing pause.
///
/// Resuming message processing puts the node back into [`Lifecycle::Running`]
/// as a side effect, so callers that must keep presenting another state have
/// to set it again after a successful resume.
pub trait StatusControl: Send + Sync {
    /// Replaces the current lifecycle.
    fn set_lifecycle(&self, lifecycle: Lifecycle);

    /// Returns the current lifecycle.
    fn lifecycle(&self) -> Lifecycle;

    /// Releases the lock that keeps message processing paused.
    fn unlock_processing_pause(&self);

    /// Resumes message processing.
    ///
    /// Fails with [`ProcessingPauseLocked`] while the pause lock is held.
    fn resume_message_processing(&self) -> Result<(), ProcessingPauseLocked>;
}

// =============================================================================
// 2. INPUTS
// =============================================================================

/// A running input connector that feeds messages into the buffers.
#[async_trait]
pub trait MessageInput: Send + Sync {
    /// Stable, unique identifier of this input instance.
    fn id(&self) -> &str;

    /// Human readable name.
    fn name(&self) -> &str;

    /// Stops accepting data and releases the resources held by the input.
    ///
    /// There is no timeout: an input that never returns from `stop` blocks
    /// whoever awaits it.
    async fn stop(&self);
}

/// Anything that can list the inputs that are currently running.
pub trait InputSource: Send + Sync {
    /// Returns a snapshot of the running inputs.
    ///
    /// The returned vector is not updated when inputs are launched or stopped
    /// later on.
    fn running_inputs(&self) -> Vec<Arc<dyn MessageInput>>;
}

// =============================================================================
// 3. DRAIN SIGNALS
// =============================================================================

/// A queue-like subsystem (buffers, caches) that can be waited on until empty.
#[async_trait]
pub trait DrainSignal: Send + Sync {
    /// Completes once no messages are pending. Has no timeout.
    async fn wait_until_empty(&self);
}

// =============================================================================
// 4. PERIODICALS
// =============================================================================

/// Descriptor of a registered periodical as seen by the shutdown sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeriodicalInfo {
    /// Unique name, also used as key in the handle table.
    pub name: String,
    /// Whether the periodical must be cancelled during a graceful shutdown.
    pub stop_on_graceful_shutdown: bool,
}

impl PeriodicalInfo {
    pub fn new(name: impl Into<String>, stop_on_graceful_shutdown: bool) -> Self {
        Self {
            name: name.into(),
            stop_on_graceful_shutdown,
        }
    }
}

/// Cancellation handle of a scheduled periodical.
pub trait CancelHandle: Send + Sync {
    /// Prevents all future runs.
    ///
    /// With `interrupt_running == false` a run that is already executing is
    /// allowed to finish; with `true` it is aborted as well.
    fn cancel(&self, interrupt_running: bool);

    /// Returns true once [`cancel`](CancelHandle::cancel) has been called.
    fn is_cancelled(&self) -> bool;
}

/// Registry of periodicals and their cancellation handles.
pub trait PeriodicalSource: Send + Sync {
    /// Snapshot of all registered periodicals flagged `stop_on_graceful_shutdown`.
    fn stoppable_on_graceful_shutdown(&self) -> Vec<PeriodicalInfo>;

    /// Looks up the cancellation handle of a periodical, if it was scheduled.
    fn cancel_handle(&self, periodical: &PeriodicalInfo) -> Option<Arc<dyn CancelHandle>>;
}

// =============================================================================
// 5. STORAGE, ACTIVITIES, PROCESS
// =============================================================================

/// The storage/index engine handle.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Closes the engine. Called exactly once, at the end of the shutdown.
    async fn close(&self);
}

/// Append-only audit sink.
pub trait ActivitySink: Send + Sync {
    /// Records an activity. Must neither block nor fail the caller.
    fn write(&self, activity: Activity);
}

/// Terminates the process.
pub trait ProcessHalt: Send + Sync {
    /// Exits with `code` without running any further shutdown hooks.
    ///
    /// The production implementation never returns; test doubles do.
    fn halt(&self, code: i32);
}
