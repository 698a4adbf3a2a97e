//! # Activity Log
//!
//! Activities are short audit records ("Graceful shutdown initiated.") that
//! operators read to reconstruct what a node did and why.
//!
//! Writing an activity must never hold up the caller, so the writer is split
//! the same way the rest of the crate splits long-lived services:
//!
//! - [`ActivityActor`] owns the receiving end of a bounded channel and
//!   processes records sequentially in its own task.
//! - [`ActivityWriter`] is the cheap, cloneable sending half. It uses
//!   `try_send`, so a full or closed channel drops the record with a warning
//!   instead of blocking or failing.
//!
//! ```rust
//! use node_halt::activity::{Activity, ActivityActor};
//! use node_halt::framework::ActivitySink;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (actor, writer) = ActivityActor::new(32);
//! let handle = tokio::spawn(actor.run());
//!
//! writer.write(Activity::new("Graceful shutdown initiated.", "GracefulShutdown"));
//!
//! drop(writer);
//! assert_eq!(handle.await.unwrap(), 1);
//! # }
//! ```

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{info, warn};

use crate::framework::ActivitySink;

/// An immutable audit entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub message: String,
    pub source: String,
}

impl Activity {
    pub fn new(message: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Creates an activity whose source is the short type name of `T`.
    pub fn from_type<T: ?Sized>(message: impl Into<String>) -> Self {
        // "node_halt::shutdown::sequencer::GracefulShutdown" -> "GracefulShutdown"
        let source = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        Self::new(message, source)
    }
}

/// Background consumer of activity records.
pub struct ActivityActor {
    receiver: mpsc::Receiver<Activity>,
}

impl ActivityActor {
    /// Creates the actor and its writer. `buffer_size` bounds how many records
    /// may be pending before new ones are dropped.
    pub fn new(buffer_size: usize) -> (Self, ActivityWriter) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        (Self { receiver }, ActivityWriter { sender })
    }

    /// Logs records until every writer is dropped. Returns how many were written.
    pub async fn run(mut self) -> usize {
        info!("Activity writer started");
        let mut written = 0;

        while let Some(activity) = self.receiver.recv().await {
            info!(source = %activity.source, "Activity: {}", activity.message);
            written += 1;
        }

        info!(written, "Activity writer shutdown");
        written
    }
}

/// Sending half of the activity log.
#[derive(Clone)]
pub struct ActivityWriter {
    sender: mpsc::Sender<Activity>,
}

impl ActivitySink for ActivityWriter {
    fn write(&self, activity: Activity) {
        match self.sender.try_send(activity) {
            Ok(()) => {}
            Err(TrySendError::Full(activity)) => {
                warn!(source = %activity.source, activity = %activity.message, "Activity log full, dropping record");
            }
            Err(TrySendError::Closed(activity)) => {
                warn!(source = %activity.source, activity = %activity.message, "Activity log closed, dropping record");
            }
        }
    }
}
