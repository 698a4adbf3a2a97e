//! Process-level plumbing around the shutdown sequence.
//!
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure
//! - [`wait_for_shutdown_signal`] - Completes on SIGINT/SIGTERM/SIGQUIT
//! - [`ProcessExit`] - Terminal halt that skips every remaining shutdown hook

pub mod halt;
pub mod signals;
pub mod tracing;

pub use halt::*;
pub use signals::*;
pub use self::tracing::*;
