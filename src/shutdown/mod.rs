//! # Graceful Shutdown
//!
//! The orchestrator that takes a node from serving traffic to a halted
//! process without losing buffered data.
//!
//! ## The Sequence
//!
//! | # | Phase | Blocks on |
//! |---|-------|-----------|
//! | 0 | lifecycle = `Halting` | - |
//! | 1 | load balancer recognition window | timed sleep |
//! | 2 | activity "Graceful shutdown initiated." | - |
//! | 3 | grace period | timed sleep |
//! | 4 | stop running inputs | each `stop()` |
//! | 5 | unlock pause, resume processing, lifecycle = `Halting` | fatal on failure |
//! | 6 | caches empty | unbounded |
//! | 7 | buffers empty | unbounded |
//! | 8 | cancel stoppable periodicals | - |
//! | 9 | close storage | `close()` |
//! | 10 | halt process | terminal |
//!
//! ## Main Components
//!
//! - [`GracefulShutdown`] - the sequencer itself, built from [`Subsystems`].
//! - [`ShutdownTrigger`] - once-only, cloneable way to start it.
//! - [`stop_inputs`] / [`cancel_periodicals`] - the two per-item loops.
//! - [`ShutdownError`] - the single fatal condition.

pub mod error;
pub mod inputs;
pub mod periodicals;
pub mod phase;
pub mod sequencer;
pub mod trigger;

pub use error::*;
pub use inputs::*;
pub use periodicals::*;
pub use phase::*;
pub use sequencer::*;
pub use trigger::*;
