//! Contracts between the shutdown sequencer and the node's subsystems.
//!
//! # Main Components
//!
//! - [`core`] - The collaborator traits ([`StatusControl`], [`InputSource`],
//!   [`DrainSignal`], [`PeriodicalSource`], [`StorageEngine`],
//!   [`ActivitySink`], [`ProcessHalt`]).
//!
//! # Testing
//!
//! See [`mock`] module for recording implementations that let a test drive the
//! whole sequence without real subsystems.

pub mod core;
pub mod mock;

pub use self::core::*;
