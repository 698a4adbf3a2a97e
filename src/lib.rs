//! # Node Halt
//!
//! > **Graceful shutdown for a node that ingests, buffers, caches and indexes
//! > streaming data.**
//!
//! When a shutdown is requested the node must not simply exit: load balancers
//! would keep routing requests to it, buffered messages would be lost, and the
//! index could be left in an inconsistent state. This crate owns the ordering
//! that avoids all of that.
//!
//! ## 🏗️ Design Philosophy
//!
//! The orchestrator has no business logic of its own. Its value is the
//! *order* and the *blocking semantics* of the phases:
//!
//! - **Presents as dead first**: the node reports `Halting` (load balancer
//!   status `DEAD`) and waits before it stops accepting anything.
//! - **Drains, never drops**: buffer and cache waits have no timeout. A hung
//!   shutdown is visible in the logs; lost messages are not.
//! - **Halts hard**: the last action ends the process without running any
//!   remaining shutdown hooks.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Contracts ([`framework`])
//! Narrow traits for every subsystem the shutdown touches, plus recording
//! mocks in [`framework::mock`].
//!
//! ### 2. The Orchestrator ([`shutdown`])
//! - **Key items**: [`GracefulShutdown`](shutdown::GracefulShutdown),
//!   [`ShutdownTrigger`](shutdown::ShutdownTrigger).
//!
//! ### 3. The Subsystems
//! In-process implementations of the contracts:
//! - [`lifecycle`]: [`ServerStatus`](lifecycle::ServerStatus) and the
//!   [`Lifecycle`](lifecycle::Lifecycle) states.
//! - [`inputs`]: the input registry.
//! - [`drain`]: pending-message gauges for buffers and caches.
//! - [`periodical`]: the periodical scheduler and its cancellation handles.
//! - [`activity`]: the fire-and-forget activity log.
//!
//! ### 4. The Plumbing ([`runtime`], [`config`])
//! Tracing setup, OS signals, the process halt, timing configuration.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the demo node, then press Ctrl-C
//! RUST_LOG=info cargo run
//! ```

pub mod activity;
pub mod config;
pub mod drain;
pub mod framework;
pub mod inputs;
pub mod lifecycle;
pub mod periodical;
pub mod runtime;
pub mod shutdown;
