//! # Node Lifecycle
//!
//! The lifecycle is the node's externally visible operational phase. Load
//! balancers poll it (through [`Lifecycle::load_balancer_status`]) to decide
//! whether to route traffic here.
//!
//! [`ServerStatus`] is the single shared holder of that state together with
//! the message-processing pause. It is created once by the host process and
//! passed around as `Arc<ServerStatus>`.
//!
//! ## Halting
//!
//! The shutdown sequence is the only writer of [`Lifecycle::Halting`]. Because
//! resuming message processing flips the node back to `Running`, the sequence
//! re-asserts `Halting` immediately after the resume:
//!
//! ```rust
//! use node_halt::framework::StatusControl;
//! use node_halt::lifecycle::{Lifecycle, ServerStatus};
//!
//! let status = ServerStatus::new();
//! status.set_lifecycle(Lifecycle::Halting);
//! status.unlock_processing_pause();
//! status.resume_message_processing().unwrap();
//! status.set_lifecycle(Lifecycle::Halting);
//! assert_eq!(status.lifecycle(), Lifecycle::Halting);
//! ```

pub mod state;
pub mod status;

pub use state::*;
pub use status::*;
