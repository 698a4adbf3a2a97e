//! # Periodicals
//!
//! Periodicals are recurring background jobs (index retention, throughput
//! counters, cluster heartbeats...). Each one runs in its own Tokio task and is
//! controlled through a [`ScheduledHandle`] kept in the [`Periodicals`] handle
//! table.
//!
//! Cancelling a handle only stops *future* runs. A run that is already in
//! progress is allowed to finish unless the caller explicitly asks for an
//! interrupt, which is what the graceful shutdown relies on.
//!
//! Some periodicals must keep running while the node drains; they report
//! `stop_on_graceful_shutdown() == false` and the shutdown never touches them.

pub mod scheduler;

pub use scheduler::*;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::framework::PeriodicalInfo;

/// A recurring background job.
#[async_trait]
pub trait Periodical: Send + Sync + 'static {
    /// Unique name. Used as key in the handle table.
    fn name(&self) -> &str;

    /// Time between the starts of two consecutive runs.
    fn period(&self) -> Duration;

    fn initial_delay(&self) -> Duration {
        Duration::ZERO
    }

    /// Runs exactly once instead of repeating.
    fn is_one_off(&self) -> bool {
        false
    }

    /// Periodicals that only run on a leader node return false on the others.
    /// They are registered but never scheduled.
    fn start_on_this_node(&self) -> bool {
        true
    }

    /// Whether a graceful shutdown cancels this periodical.
    fn stop_on_graceful_shutdown(&self) -> bool;

    /// One execution of the job.
    async fn run(&self);

    fn info(&self) -> PeriodicalInfo {
        PeriodicalInfo::new(self.name(), self.stop_on_graceful_shutdown())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PeriodicalError {
    #[error("Periodical already registered: {0}")]
    AlreadyRegistered(String),
    #[error("Periodical {0} repeats with a zero period")]
    ZeroPeriod(String),
}
