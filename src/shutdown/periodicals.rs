use std::time::Instant;

use tracing::{error, info};

use crate::framework::PeriodicalSource;

/// Outcome of [`cancel_periodicals`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodicalCancellation {
    /// Periodicals whose future runs were cancelled.
    pub cancelled: Vec<String>,
    /// Periodicals without a cancellation handle. They keep running.
    pub missing: Vec<String>,
}

/// Cancels the future runs of every periodical flagged for graceful stop.
///
/// Runs already in progress are not interrupted. A periodical without a
/// handle is logged and skipped.
pub fn cancel_periodicals(periodicals: &dyn PeriodicalSource) -> PeriodicalCancellation {
    let mut outcome = PeriodicalCancellation::default();

    for periodical in periodicals.stoppable_on_graceful_shutdown() {
        info!(periodical = %periodical.name, "Shutting down periodical");
        let started = Instant::now();

        match periodicals.cancel_handle(&periodical) {
            Some(handle) => {
                handle.cancel(false);
                info!(
                    periodical = %periodical.name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Shutdown of periodical complete"
                );
                outcome.cancelled.push(periodical.name);
            }
            None => {
                error!(
                    periodical = %periodical.name,
                    "Could not find periodical in handle table. Not stopping execution"
                );
                outcome.missing.push(periodical.name);
            }
        }
    }

    outcome
}
