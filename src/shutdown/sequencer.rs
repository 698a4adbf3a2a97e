use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};

use crate::activity::Activity;
use crate::config::ShutdownConfig;
use crate::framework::{
    ActivitySink, DrainSignal, InputSource, PeriodicalSource, ProcessHalt, StatusControl,
    StorageEngine,
};
use crate::lifecycle::Lifecycle;
use crate::runtime::EXIT_OK;
use crate::shutdown::{cancel_periodicals, stop_inputs, ShutdownError, ShutdownPhase};

/// The subsystems a graceful shutdown coordinates.
///
/// Every field is a shared handle; the host process keeps its own clones.
#[derive(Clone)]
pub struct Subsystems {
    pub status: Arc<dyn StatusControl>,
    pub activities: Arc<dyn ActivitySink>,
    pub inputs: Arc<dyn InputSource>,
    pub caches: Arc<dyn DrainSignal>,
    pub buffers: Arc<dyn DrainSignal>,
    pub periodicals: Arc<dyn PeriodicalSource>,
    pub storage: Arc<dyn StorageEngine>,
    pub halt: Arc<dyn ProcessHalt>,
}

/// The node's graceful shutdown sequence.
///
/// Runs once, on a single task, strictly in [`ShutdownPhase`] order:
///
/// 1. Mark the node `Halting` and give load balancers time to notice.
/// 2. Record the activity, wait the grace period, stop all inputs.
/// 3. Resume message processing (re-asserting `Halting`) and wait until
///    caches, then buffers, are empty.
/// 4. Cancel stoppable periodicals, close storage, halt the process.
///
/// Sleeps are plain timed delays and cannot be cut short. Drain waits and
/// collaborator calls have no timeout: the sequence would rather hang than
/// drop buffered messages. Nothing is retried.
///
/// # Example
///
/// ```ignore
/// let shutdown = GracefulShutdown::new(ShutdownConfig::from_env()?, subsystems);
/// shutdown.spawn();
/// ```
pub struct GracefulShutdown {
    config: ShutdownConfig,
    node: Subsystems,
}

impl GracefulShutdown {
    pub fn new(config: ShutdownConfig, node: Subsystems) -> Self {
        Self { config, node }
    }

    /// Runs the sequence on a dedicated Tokio task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs the whole sequence and halts the process.
    ///
    /// With the real [`ProcessExit`](crate::runtime::ProcessExit) this never
    /// returns. A failure to resume message processing halts with
    /// [`ShutdownError::exit_code`] before any drain wait.
    pub async fn run(self) {
        let span = info_span!("graceful_shutdown");
        async {
            info!("Graceful shutdown initiated.");

            let code = match self.execute().await {
                Ok(()) => {
                    info!("Goodbye.");
                    EXIT_OK
                }
                Err(e) => {
                    error!(error = %e, exit_code = e.exit_code(), "Graceful shutdown aborted");
                    e.exit_code()
                }
            };

            info!(phase = %ShutdownPhase::Halt, exit_code = code, "Halting process");
            self.node.halt.halt(code);
        }
        .instrument(span)
        .await
    }

    async fn execute(&self) -> Result<(), ShutdownError> {
        let node = &self.node;

        node.status.set_lifecycle(Lifecycle::Halting);
        info!(phase = %ShutdownPhase::MarkHalting, "Lifecycle set to halting");

        // State is DEAD for load balancers because of HALTING.
        info!(
            phase = %ShutdownPhase::LoadBalancerRecognition,
            status = %node.status.lifecycle(),
            wait_secs = self.config.lb_recognition_period_seconds,
            "Waiting for possible load balancers to recognize state change"
        );
        tokio::time::sleep(self.config.lb_recognition_period()).await;

        node.activities
            .write(Activity::from_type::<Self>("Graceful shutdown initiated."));
        info!(phase = %ShutdownPhase::RecordActivity, "Activity recorded");

        // Lets the request that triggered the shutdown still get its response.
        info!(
            phase = %ShutdownPhase::GracePeriod,
            wait_secs = self.config.grace_period_seconds,
            "Waiting before stopping inputs"
        );
        tokio::time::sleep(self.config.grace_period()).await;

        info!(phase = %ShutdownPhase::StopInputs, "Stopping inputs");
        let stopped = stop_inputs(node.inputs.as_ref()).await;
        info!(phase = %ShutdownPhase::StopInputs, stopped, "All inputs stopped");

        // Buffered and cached messages only drain while processing is enabled.
        info!(phase = %ShutdownPhase::ResumeProcessing, "Resuming message processing");
        node.status.unlock_processing_pause();
        let resumed = node.status.resume_message_processing();
        // Resuming sets RUNNING; the node must keep presenting HALTING.
        node.status.set_lifecycle(Lifecycle::Halting);
        resumed?;

        info!(phase = %ShutdownPhase::DrainCaches, "Waiting for empty caches");
        node.caches.wait_until_empty().await;

        info!(phase = %ShutdownPhase::DrainBuffers, "Waiting for empty buffers");
        node.buffers.wait_until_empty().await;

        info!(phase = %ShutdownPhase::CancelPeriodicals, "Cancelling periodicals");
        let cancellation = cancel_periodicals(node.periodicals.as_ref());
        info!(
            phase = %ShutdownPhase::CancelPeriodicals,
            cancelled = cancellation.cancelled.len(),
            missing = cancellation.missing.len(),
            "Periodicals cancelled"
        );

        info!(phase = %ShutdownPhase::CloseStorage, "Closing storage engine");
        node.storage.close().await;

        Ok(())
    }
}
