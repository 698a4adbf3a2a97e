//! # Demo Node
//!
//! Wires the shutdown sequence against the in-process subsystems:
//!
//! 1. Two inputs push messages into the cache gauge.
//! 2. A processor moves cached messages into the buffers and completes them
//!    while processing is enabled.
//! 3. Two periodicals run in the background, one of which survives shutdown.
//! 4. On SIGINT/SIGTERM the [`ShutdownTrigger`] starts the graceful shutdown,
//!    which ends the process.
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use node_halt::activity::ActivityActor;
use node_halt::config::ShutdownConfig;
use node_halt::drain::DrainGauge;
use node_halt::framework::{MessageInput, StorageEngine};
use node_halt::inputs::InputRegistry;
use node_halt::lifecycle::ServerStatus;
use node_halt::periodical::{Periodical, Periodicals};
use node_halt::runtime::{setup_tracing, wait_for_shutdown_signal, ProcessExit};
use node_halt::shutdown::{GracefulShutdown, ShutdownTrigger, Subsystems};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Input that produces one message every `interval` until stopped.
struct GeneratorInput {
    id: String,
    name: String,
    stopped: CancellationToken,
}

impl GeneratorInput {
    fn start(id: &str, name: &str, interval: Duration, caches: Arc<DrainGauge>) -> Arc<Self> {
        let input = Arc::new(Self {
            id: id.to_string(),
            name: name.to_string(),
            stopped: CancellationToken::new(),
        });

        let stopped = input.stopped.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = stopped.cancelled() => break,
                    _ = ticker.tick() => caches.add(1),
                }
            }
        });

        input
    }
}

#[async_trait]
impl MessageInput for GeneratorInput {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn stop(&self) {
        self.stopped.cancel();
    }
}

struct ThroughputReporter {
    buffers: Arc<DrainGauge>,
}

#[async_trait]
impl Periodical for ThroughputReporter {
    fn name(&self) -> &str {
        "throughput-reporter"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(5)
    }

    fn stop_on_graceful_shutdown(&self) -> bool {
        true
    }

    async fn run(&self) {
        info!(pending = self.buffers.pending(), "Buffer throughput");
    }
}

struct NodeHeartbeat;

#[async_trait]
impl Periodical for NodeHeartbeat {
    fn name(&self) -> &str {
        "node-heartbeat"
    }

    fn period(&self) -> Duration {
        Duration::from_secs(2)
    }

    // The cluster must keep seeing this node while it drains.
    fn stop_on_graceful_shutdown(&self) -> bool {
        false
    }

    async fn run(&self) {
        tracing::debug!("Heartbeat");
    }
}

struct LocalIndex;

#[async_trait]
impl StorageEngine for LocalIndex {
    async fn close(&self) {
        info!("Index closed");
    }
}

/// Moves messages from the caches into the buffers and out of the buffers
/// while processing is enabled.
fn spawn_processor(status: Arc<ServerStatus>, caches: Arc<DrainGauge>, buffers: Arc<DrainGauge>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(20));
        loop {
            ticker.tick().await;
            if !status.is_processing() {
                continue;
            }
            if caches.pending() > 0 {
                // Enqueue before completing so the message is always counted.
                buffers.add(1);
                caches.complete(1);
            }
            if buffers.pending() > 0 {
                buffers.complete(1);
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = ShutdownConfig::from_env().map_err(|e| e.to_string())?;
    info!(?config, "Starting node");

    let status = Arc::new(ServerStatus::new());
    let buffers = Arc::new(
        DrainGauge::new("buffers").with_progress_interval(config.drain_progress_interval()),
    );
    let caches = Arc::new(
        DrainGauge::new("caches").with_progress_interval(config.drain_progress_interval()),
    );

    let (activity_actor, activities) = ActivityActor::new(64);
    tokio::spawn(activity_actor.run());

    let inputs = Arc::new(InputRegistry::new());
    inputs.launch(GeneratorInput::start("input-1", "Syslog UDP", Duration::from_millis(15), caches.clone()));
    inputs.launch(GeneratorInput::start("input-2", "GELF TCP", Duration::from_millis(40), caches.clone()));

    let periodicals = Arc::new(Periodicals::new());
    periodicals
        .register_and_start(Arc::new(ThroughputReporter { buffers: buffers.clone() }))
        .map_err(|e| e.to_string())?;
    periodicals
        .register_and_start(Arc::new(NodeHeartbeat))
        .map_err(|e| e.to_string())?;

    status.start();
    spawn_processor(status.clone(), caches.clone(), buffers.clone());

    let trigger = ShutdownTrigger::new(GracefulShutdown::new(
        config,
        Subsystems {
            status,
            activities: Arc::new(activities),
            inputs,
            caches,
            buffers,
            periodicals,
            storage: Arc::new(LocalIndex),
            halt: Arc::new(ProcessExit),
        },
    ));

    info!("Node running, waiting for a termination signal");
    if let Err(e) = wait_for_shutdown_signal().await {
        error!(error = %e, "Could not listen for termination signals");
        return Err(e.to_string());
    }

    if let Some(handle) = trigger.trigger("termination signal") {
        // The shutdown ends the process; this only returns if it panicked.
        handle.await.map_err(|e| e.to_string())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use node_halt::framework::DrainSignal;

    #[tokio::test(start_paused = true)]
    async fn test_processor_leaves_nothing_behind_after_cache_then_buffer_drain() {
        let status = Arc::new(ServerStatus::new());
        status.start();
        let caches = Arc::new(DrainGauge::new("caches"));
        let buffers = Arc::new(DrainGauge::new("buffers"));
        caches.add(5);
        buffers.add(5);

        spawn_processor(status, caches.clone(), buffers.clone());

        caches.wait_until_empty().await;
        buffers.wait_until_empty().await;

        assert_eq!(caches.pending(), 0);
        assert_eq!(buffers.pending(), 0);

        // Nothing flows back into the caches once the buffers are empty.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(caches.pending(), 0);
        assert_eq!(buffers.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_processor_waits_while_processing_is_paused() {
        let status = Arc::new(ServerStatus::new());
        status.start();
        status.pause_message_processing(false);
        let caches = Arc::new(DrainGauge::new("caches"));
        let buffers = Arc::new(DrainGauge::new("buffers"));
        caches.add(3);

        spawn_processor(status, caches.clone(), buffers.clone());
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(caches.pending(), 3);
        assert_eq!(buffers.pending(), 0);
    }
}
