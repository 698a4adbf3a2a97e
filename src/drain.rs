//! # Drain Gauges
//!
//! A [`DrainGauge`] counts the messages a queue-like subsystem (the input
//! buffers, the master caches) still holds. Producers call
//! [`DrainGauge::add`], consumers call [`DrainGauge::complete`], and the
//! shutdown sequence awaits [`DrainSignal::wait_until_empty`].
//!
//! The count lives in a `tokio::sync::watch` channel so waiters wake up on
//! every change instead of polling. While waiting, progress is logged every
//! `progress_interval` so a drain that never finishes shows up in the logs.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::framework::DrainSignal;

const MIN_PROGRESS_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub struct DrainGauge {
    name: String,
    pending: watch::Sender<usize>,
    progress_interval: Duration,
}

impl DrainGauge {
    pub fn new(name: impl Into<String>) -> Self {
        let (pending, _) = watch::channel(0);
        Self {
            name: name.into(),
            pending,
            progress_interval: Duration::from_secs(1),
        }
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval.max(MIN_PROGRESS_INTERVAL);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of messages still pending.
    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Records `count` newly enqueued messages.
    pub fn add(&self, count: usize) {
        self.pending.send_modify(|pending| *pending += count);
    }

    /// Records `count` consumed messages. Never goes below zero.
    pub fn complete(&self, count: usize) {
        self.pending
            .send_modify(|pending| *pending = pending.saturating_sub(count));
    }
}

#[async_trait]
impl DrainSignal for DrainGauge {
    async fn wait_until_empty(&self) {
        let mut receiver = self.pending.subscribe();
        let mut progress = tokio::time::interval(self.progress_interval);
        // The first tick completes immediately.
        progress.tick().await;

        loop {
            let pending = *receiver.borrow_and_update();
            if pending == 0 {
                info!(gauge = %self.name, "All messages drained");
                return;
            }

            tokio::select! {
                changed = receiver.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    debug!(gauge = %self.name, "Pending count changed");
                }
                _ = progress.tick() => {
                    info!(gauge = %self.name, pending, "Waiting for messages to drain");
                }
            }
        }
    }
}
