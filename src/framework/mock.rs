//! # Mock Subsystems & Testing Guide
//!
//! Recording implementations of every collaborator trait. They share one
//! [`CallLog`], so a test can assert not only *that* the shutdown touched a
//! subsystem but in *which order* it touched all of them.
//!
//! ## When to use Mocks vs Real Subsystems
//!
//! | Feature | Mocks | Real subsystems |
//! |---------|-------|-----------------|
//! | **Ordering** | Global call log | Per-subsystem state only |
//! | **Blocking** | [`ManualDrain`] blocks until released | Real message counts |
//! | **Failure injection** | [`RecordingStatus::with_stuck_pause`] | Hard to provoke |
//! | **Halt** | [`RecordingHalt`] records the exit code | Ends the process |
//!
//! ## Example
//!
//! ```rust
//! use node_halt::config::ShutdownConfig;
//! use node_halt::framework::mock::MockNode;
//! use node_halt::shutdown::GracefulShutdown;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let node = MockNode::new();
//! let config = ShutdownConfig::from_toml_str("lb_recognition_period_seconds = 0\ngrace_period_seconds = 0").unwrap();
//!
//! GracefulShutdown::new(config, node.subsystems()).run().await;
//!
//! assert_eq!(node.halt.codes(), vec![0]);
//! assert_eq!(node.log.entries().last().map(String::as_str), Some("halt:0"));
//! # }
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::activity::Activity;
use crate::framework::{
    ActivitySink, CancelHandle, DrainSignal, MessageInput, PeriodicalInfo, PeriodicalSource,
    ProcessHalt, StatusControl, StorageEngine,
};
use crate::inputs::InputRegistry;
use crate::lifecycle::{Lifecycle, ProcessingPauseLocked, ServerStatus};
use crate::shutdown::Subsystems;

// =============================================================================
// CALL LOG
// =============================================================================

/// Ordered record of the calls made to the mocks.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.lock().unwrap().iter().any(|e| e == entry)
    }

    /// Index of the first occurrence of `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.lock().unwrap().iter().position(|e| e == entry)
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// A real [`ServerStatus`] that records lifecycle writes and resume calls.
pub struct RecordingStatus {
    inner: ServerStatus,
    log: CallLog,
    stuck_pause: bool,
}

impl RecordingStatus {
    pub fn new(log: &CallLog) -> Self {
        let inner = ServerStatus::new();
        inner.start();
        Self {
            inner,
            log: log.clone(),
            stuck_pause: false,
        }
    }

    /// Pauses processing with the lock held and makes unlocking a no-op, so
    /// every resume fails.
    pub fn with_stuck_pause(mut self) -> Self {
        self.inner.pause_message_processing(true);
        self.stuck_pause = true;
        self
    }

    pub fn is_processing(&self) -> bool {
        self.inner.is_processing()
    }
}

impl StatusControl for RecordingStatus {
    fn set_lifecycle(&self, lifecycle: Lifecycle) {
        self.log.record(format!("status.set:{lifecycle:?}"));
        self.inner.set_lifecycle(lifecycle);
    }

    fn lifecycle(&self) -> Lifecycle {
        self.inner.lifecycle()
    }

    fn unlock_processing_pause(&self) {
        self.log.record("status.unlock");
        if !self.stuck_pause {
            self.inner.unlock_processing_pause();
        }
    }

    fn resume_message_processing(&self) -> Result<(), ProcessingPauseLocked> {
        self.log.record("status.resume");
        self.inner.resume_message_processing()
    }
}

// =============================================================================
// INPUTS
// =============================================================================

/// Input that records every `stop` and the lifecycle it observed at that time.
pub struct RecordingInput {
    id: String,
    name: String,
    log: CallLog,
    stop_delay: Duration,
    observed_status: Option<Arc<dyn StatusControl>>,
    lifecycles_at_stop: Mutex<Vec<Lifecycle>>,
    stops: AtomicUsize,
}

impl RecordingInput {
    pub fn new(id: impl Into<String>, name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            log: log.clone(),
            stop_delay: Duration::ZERO,
            observed_status: None,
            lifecycles_at_stop: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
        }
    }

    pub fn arc(id: impl Into<String>, name: impl Into<String>, log: &CallLog) -> Arc<Self> {
        Arc::new(Self::new(id, name, log))
    }

    /// Makes `stop` take `delay` before returning.
    pub fn with_stop_delay(mut self, delay: Duration) -> Self {
        self.stop_delay = delay;
        self
    }

    /// Records `status.lifecycle()` whenever `stop` is called.
    pub fn observing(mut self, status: Arc<dyn StatusControl>) -> Self {
        self.observed_status = Some(status);
        self
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn lifecycles_at_stop(&self) -> Vec<Lifecycle> {
        self.lifecycles_at_stop.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageInput for RecordingInput {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn stop(&self) {
        if let Some(status) = &self.observed_status {
            self.lifecycles_at_stop.lock().unwrap().push(status.lifecycle());
        }
        self.stops.fetch_add(1, Ordering::SeqCst);
        if !self.stop_delay.is_zero() {
            tokio::time::sleep(self.stop_delay).await;
        }
        self.log.record(format!("input.stop:{}", self.id));
    }
}

// =============================================================================
// DRAINS
// =============================================================================

/// Drain signal that stays blocked until [`ManualDrain::release`] is called.
pub struct ManualDrain {
    name: String,
    log: CallLog,
    empty: watch::Sender<bool>,
}

impl ManualDrain {
    /// Already empty: `wait_until_empty` returns at once.
    pub fn empty(name: impl Into<String>, log: &CallLog) -> Self {
        Self::with_state(name, log, true)
    }

    /// Holds messages until released.
    pub fn blocked(name: impl Into<String>, log: &CallLog) -> Self {
        Self::with_state(name, log, false)
    }

    fn with_state(name: impl Into<String>, log: &CallLog, empty: bool) -> Self {
        let (sender, _) = watch::channel(empty);
        Self {
            name: name.into(),
            log: log.clone(),
            empty: sender,
        }
    }

    pub fn release(&self) {
        self.empty.send_replace(true);
    }
}

#[async_trait]
impl DrainSignal for ManualDrain {
    async fn wait_until_empty(&self) {
        self.log.record(format!("{}.wait", self.name));
        let mut receiver = self.empty.subscribe();
        // The sender lives in `self`, so the wait cannot fail.
        let _ = receiver.wait_for(|empty| *empty).await;
        self.log.record(format!("{}.empty", self.name));
    }
}

// =============================================================================
// PERIODICALS
// =============================================================================

pub struct MockCancelHandle {
    name: String,
    log: CallLog,
    cancelled: AtomicBool,
    interrupted: AtomicBool,
}

impl CancelHandle for MockCancelHandle {
    fn cancel(&self, interrupt_running: bool) {
        self.log.record(format!("periodical.cancel:{}", self.name));
        self.cancelled.store(true, Ordering::SeqCst);
        self.interrupted.store(interrupt_running, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Periodical registry with a configurable handle table.
pub struct MockPeriodicals {
    log: CallLog,
    entries: Vec<(PeriodicalInfo, Option<Arc<MockCancelHandle>>)>,
}

impl MockPeriodicals {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            entries: Vec::new(),
        }
    }

    /// Adds a periodical. Without `has_handle` it is missing from the handle table.
    pub fn with_periodical(mut self, name: &str, stop_on_graceful_shutdown: bool, has_handle: bool) -> Self {
        let handle = has_handle.then(|| {
            Arc::new(MockCancelHandle {
                name: name.to_string(),
                log: self.log.clone(),
                cancelled: AtomicBool::new(false),
                interrupted: AtomicBool::new(false),
            })
        });
        self.entries
            .push((PeriodicalInfo::new(name, stop_on_graceful_shutdown), handle));
        self
    }

    fn handle(&self, name: &str) -> Option<&Arc<MockCancelHandle>> {
        self.entries
            .iter()
            .find(|(info, _)| info.name == name)
            .and_then(|(_, handle)| handle.as_ref())
    }

    pub fn is_cancelled(&self, name: &str) -> bool {
        self.handle(name).is_some_and(|h| h.is_cancelled())
    }

    pub fn was_interrupted(&self, name: &str) -> bool {
        self.handle(name)
            .is_some_and(|h| h.interrupted.load(Ordering::SeqCst))
    }
}

impl PeriodicalSource for MockPeriodicals {
    fn stoppable_on_graceful_shutdown(&self) -> Vec<PeriodicalInfo> {
        self.entries
            .iter()
            .filter(|(info, _)| info.stop_on_graceful_shutdown)
            .map(|(info, _)| info.clone())
            .collect()
    }

    fn cancel_handle(&self, periodical: &PeriodicalInfo) -> Option<Arc<dyn CancelHandle>> {
        self.log.record(format!("periodical.lookup:{}", periodical.name));
        self.handle(&periodical.name)
            .map(|handle| handle.clone() as Arc<dyn CancelHandle>)
    }
}

// =============================================================================
// STORAGE, ACTIVITIES, HALT
// =============================================================================

pub struct RecordingStorage {
    log: CallLog,
    closes: AtomicUsize,
}

impl RecordingStorage {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            closes: AtomicUsize::new(0),
        }
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageEngine for RecordingStorage {
    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.log.record("storage.close");
    }
}

pub struct RecordingActivities {
    log: CallLog,
    records: Mutex<Vec<Activity>>,
}

impl RecordingActivities {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<Activity> {
        self.records.lock().unwrap().clone()
    }
}

impl ActivitySink for RecordingActivities {
    fn write(&self, activity: Activity) {
        self.log.record(format!("activity:{}", activity.message));
        self.records.lock().unwrap().push(activity);
    }
}

/// Records the exit code instead of ending the process.
pub struct RecordingHalt {
    log: CallLog,
    codes: Mutex<Vec<i32>>,
}

impl RecordingHalt {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            codes: Mutex::new(Vec::new()),
        }
    }

    pub fn codes(&self) -> Vec<i32> {
        self.codes.lock().unwrap().clone()
    }
}

impl ProcessHalt for RecordingHalt {
    fn halt(&self, code: i32) {
        self.log.record(format!("halt:{code}"));
        self.codes.lock().unwrap().push(code);
    }
}

// =============================================================================
// WHOLE NODE
// =============================================================================

/// A complete set of mock subsystems sharing one [`CallLog`].
///
/// Fields are public so a test can swap any of them before calling
/// [`MockNode::subsystems`].
pub struct MockNode {
    pub log: CallLog,
    pub status: Arc<RecordingStatus>,
    pub activities: Arc<RecordingActivities>,
    pub inputs: Arc<InputRegistry>,
    pub caches: Arc<ManualDrain>,
    pub buffers: Arc<ManualDrain>,
    pub periodicals: Arc<MockPeriodicals>,
    pub storage: Arc<RecordingStorage>,
    pub halt: Arc<RecordingHalt>,
}

impl MockNode {
    /// A running node with no inputs, no periodicals and empty drains.
    pub fn new() -> Self {
        let log = CallLog::new();
        Self {
            status: Arc::new(RecordingStatus::new(&log)),
            activities: Arc::new(RecordingActivities::new(&log)),
            inputs: Arc::new(InputRegistry::new()),
            caches: Arc::new(ManualDrain::empty("caches", &log)),
            buffers: Arc::new(ManualDrain::empty("buffers", &log)),
            periodicals: Arc::new(MockPeriodicals::new(&log)),
            storage: Arc::new(RecordingStorage::new(&log)),
            halt: Arc::new(RecordingHalt::new(&log)),
            log,
        }
    }

    pub fn subsystems(&self) -> Subsystems {
        Subsystems {
            status: self.status.clone(),
            activities: self.activities.clone(),
            inputs: self.inputs.clone(),
            caches: self.caches.clone(),
            buffers: self.buffers.clone(),
            periodicals: self.periodicals.clone(),
            storage: self.storage.clone(),
            halt: self.halt.clone(),
        }
    }
}

impl Default for MockNode {
    fn default() -> Self {
        Self::new()
    }
}
