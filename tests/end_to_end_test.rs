mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{no_wait_config, CapturedLogs};
use node_halt::activity::ActivityActor;
use node_halt::config::ShutdownConfig;
use node_halt::drain::DrainGauge;
use node_halt::framework::mock::{CallLog, MockNode, MockPeriodicals, RecordingHalt, RecordingInput, RecordingStorage};
use node_halt::framework::{CancelHandle, DrainSignal, StatusControl};
use node_halt::inputs::InputRegistry;
use node_halt::lifecycle::{Lifecycle, LoadBalancerStatus, ServerStatus};
use node_halt::periodical::{Periodical, Periodicals};
use node_halt::runtime::EXIT_OK;
use node_halt::shutdown::{GracefulShutdown, Subsystems};

/// 2 inputs, 3 stoppable periodicals (one without handle), empty drains.
#[tokio::test]
async fn test_full_sequence_log_records() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    let mut node = MockNode::new();
    node.inputs.launch(RecordingInput::arc("in-1", "Syslog UDP", &node.log));
    node.inputs.launch(RecordingInput::arc("in-2", "GELF TCP", &node.log));
    node.periodicals = Arc::new(
        MockPeriodicals::new(&node.log)
            .with_periodical("index-retention", true, true)
            .with_periodical("leader-only", true, false)
            .with_periodical("throughput", true, true),
    );

    GracefulShutdown::new(no_wait_config(), node.subsystems()).run().await;

    assert_eq!(logs.count(&["Input closed"]), 2, "{:#?}", logs.lines());
    assert_eq!(logs.count(&["Shutdown of periodical complete"]), 2);
    assert_eq!(logs.count(&["ERROR", "Could not find periodical"]), 1);
    assert_eq!(logs.count(&["leader-only", "Could not find periodical"]), 1);
    assert_eq!(logs.count(&["Goodbye."]), 1);

    for phase in ["0/mark_halting", "4/stop_inputs", "7/drain_buffers", "9/close_storage", "10/halt"] {
        assert!(logs.count(&[phase]) >= 1, "phase {phase} not logged");
    }

    assert_eq!(node.log.entries().last().map(String::as_str), Some("halt:0"));
    assert_eq!(node.halt.codes(), vec![EXIT_OK]);
}

#[tokio::test]
async fn test_fatal_resume_is_logged_as_error() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    let mut node = MockNode::new();
    node.status = Arc::new(
        node_halt::framework::mock::RecordingStatus::new(&node.log).with_stuck_pause(),
    );

    GracefulShutdown::new(no_wait_config(), node.subsystems()).run().await;

    assert_eq!(
        logs.count(&["ERROR", "Seems like unlocking the processing pause did not succeed."]),
        1,
        "{:#?}",
        logs.lines()
    );
    assert_eq!(logs.count(&["Goodbye."]), 0);
}

/// A drain that never finishes must stay visible in the logs.
#[tokio::test(start_paused = true)]
async fn test_blocked_drain_logs_progress() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    let gauge = Arc::new(DrainGauge::new("buffers").with_progress_interval(Duration::from_secs(1)));
    gauge.add(2);
    let gauge_field = format!("gauge={}", gauge.name());

    let waiter = {
        let gauge = gauge.clone();
        tokio::spawn(async move { gauge.wait_until_empty().await })
    };

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert!(!waiter.is_finished());
    assert_eq!(
        logs.count(&["Waiting for messages to drain", &gauge_field, "pending=2"]),
        3,
        "{:#?}",
        logs.lines()
    );

    gauge.complete(2);
    waiter.await.unwrap();
    assert_eq!(logs.count(&["All messages drained", &gauge_field]), 1);
}

struct CountingPeriodical {
    name: &'static str,
    stop_on_shutdown: bool,
    runs: Arc<AtomicUsize>,
}

#[async_trait]
impl Periodical for CountingPeriodical {
    fn name(&self) -> &str {
        self.name
    }

    fn period(&self) -> Duration {
        Duration::from_secs(1)
    }

    fn stop_on_graceful_shutdown(&self) -> bool {
        self.stop_on_shutdown
    }

    async fn run(&self) {
        self.runs.fetch_add(1, Ordering::SeqCst);
    }
}

/// Real status, registry, gauges, scheduler and activity writer; only storage
/// and the halt are recorded.
#[tokio::test(start_paused = true)]
async fn test_shutdown_with_in_process_subsystems() {
    let log = CallLog::new();

    let status = Arc::new(ServerStatus::new());
    status.start();
    // An operator paused processing with the lock held before the shutdown.
    status.pause_message_processing(true);

    let caches = Arc::new(DrainGauge::new("caches").with_progress_interval(Duration::from_secs(1)));
    let buffers = Arc::new(DrainGauge::new("buffers").with_progress_interval(Duration::from_secs(1)));
    caches.add(2);
    buffers.add(5);

    // Consumes one message per tick, caches first, while processing is enabled.
    {
        let status = status.clone();
        let caches = caches.clone();
        let buffers = buffers.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(100));
            loop {
                ticker.tick().await;
                if !status.is_processing() {
                    continue;
                }
                if caches.pending() > 0 {
                    caches.complete(1);
                } else {
                    buffers.complete(1);
                }
            }
        });
    }

    let inputs = Arc::new(InputRegistry::new());
    let input = RecordingInput::arc("in-1", "Syslog UDP", &log);
    inputs.launch(input.clone());

    let stoppable_runs = Arc::new(AtomicUsize::new(0));
    let heartbeat_runs = Arc::new(AtomicUsize::new(0));
    let periodicals = Arc::new(Periodicals::new());
    periodicals
        .register_and_start(Arc::new(CountingPeriodical {
            name: "throughput",
            stop_on_shutdown: true,
            runs: stoppable_runs.clone(),
        }))
        .unwrap();
    periodicals
        .register_and_start(Arc::new(CountingPeriodical {
            name: "heartbeat",
            stop_on_shutdown: false,
            runs: heartbeat_runs.clone(),
        }))
        .unwrap();

    let (activity_actor, activities) = ActivityActor::new(8);
    tokio::spawn(activity_actor.run());

    let storage = Arc::new(RecordingStorage::new(&log));
    let halt = Arc::new(RecordingHalt::new(&log));

    // Load balancers polling right now would already see a live node.
    assert_eq!(status.lifecycle().load_balancer_status(), LoadBalancerStatus::Alive);

    GracefulShutdown::new(
        ShutdownConfig::default(),
        Subsystems {
            status: status.clone(),
            activities: Arc::new(activities),
            inputs,
            caches: caches.clone(),
            buffers: buffers.clone(),
            periodicals: periodicals.clone(),
            storage: storage.clone(),
            halt: halt.clone(),
        },
    )
    .run()
    .await;

    assert_eq!(halt.codes(), vec![EXIT_OK]);
    assert_eq!(input.stop_count(), 1);
    assert_eq!(caches.pending(), 0);
    assert_eq!(buffers.pending(), 0);
    assert_eq!(storage.close_count(), 1);
    assert_eq!(status.lifecycle(), Lifecycle::Halting);
    assert_eq!(status.lifecycle().load_balancer_status(), LoadBalancerStatus::Dead);
    assert!(status.is_processing());

    assert!(periodicals.handle("throughput").unwrap().is_cancelled());
    assert!(!periodicals.handle("heartbeat").unwrap().is_cancelled());

    // Only the excluded periodical keeps running afterwards.
    let stoppable_before = stoppable_runs.load(Ordering::SeqCst);
    let heartbeat_before = heartbeat_runs.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(stoppable_runs.load(Ordering::SeqCst), stoppable_before);
    assert!(heartbeat_runs.load(Ordering::SeqCst) > heartbeat_before);
}
