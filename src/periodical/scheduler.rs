use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::framework::{CancelHandle, PeriodicalInfo, PeriodicalSource};
use crate::periodical::{Periodical, PeriodicalError};

/// Handle to one scheduled periodical task.
#[derive(Debug)]
pub struct ScheduledHandle {
    token: CancellationToken,
    abort: AbortHandle,
}

impl ScheduledHandle {
    /// Spawns the task loop of `periodical`. Must be called from within a
    /// Tokio runtime.
    fn spawn(periodical: Arc<dyn Periodical>) -> Self {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let task = tokio::spawn(async move {
            let name = periodical.name().to_string();

            tokio::select! {
                _ = cancelled.cancelled() => {
                    debug!(periodical = %name, "Cancelled before first run");
                    return;
                }
                _ = tokio::time::sleep(periodical.initial_delay()) => {}
            }

            if periodical.is_one_off() {
                periodical.run().await;
                debug!(periodical = %name, "One-off run finished");
                return;
            }

            let mut ticker = tokio::time::interval(periodical.period());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                // Not raced against the token: a started run always completes
                // unless the task is aborted.
                periodical.run().await;
            }

            debug!(periodical = %name, "Periodical stopped");
        });

        Self {
            token,
            abort: task.abort_handle(),
        }
    }

    /// True once the underlying task has exited.
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

impl CancelHandle for ScheduledHandle {
    fn cancel(&self, interrupt_running: bool) {
        self.token.cancel();
        if interrupt_running {
            self.abort.abort();
        }
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Registry and scheduler of all periodicals of the node.
#[derive(Default)]
pub struct Periodicals {
    periodicals: RwLock<Vec<Arc<dyn Periodical>>>,
    handles: RwLock<HashMap<String, Arc<ScheduledHandle>>>,
}

impl Periodicals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `periodical` and, if it starts on this node, schedules it.
    pub fn register_and_start(&self, periodical: Arc<dyn Periodical>) -> Result<(), PeriodicalError> {
        let name = periodical.name().to_string();

        if !periodical.is_one_off() && periodical.period().is_zero() {
            return Err(PeriodicalError::ZeroPeriod(name));
        }

        {
            let mut periodicals = self
                .periodicals
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if periodicals.iter().any(|p| p.name() == name) {
                return Err(PeriodicalError::AlreadyRegistered(name));
            }
            periodicals.push(periodical.clone());
        }

        if !periodical.start_on_this_node() {
            info!(periodical = %name, "Not starting periodical on this node");
            return Ok(());
        }

        info!(
            periodical = %name,
            initial_delay_ms = periodical.initial_delay().as_millis() as u64,
            period_ms = periodical.period().as_millis() as u64,
            one_off = periodical.is_one_off(),
            "Starting periodical"
        );
        let handle = Arc::new(ScheduledHandle::spawn(periodical));
        self.handles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, handle);
        Ok(())
    }

    /// Descriptors of every registered periodical.
    pub fn all(&self) -> Vec<PeriodicalInfo> {
        self.periodicals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|p| p.info())
            .collect()
    }

    pub fn handle(&self, name: &str) -> Option<Arc<ScheduledHandle>> {
        self.handles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}

impl PeriodicalSource for Periodicals {
    fn stoppable_on_graceful_shutdown(&self) -> Vec<PeriodicalInfo> {
        self.all()
            .into_iter()
            .filter(|info| info.stop_on_graceful_shutdown)
            .collect()
    }

    fn cancel_handle(&self, periodical: &PeriodicalInfo) -> Option<Arc<dyn CancelHandle>> {
        self.handle(&periodical.name)
            .map(|handle| handle as Arc<dyn CancelHandle>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Counter {
        name: &'static str,
        runs: Arc<AtomicUsize>,
        run_time: Duration,
        stop_on_shutdown: bool,
        on_this_node: bool,
        one_off: bool,
        initial_delay: Duration,
    }

    impl Counter {
        fn new(name: &'static str, runs: &Arc<AtomicUsize>) -> Self {
            Self {
                name,
                runs: runs.clone(),
                run_time: Duration::ZERO,
                stop_on_shutdown: true,
                on_this_node: true,
                one_off: false,
                initial_delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl Periodical for Counter {
        fn name(&self) -> &str {
            self.name
        }

        fn period(&self) -> Duration {
            Duration::from_secs(1)
        }

        fn initial_delay(&self) -> Duration {
            self.initial_delay
        }

        fn is_one_off(&self) -> bool {
            self.one_off
        }

        fn start_on_this_node(&self) -> bool {
            self.on_this_node
        }

        fn stop_on_graceful_shutdown(&self) -> bool {
            self.stop_on_shutdown
        }

        async fn run(&self) {
            tokio::time::sleep(self.run_time).await;
            self.runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_repeatedly_until_cancelled() {
        let runs = Arc::new(AtomicUsize::new(0));
        let periodicals = Periodicals::new();
        periodicals
            .register_and_start(Arc::new(Counter::new("counter", &runs)))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        let handle = periodicals.handle("counter").unwrap();
        handle.cancel(false);
        assert!(handle.is_cancelled());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_does_not_interrupt_running_execution() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut slow = Counter::new("slow", &runs);
        slow.run_time = Duration::from_secs(10);

        let periodicals = Periodicals::new();
        periodicals.register_and_start(Arc::new(slow)).unwrap();

        // First run starts at t=0 and is in progress at t=1.
        tokio::time::sleep(Duration::from_secs(1)).await;
        periodicals.handle("slow").unwrap().cancel(false);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forced_cancel_aborts_running_execution() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut slow = Counter::new("slow", &runs);
        slow.run_time = Duration::from_secs(10);

        let periodicals = Periodicals::new();
        periodicals.register_and_start(Arc::new(slow)).unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        periodicals.handle("slow").unwrap().cancel(true);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_off_runs_exactly_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut once = Counter::new("once", &runs);
        once.one_off = true;
        once.initial_delay = Duration::from_secs(2);

        let periodicals = Periodicals::new();
        periodicals.register_and_start(Arc::new(once)).unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(periodicals.handle("once").unwrap().is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_during_initial_delay_never_runs() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut delayed = Counter::new("delayed", &runs);
        delayed.initial_delay = Duration::from_secs(10);

        let periodicals = Periodicals::new();
        periodicals.register_and_start(Arc::new(delayed)).unwrap();

        tokio::time::sleep(Duration::from_secs(5)).await;
        let handle = periodicals.handle("delayed").unwrap();
        handle.cancel(false);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(handle.is_finished());
    }

    #[test]
    fn test_zero_period_is_rejected() {
        struct Broken;

        #[async_trait]
        impl Periodical for Broken {
            fn name(&self) -> &str {
                "broken"
            }

            fn period(&self) -> Duration {
                Duration::ZERO
            }

            fn stop_on_graceful_shutdown(&self) -> bool {
                true
            }

            async fn run(&self) {}
        }

        let err = Periodicals::new().register_and_start(Arc::new(Broken)).unwrap_err();
        assert_eq!(err, PeriodicalError::ZeroPeriod("broken".to_string()));
    }

    #[tokio::test]
    async fn test_not_started_on_this_node_has_no_handle() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut leader_only = Counter::new("leader-only", &runs);
        leader_only.on_this_node = false;
        let mut keep_running = Counter::new("keep-running", &runs);
        keep_running.stop_on_shutdown = false;

        let periodicals = Periodicals::new();
        periodicals.register_and_start(Arc::new(leader_only)).unwrap();
        periodicals.register_and_start(Arc::new(keep_running)).unwrap();

        let stoppable = periodicals.stoppable_on_graceful_shutdown();
        assert_eq!(stoppable, vec![PeriodicalInfo::new("leader-only", true)]);
        assert!(periodicals.cancel_handle(&stoppable[0]).is_none());
        assert!(periodicals.handle("keep-running").is_some());
    }

    #[tokio::test]
    async fn test_duplicate_names_are_rejected() {
        let runs = Arc::new(AtomicUsize::new(0));
        let periodicals = Periodicals::new();
        periodicals
            .register_and_start(Arc::new(Counter::new("dup", &runs)))
            .unwrap();

        let err = periodicals
            .register_and_start(Arc::new(Counter::new("dup", &runs)))
            .unwrap_err();
        assert_eq!(err, PeriodicalError::AlreadyRegistered("dup".to_string()));
    }
}
