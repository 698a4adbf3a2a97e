use std::fmt;

/// What a load balancer should conclude when it polls the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadBalancerStatus {
    Alive,
    Dead,
    Throttled,
}

/// Operational phase of the node.
///
/// The lifecycle is exposed to load balancers through
/// [`Lifecycle::load_balancer_status`]. `Halting` reports `Dead`, which is
/// what stops new traffic from being routed here while the node drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Uninitialized,
    Starting,
    Running,
    Paused,
    Throttled,
    Halting,
    Failed,
    OverrideLbDead,
    OverrideLbAlive,
    OverrideLbThrottled,
}

impl Lifecycle {
    pub fn load_balancer_status(&self) -> LoadBalancerStatus {
        match self {
            Lifecycle::Running | Lifecycle::Paused | Lifecycle::OverrideLbAlive => {
                LoadBalancerStatus::Alive
            }
            Lifecycle::Throttled | Lifecycle::OverrideLbThrottled => LoadBalancerStatus::Throttled,
            Lifecycle::Uninitialized
            | Lifecycle::Starting
            | Lifecycle::Halting
            | Lifecycle::Failed
            | Lifecycle::OverrideLbDead => LoadBalancerStatus::Dead,
        }
    }

    /// Short description used in log lines.
    pub fn description(&self) -> &'static str {
        match self {
            Lifecycle::Uninitialized => "Uninitialized",
            Lifecycle::Starting => "Starting",
            Lifecycle::Running => "Running",
            Lifecycle::Paused => "Paused",
            Lifecycle::Throttled => "Throttled",
            Lifecycle::Halting => "Halting",
            Lifecycle::Failed => "Failed",
            Lifecycle::OverrideLbDead => "Override lb:DEAD",
            Lifecycle::OverrideLbAlive => "Override lb:ALIVE",
            Lifecycle::OverrideLbThrottled => "Override lb:THROTTLED",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [LB:{:?}]",
            self.description(),
            self.load_balancer_status()
        )
    }
}
