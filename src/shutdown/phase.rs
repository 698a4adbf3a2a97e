use std::fmt;

/// The phases of a graceful shutdown, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShutdownPhase {
    MarkHalting,
    LoadBalancerRecognition,
    RecordActivity,
    GracePeriod,
    StopInputs,
    ResumeProcessing,
    DrainCaches,
    DrainBuffers,
    CancelPeriodicals,
    CloseStorage,
    Halt,
}

impl ShutdownPhase {
    pub const ALL: [ShutdownPhase; 11] = [
        ShutdownPhase::MarkHalting,
        ShutdownPhase::LoadBalancerRecognition,
        ShutdownPhase::RecordActivity,
        ShutdownPhase::GracePeriod,
        ShutdownPhase::StopInputs,
        ShutdownPhase::ResumeProcessing,
        ShutdownPhase::DrainCaches,
        ShutdownPhase::DrainBuffers,
        ShutdownPhase::CancelPeriodicals,
        ShutdownPhase::CloseStorage,
        ShutdownPhase::Halt,
    ];

    /// Zero-based position in the sequence.
    pub fn number(&self) -> usize {
        *self as usize
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            ShutdownPhase::MarkHalting => "mark_halting",
            ShutdownPhase::LoadBalancerRecognition => "lb_recognition",
            ShutdownPhase::RecordActivity => "record_activity",
            ShutdownPhase::GracePeriod => "grace_period",
            ShutdownPhase::StopInputs => "stop_inputs",
            ShutdownPhase::ResumeProcessing => "resume_processing",
            ShutdownPhase::DrainCaches => "drain_caches",
            ShutdownPhase::DrainBuffers => "drain_buffers",
            ShutdownPhase::CancelPeriodicals => "cancel_periodicals",
            ShutdownPhase::CloseStorage => "close_storage",
            ShutdownPhase::Halt => "halt",
        }
    }
}

impl fmt::Display for ShutdownPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.number(), self.as_label())
    }
}
