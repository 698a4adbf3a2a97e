use std::time::Instant;

use tracing::info;

use crate::framework::InputSource;

/// Stops every input that is running right now, one after the other.
///
/// The set of inputs is a snapshot: inputs launched while this runs are left
/// alone. There is no per-input timeout, an input that never returns from
/// `stop` blocks here. Returns how many inputs were stopped.
pub async fn stop_inputs(inputs: &dyn InputSource) -> usize {
    let running = inputs.running_inputs();

    for input in &running {
        info!(input_id = input.id(), name = input.name(), "Attempting to close input");

        let started = Instant::now();
        input.stop().await;

        info!(
            input_id = input.id(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Input closed"
        );
    }

    running.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::{CallLog, RecordingInput};
    use crate::inputs::InputRegistry;

    #[tokio::test]
    async fn test_stops_each_running_input_once() {
        let log = CallLog::new();
        let registry = InputRegistry::new();
        registry.launch(RecordingInput::arc("in-1", "Syslog UDP", &log));
        registry.launch(RecordingInput::arc("in-2", "GELF TCP", &log));
        registry.register(RecordingInput::arc("in-3", "Not started", &log));

        let stopped = stop_inputs(&registry).await;

        assert_eq!(stopped, 2);
        assert_eq!(log.entries(), vec!["input.stop:in-1", "input.stop:in-2"]);
    }

    #[tokio::test]
    async fn test_no_running_inputs() {
        let registry = InputRegistry::new();
        assert_eq!(stop_inputs(&registry).await, 0);
    }
}
