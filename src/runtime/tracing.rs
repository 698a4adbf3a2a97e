/// Initializes the tracing/logging infrastructure for the node.
///
/// This sets up structured logging using the `tracing` crate with:
/// - **Environment-based filtering**: Controlled via `RUST_LOG` environment variable
/// - **Compact formatting**: one line per event, span context inline
///
/// # Environment Variables
///
/// Set `RUST_LOG` to control log verbosity:
/// - `RUST_LOG=info` - Phase transitions, input closes, periodical cancels
/// - `RUST_LOG=debug` - Also lifecycle changes and drain counter updates
/// - `RUST_LOG=node_halt::drain=debug` - Debug only for the drain gauges
///
/// # Example
///
/// ```ignore
/// setup_tracing();
/// tracing::info!("Node started");
/// ```
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
