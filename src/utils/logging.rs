use tracing_subscriber::{EnvFilter, fmt};

/// Default `RUST_LOG` filter when the environment does not set one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Install the process-wide tracing subscriber. Call once, before the
/// first cell is configured. Safe to call more than once; later calls
/// are no-ops.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_LEVEL))
        .unwrap();

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .compact()
        .with_writer(std::io::stderr)
        .try_init();
}
