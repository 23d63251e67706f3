use tracing_subscriber::{EnvFilter, fmt};

/// Console tracing for binaries and tests. `RUST_LOG` wins when set;
/// otherwise `default_filter` applies.
pub fn init_tracing(service: &str) {
    init_tracing_with_filter(service, "info");
}

pub fn init_tracing_with_filter(service: &str, default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .try_init();

    tracing::info!(service, "tracing initialized");
}
