//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset: lifecycle events only.
pub const DEFAULT_LOG_FILTER: &str = "prometheus_resource_arbiter=info";

/// Install a default env-based subscriber unless the host already set one.
///
/// Filter with `RUST_LOG`, e.g. `RUST_LOG=prometheus_resource_arbiter=debug`
/// to see every scheduled, delivered and dropped notification.
pub fn init_tracing() {
    init_tracing_with(DEFAULT_LOG_FILTER);
}

/// Same as [`init_tracing`] with a caller-chosen fallback filter.
pub fn init_tracing_with(fallback_filter: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_filter));
    // Scheduler callbacks log from the worker; thread names tell them apart.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
