//! Logging initialization for dispatch services.
//!
//! Binaries embedding the engine call one of these once at startup;
//! the engine itself only emits `tracing` events and never installs a
//! subscriber on its own.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter applied when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize human-readable log output.
///
/// The filter comes from the `RUST_LOG` environment variable, falling
/// back to `info`.
///
/// # Example
/// ```no_run
/// use rallypoint_engine::logging;
///
/// logging::init();
/// tracing::info!("Dispatch engine started");
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true))
        .init();
}

/// Initialize JSON log output for aggregation pipelines.
///
/// Same filtering rules as [`init`]; each event is emitted as one JSON
/// object per line.
///
/// # Example
/// ```no_run
/// use rallypoint_engine::logging;
///
/// logging::init_json();
/// tracing::info!(service = "dispatchd", "Service started");
/// ```
pub fn init_json() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_target(true).with_thread_ids(true))
        .init();
}
