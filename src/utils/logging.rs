// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

// html5ever and selectors are chatty at debug level while parsing result pages.
const DEFAULT_FILTER: &str = "info,html5ever=warn,selectors=warn";

/// Installs the global subscriber. `RUST_LOG` wins over [`DEFAULT_FILTER`].
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    tracing::debug!("Logging setup complete.");
}
