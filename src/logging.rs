//! # Logging Bootstrap
//!
//! Console tracing initialization for binaries and tests that embed the
//! dispatcher. Library code only emits `tracing` events; installing a
//! subscriber stays the host's decision.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize console logging with an environment-driven filter.
///
/// Respects `RUST_LOG`, defaulting to `info`. Uses `try_init` so a host that
/// already installed a global subscriber wins; calling this multiple times
/// is harmless.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_filter(filter),
        );

        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized");
        }
    });
}
