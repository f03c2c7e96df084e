//! Tracing setup for hosts embedding the library.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! host's call. [`init_tracing`] is the default one.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "GLUCOSE_BRIDGE_LOG";

/// Filter used when [`LOG_ENV`] is unset or invalid.
pub fn default_log_filter() -> &'static str {
    "info,glucose_bridge_core=info"
}

/// Install a fmt subscriber filtered by [`LOG_ENV`].
///
/// Returns `false` when a global subscriber was already set, so calling it
/// twice is harmless.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

