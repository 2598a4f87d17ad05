//! Log output for tests.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "warn";

/// Installs a `tracing` subscriber writing through the test harness' capture
///
/// The filter is read from `RUST_LOG`. Calling this more than once, or after another
/// subscriber was installed, has no effect.
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
        if installed.is_err() {
            tracing::debug!("A tracing subscriber is already installed");
        }
    });
}
