//! Tracing subscriber setup for the binary and for tests.

use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{Result, SyncError};

/// Initialises the global subscriber. The filter comes from `RUST_LOG`,
/// defaulting to `info`.
pub fn init() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|error| SyncError::Logging(error.to_string()))
}

/// Test variant: verbose, captured by the test harness, and tolerant of
/// repeated initialisation across test binaries.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
