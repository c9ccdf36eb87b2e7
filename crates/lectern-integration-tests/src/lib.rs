//! Integration test crate for the Lectern workbench.
//!
//! This crate has no library code beyond a logging helper — it only
//! contains integration tests that exercise flows across the workspace
//! crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p lectern-integration-tests
//! ```

/// Install a tracing subscriber honoring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
