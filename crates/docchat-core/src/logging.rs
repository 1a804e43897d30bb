//! Tracing initialization for hosting processes.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Filter comes from `RUST_LOG`, defaulting to `info` for this workspace's
/// crates. Safe to call once per process; later calls are ignored (useful
/// when tests race to initialize).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,docchat_core=info,docchat_client=info,docchat_runtime=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
