//! Command implementations.
//!
//! Each command takes the loaded [`Project`](crate::project::Project) and
//! returns a [`Result`](crate::error::Result).

pub mod build;
pub mod dev;
pub mod serve;

/// Resolves on Ctrl+C. If the signal handler cannot be installed this never
/// resolves; the process is then stopped the hard way.
pub(crate) async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
