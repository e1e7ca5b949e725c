//! OS signal handling.
//!
//! # Responsibilities
//! - Resolve a future on Ctrl-C so long waits can be abandoned cleanly
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Interrupting after broadcast only stops waiting; the transaction stays
//!   in flight

/// Resolves when the user presses Ctrl-C.
///
/// If the handler cannot be installed the future never resolves, so racing
/// it against other work is always safe.
pub async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Interrupt received");
}
