//! Signal handling module
//!
//! SIGTERM and SIGINT both request graceful shutdown. Configuration is
//! read once at startup; restart the process to pick up changes.

use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Start the shutdown signal listener (Unix).
///
/// Spawns a background task that fires `shutdown` once on the first
/// SIGTERM or SIGINT.
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(e) => {
                logger::log_error(&format!("Failed to register SIGTERM handler: {e}"));
                return;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(stream) => stream,
            Err(e) => {
                logger::log_error(&format!("Failed to register SIGINT handler: {e}"));
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => logger::log_shutdown_signal("SIGTERM"),
            _ = sigint.recv() => logger::log_shutdown_signal("SIGINT"),
        }
        shutdown.notify_waiters();
    });
}

/// Windows fallback - only handles Ctrl+C.
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_shutdown_signal("Ctrl+C");
            shutdown.notify_waiters();
        }
    });
}
