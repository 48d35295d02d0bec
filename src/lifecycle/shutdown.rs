//! Shutdown coordination.
//!
//! # Responsibilities
//! - Broadcast a stop signal to the server and background tasks
//! - Translate Ctrl+C into the same stop signal
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Either source (coordinator or Ctrl+C) stops the server

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Every long-running task subscribes and stops once `trigger` is called.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the shutdown signal.
    pub fn trigger(&self) {
        // No subscribers just means nothing is running yet.
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves when the coordinator fires or Ctrl+C is received.
pub async fn shutdown_signal(mut shutdown: broadcast::Receiver<()>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = shutdown.recv() => {
            tracing::info!("Shutdown requested");
        }
        _ = ctrl_c => {
            tracing::info!("Shutdown signal received");
        }
    }
}
