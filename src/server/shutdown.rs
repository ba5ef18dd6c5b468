//! Graceful shutdown coordinator for paylog
//!
//! Shared by the HTTP server and the background rotation task so that a single
//! Ctrl+C / SIGTERM, or a manual trigger in tests, stops everything cleanly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Shutdown coordinator that manages graceful shutdown of all services
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    /// Atomic flag indicating if shutdown has been initiated
    shutdown_initiated: Arc<AtomicBool>,
    /// Broadcast sender for shutdown signals
    shutdown_tx: broadcast::Sender<()>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);

        Self {
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }

    /// Create a shutdown receiver for background tasks
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Initiate graceful shutdown; later calls are no-ops
    pub fn initiate_shutdown(&self) {
        if !self.shutdown_initiated.swap(true, Ordering::SeqCst) {
            info!("Initiating graceful shutdown...");
            // No receivers just means no background task is running
            let _ = self.shutdown_tx.send(());
        }
    }

    /// Resolve once shutdown has been initiated by any means
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.subscribe();
        if self.is_shutdown_initiated() {
            return;
        }
        let _ = rx.recv().await;
    }

    /// Wait for SIGTERM, SIGINT or a manual trigger, then initiate shutdown
    pub async fn wait_for_shutdown_signal(&self) {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C signal");
            }
            _ = terminate => {
                info!("Received SIGTERM signal");
            }
            _ = self.wait_for_shutdown() => {
                return;
            }
        }

        self.initiate_shutdown();
    }
}

/// Background task wrapper that handles shutdown signals
pub struct ShutdownAwareTask {
    shutdown_initiated: Arc<AtomicBool>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl ShutdownAwareTask {
    pub fn new(coordinator: &ShutdownCoordinator) -> Self {
        Self {
            shutdown_initiated: coordinator.shutdown_initiated.clone(),
            shutdown_rx: coordinator.subscribe(),
        }
    }

    /// Wait for either a shutdown signal or the specified duration.
    /// Returns `true` if shutdown was requested.
    pub async fn wait_or_shutdown(&mut self, duration: Duration) -> bool {
        if self.shutdown_initiated.load(Ordering::SeqCst) {
            return true;
        }

        tokio::select! {
            result = self.shutdown_rx.recv() => {
                if let Err(broadcast::error::RecvError::Lagged(skipped)) = result {
                    warn!("Shutdown receiver lagged by {} message(s)", skipped);
                }
                true
            }
            _ = tokio::time::sleep(duration) => false,
        }
    }
}
