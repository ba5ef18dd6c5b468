//! Server module for paylog.
//!
//! Runs the host HTTP service: the request tracking middleware in front of the
//! forwarding handler, the background log rotation task, and graceful shutdown
//! on Ctrl+C / SIGTERM.
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = paylog::env::get_config();
//! paylog::server::start_server(config).await?;
//! ```

pub mod shutdown;

use self::shutdown::ShutdownCoordinator;
use crate::AppState;
use crate::env::AppConfig;
use crate::logging::{Logger, MemoryUsage, RotationTask};
use crate::middleware::RequestTracker;
use crate::routing::router::create_router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Start the host service and block until a shutdown signal arrives
pub async fn start_server(
    config: AppConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let shutdown_coordinator = ShutdownCoordinator::new();

    let logger = Logger::from_config(&config.logger_config())?;
    info!("Writing category logs to {}", config.log_dir.display());

    let rotation = RotationTask::spawn_with_shutdown(
        logger.clone(),
        config.rotation_interval(),
        shutdown_coordinator.clone(),
    );

    let tracker = RequestTracker::new(logger.clone())
        .with_slow_request_threshold(config.slow_request_threshold())
        .with_trust_proxy(config.trust_proxy);
    let state = AppState::new(tracker, config.upstream_url.clone())?;

    let listener = TcpListener::bind(config.bind_address).await?;
    let addr = listener.local_addr()?;
    info!("paylog running on http://{}", addr);
    info!("Forwarding to {}", config.upstream_url);
    logger.info(format!(
        "SERVER_START | Address: {} | Upstream: {}",
        addr, config.upstream_url
    ));
    logger
        .performance()
        .memory("server_start", &MemoryUsage::current());

    // Signal listener for the whole process
    let signal_coordinator = shutdown_coordinator.clone();
    tokio::spawn(async move {
        signal_coordinator.wait_for_shutdown_signal().await;
    });

    let result = serve(listener, state, shutdown_coordinator).await;
    if let Err(ref err) = result {
        error!("paylog server error: {}", err);
    }

    rotation.stop().await;
    logger.info("SERVER_STOP | Graceful shutdown complete");
    info!("paylog shutdown complete");

    result.map_err(Into::into)
}

/// Serve the router on `listener` until `shutdown` is initiated
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: ShutdownCoordinator,
) -> std::io::Result<()> {
    let app = create_router(state);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown.wait_for_shutdown().await;
        info!("paylog server shutting down...");
    })
    .await
}
