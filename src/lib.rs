//! # paylog
//!
//! Categorized logging and request tracking for a payment backend.
//!
//! - [`logging`]: the logging service, its sinks and log rotation
//! - [`middleware`]: request tracking middleware for axum
//! - [`routing`] and [`server`]: host service forwarding traffic to the payment API
//! - [`env`]: environment driven configuration
//! - [`cli`]: command line entry points

pub mod cli;
pub mod env;
pub mod logging;
pub mod middleware;
pub mod routing;
pub mod server;

#[cfg(test)]
mod tests;

use crate::logging::Logger;
use crate::middleware::RequestTracker;

/// Shared state of the host service
#[derive(Clone)]
pub struct AppState {
    pub logger: Logger,
    pub tracker: RequestTracker,
    pub http_client: reqwest::Client,
    pub upstream_url: String,
}

impl AppState {
    /// Build the state around a configured tracker; the tracker's logger is shared
    pub fn new(
        tracker: RequestTracker,
        upstream_url: impl Into<String>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self {
            logger: tracker.logger().clone(),
            tracker,
            http_client: routing::client::create_upstream_client()?,
            upstream_url: upstream_url.into(),
        })
    }
}
