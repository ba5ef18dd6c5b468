//! # HTTP Client Module
//!
//! Creates the HTTP client used to forward requests to the payment API.
//!
//! ```rust,ignore
//! use paylog::routing::client::create_upstream_client;
//!
//! let client = create_upstream_client()?;
//! let response = client.get("http://localhost:5000/api/payments/history").send().await?;
//! ```

use reqwest::{Client, ClientBuilder, redirect};
use std::time::Duration;
use tracing::info;

/// Connect timeout for upstream connections
pub const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 10;
/// Pooled connections kept idle per upstream host
pub const DEFAULT_MAX_IDLE_PER_HOST: usize = 32;

/// Create the upstream forwarding client
pub fn create_upstream_client() -> Result<Client, Box<dyn std::error::Error + Send + Sync>> {
    let client = ClientBuilder::new()
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS))
        .pool_max_idle_per_host(DEFAULT_MAX_IDLE_PER_HOST)
        // Redirects go back to the caller untouched
        .redirect(redirect::Policy::none())
        .build()?;

    info!(
        "Upstream HTTP client created - connect_timeout: {}s",
        DEFAULT_CONNECT_TIMEOUT_SECONDS
    );

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_upstream_client() {
        assert!(create_upstream_client().is_ok());
    }
}
