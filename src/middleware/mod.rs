//! # Request Tracking Middleware
//!
//! Instruments every inbound request/response pair through the [`Logger`]
//! without altering either.
//!
//! ## Flow
//!
//! 1. Record the start time and log `API_REQUEST`
//! 2. Run the downstream chain
//! 3. When the response comes back, log `API_ERROR` for status >= 400 or
//!    `API_RESPONSE` with the elapsed time otherwise
//! 4. Log a `PERFORMANCE` timing tagged `api_request` for slow requests
//! 5. Hand the response back untouched
//!
//! ## Usage
//!
//! ```rust,ignore
//! let tracker = RequestTracker::new(logger);
//! let app = Router::new()
//!     .route("/", get(handler))
//!     .layer(axum::middleware::from_fn_with_state(tracker, track_request));
//! ```

use crate::logging::Logger;
use axum::{
    extract::{ConnectInfo, OriginalUri, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::json;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

/// Requests slower than this also get a performance entry
pub const DEFAULT_SLOW_REQUEST_MS: u64 = 1000;

const UNKNOWN: &str = "unknown";

///////////////////////////////////////////////////////////////////////////////
//****                         Public Structs                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Timing context for one request, created at entry and consumed at completion
#[derive(Debug, Clone)]
pub struct RequestTiming {
    pub start: Instant,
    pub method: String,
    pub url: String,
    pub client_ip: String,
    pub user_agent: String,
}

impl RequestTiming {
    /// Capture method, original url, client address and user agent of a request.
    /// `X-Forwarded-For` is only consulted when `trust_proxy` is set.
    pub fn from_request(request: &Request, trust_proxy: bool) -> Self {
        let uri = request
            .extensions()
            .get::<OriginalUri>()
            .map(|OriginalUri(uri)| uri)
            .unwrap_or_else(|| request.uri());
        let url = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());

        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            start: Instant::now(),
            method: request.method().to_string(),
            url,
            client_ip: client_ip(request.headers(), peer, trust_proxy),
            user_agent: request
                .headers()
                .get("user-agent")
                .and_then(|h| h.to_str().ok())
                .unwrap_or(UNKNOWN)
                .to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Middleware state: the logger, the slow request threshold and whether a
/// fronting proxy's `X-Forwarded-For` is believed
#[derive(Debug, Clone)]
pub struct RequestTracker {
    logger: Logger,
    slow_request_threshold: Duration,
    trust_proxy: bool,
}

impl RequestTracker {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            slow_request_threshold: Duration::from_millis(DEFAULT_SLOW_REQUEST_MS),
            trust_proxy: false,
        }
    }

    pub fn with_slow_request_threshold(mut self, threshold: Duration) -> Self {
        self.slow_request_threshold = threshold;
        self
    }

    pub fn with_trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Start timing a request and log its arrival
    pub fn begin(&self, request: &Request) -> RequestTiming {
        let timing = RequestTiming::from_request(request, self.trust_proxy);
        self.logger.api().request(
            &timing.method,
            &timing.url,
            &timing.client_ip,
            &timing.user_agent,
        );
        timing
    }

    /// Log the outcome of a request whose response is final
    pub fn finish(&self, timing: &RequestTiming, status: StatusCode) {
        self.record_completion(timing, status.as_u16(), timing.elapsed());
    }

    /// Log the outcome for an explicit elapsed time
    pub fn record_completion(&self, timing: &RequestTiming, status_code: u16, elapsed: Duration) {
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let api = self.logger.api();

        if status_code >= 400 {
            api.error(
                &timing.method,
                &timing.url,
                format!("HTTP {}", status_code),
                status_code,
            );
        } else {
            api.response(&timing.method, &timing.url, status_code, elapsed_ms);
        }

        // Compared in whole milliseconds, the unit that gets logged
        if u128::from(elapsed_ms) > self.slow_request_threshold.as_millis() {
            let details = json!({
                "method": timing.method,
                "url": timing.url,
                "statusCode": status_code,
            });
            self.logger
                .performance()
                .timing("api_request", elapsed_ms, Some(&details));
        }
    }
}

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Request tracking middleware, mount with `axum::middleware::from_fn_with_state`
pub async fn track_request(
    State(tracker): State<RequestTracker>,
    request: Request,
    next: Next,
) -> Response {
    let timing = tracker.begin(&request);
    let response = next.run(request).await;
    tracker.finish(&timing, response.status());
    response
}

/// Client address: the socket peer, or `unknown` without one. With
/// `trust_proxy` the first `X-Forwarded-For` hop wins when it is a valid IP.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
        {
            return forwarded.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
