//! # Forwarding Handlers Module
//!
//! Transparent forwarding of every request that no local route claims to the
//! upstream payment API (validate-phone, initialize, mpesa, verify, status,
//! retry, cancel, history, release-escrow, ...). The payment logic itself lives
//! upstream; this handler only moves bytes.
//!
//! ## Request Flow
//!
//! 1. Join the upstream base URL with the original path and query
//! 2. Copy method, end-to-end headers and body
//! 3. Return upstream status, end-to-end headers and body unchanged
//! 4. On connection or read failure, record the error and answer 502

use crate::AppState;
use crate::logging::ErrorContext;
use axum::{
    body::Bytes,
    extract::{OriginalUri, State},
    http::{HeaderMap, HeaderName, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};
use uuid::Uuid;

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

/// Forward a request to the upstream payment API
pub async fn forward_request(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let target = upstream_target(&state.upstream_url, path_and_query);
    debug!("Forwarding {} {} to {}", method, path_and_query, target);

    let mut builder = state.http_client.request(method.clone(), &target);
    for (name, value) in headers.iter() {
        if is_end_to_end(name) && name != header::HOST {
            builder = builder.header(name, value);
        }
    }
    if !body.is_empty() {
        builder = builder.body(body);
    }

    let upstream = match builder.send().await {
        Ok(response) => response,
        Err(e) => return upstream_failure(&state, &method, path_and_query, &headers, e),
    };

    let status = upstream.status();
    let mut response_headers = HeaderMap::new();
    for (name, value) in upstream.headers().iter() {
        if is_end_to_end(name) {
            response_headers.append(name.clone(), value.clone());
        }
    }

    match upstream.bytes().await {
        Ok(bytes) => (status, response_headers, bytes).into_response(),
        Err(e) => upstream_failure(&state, &method, path_and_query, &headers, e),
    }
}

/// Join the upstream base with a path and query without doubling the slash
pub fn upstream_target(base: &str, path_and_query: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path_and_query.trim_start_matches('/')
    )
}

/// Headers that are meaningful end to end, i.e. not connection-scoped
pub fn is_end_to_end(name: &HeaderName) -> bool {
    !matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

///////////////////////////////////////////////////////////////////////////////
//****                      Private Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

fn upstream_failure(
    state: &AppState,
    method: &Method,
    path_and_query: &str,
    headers: &HeaderMap,
    err: reqwest::Error,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    warn!(
        request_id = %request_id,
        "Upstream request {} {} failed: {}",
        method, path_and_query, err
    );

    let mut context = ErrorContext::new()
        .with_route(path_and_query)
        .with_method(method.as_str())
        .with_request_id(request_id)
        .with_field("upstream", state.upstream_url.as_str());
    if let Some(user_agent) = headers.get(header::USER_AGENT).and_then(|h| h.to_str().ok()) {
        context = context.with_field("user_agent", user_agent);
    }
    state.logger.error(&err, Some(&context));

    (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
// Forwarding round trips are covered in the crate's tests module
