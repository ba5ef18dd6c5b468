//! # Router Module
//!
//! Builds the axum router for the host service.
//!
//! ## Architecture
//!
//! The router follows a layered architecture:
//! 1. `/health` answered locally
//! 2. Fallback forwarding of every other path to the payment API
//! 3. Application state injection
//! 4. Request tracking middleware (api, error and performance entries)
//! 5. HTTP tracing layer, outermost

use crate::AppState;
use crate::middleware::track_request;
use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use super::handlers::forward_request;

///////////////////////////////////////////////////////////////////////////////
//****                       Public Functions                            ****//
///////////////////////////////////////////////////////////////////////////////

pub fn create_router(state: AppState) -> Router {
    let tracker = state.tracker.clone();

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .fallback(forward_request)
        .with_state(state)
        .layer(middleware::from_fn_with_state(tracker, track_request))
        .layer(TraceLayer::new_for_http())
}

///////////////////////////////////////////////////////////////////////////////
//****                              Tests                                ****//
///////////////////////////////////////////////////////////////////////////////
// Tests for the router are in the tests module
