//! HTTP level tests: the tracking middleware inside a real axum pipeline,
//! forwarding to an upstream, and graceful shutdown of the host service.
use crate::AppState;
use crate::logging::{LogCategory, LogLevel, Logger, MemorySink};
use crate::middleware::{RequestTracker, track_request};
use crate::server::serve;
use crate::server::shutdown::ShutdownCoordinator;
use axum::{
    Router,
    http::{HeaderMap, StatusCode},
    middleware,
    routing::{get, post},
};
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

fn memory_logger() -> (Logger, Arc<MemorySink>) {
    let files = Arc::new(MemorySink::new());
    let logger = Logger::new(files.clone(), Arc::new(MemorySink::new()));
    (logger, files)
}

async fn spawn_app(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

/// Payment-like routes behind the tracker: fast 200, failing 500 and a slow 200
fn tracked_app(tracker: RequestTracker) -> Router {
    Router::new()
        .route("/api/payments/history", get(|| async { "[]" }))
        .route(
            "/api/payments/initialize",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "gateway unavailable") }),
        )
        .route(
            "/api/payments/verify/{reference}",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(150)).await;
                "verified"
            }),
        )
        .layer(middleware::from_fn_with_state(tracker, track_request))
}

/// Stand-in for the payment API the host forwards to
fn upstream_app() -> Router {
    Router::new()
        .route(
            "/api/payments/validate-phone",
            post(|body: String| async move { format!("echo:{}", body) }),
        )
        .route(
            "/api/payments/status/{reference}",
            get(|headers: HeaderMap| async move {
                let marker = headers
                    .get("x-booking-id")
                    .and_then(|h| h.to_str().ok())
                    .unwrap_or("missing")
                    .to_string();
                (StatusCode::ACCEPTED, [("x-upstream", "payments")], marker)
            }),
        )
        .route(
            "/api/payments/cancel",
            post(|| async { (StatusCode::NOT_FOUND, "no such payment") }),
        )
}

#[tokio::test]
async fn successful_request_logs_request_and_response() {
    let (logger, files) = memory_logger();
    let addr = spawn_app(tracked_app(RequestTracker::new(logger))).await;

    let res = Client::new()
        .get(format!("http://{}/api/payments/history?limit=5", addr))
        .header("user-agent", "paylog-test/1.0")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "[]");

    let requests = files.matching("API_REQUEST");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].category, LogCategory::Api);
    assert_eq!(
        requests[0].message,
        "API_REQUEST | Method: GET | Endpoint: /api/payments/history?limit=5 | IP: 127.0.0.1 \
         | UA: paylog-test/1.0"
    );

    let responses = files.matching("API_RESPONSE");
    assert_eq!(responses.len(), 1);
    assert!(responses[0].message.starts_with(
        "API_RESPONSE | Method: GET | Endpoint: /api/payments/history?limit=5 | Status: 200 \
         | Time: "
    ));
    assert!(files.matching("API_ERROR").is_empty());
    assert!(files.matching("PERFORMANCE").is_empty());
}

#[tokio::test]
async fn error_status_logs_api_error_and_keeps_body() {
    let (logger, files) = memory_logger();
    let addr = spawn_app(tracked_app(RequestTracker::new(logger))).await;

    let res = Client::new()
        .post(format!("http://{}/api/payments/initialize", addr))
        .header("x-forwarded-for", "41.90.1.7, 10.0.0.2")
        .json(&serde_json::json!({"amount": 1500}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    assert_eq!(res.text().await.unwrap(), "gateway unavailable");

    // Forwarded header is not trusted by default
    let requests = files.matching("API_REQUEST");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].message.contains("| IP: 127.0.0.1 |"));

    let errors = files.matching("API_ERROR");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].level, LogLevel::Error);
    assert_eq!(
        errors[0].message,
        "API_ERROR | Method: POST | Endpoint: /api/payments/initialize | Error: HTTP 500 \
         | Status: 500"
    );
    assert!(files.matching("API_RESPONSE").is_empty());
}

#[tokio::test]
async fn trusted_proxy_address_is_logged() {
    let (logger, files) = memory_logger();
    let addr = spawn_app(tracked_app(RequestTracker::new(logger).with_trust_proxy(true))).await;

    Client::new()
        .get(format!("http://{}/api/payments/history", addr))
        .header("x-forwarded-for", "41.90.1.7, 10.0.0.2")
        .send()
        .await
        .unwrap();

    let requests = files.matching("API_REQUEST");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].message.contains("| IP: 41.90.1.7 |"));
}

#[tokio::test]
async fn slow_request_adds_performance_entry() {
    let (logger, files) = memory_logger();
    let tracker =
        RequestTracker::new(logger).with_slow_request_threshold(Duration::from_millis(50));
    let addr = spawn_app(tracked_app(tracker)).await;

    let res = Client::new()
        .get(format!("http://{}/api/payments/verify/PAY_001", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "verified");

    assert_eq!(files.matching("API_RESPONSE").len(), 1);
    let timings = files.matching("PERFORMANCE");
    assert_eq!(timings.len(), 1);
    assert_eq!(timings[0].category, LogCategory::Performance);
    assert!(
        timings[0]
            .message
            .starts_with("PERFORMANCE | Operation: api_request | Duration: ")
    );
    assert!(timings[0].message.ends_with(
        r#"| Details: {"method":"GET","statusCode":200,"url":"/api/payments/verify/PAY_001"}"#
    ));
}

#[tokio::test]
async fn every_request_is_tracked_once() {
    let (logger, files) = memory_logger();
    let addr = spawn_app(tracked_app(RequestTracker::new(logger))).await;
    let client = Client::new();

    for _ in 0..5 {
        client
            .get(format!("http://{}/api/payments/history", addr))
            .send()
            .await
            .unwrap();
    }
    client
        .get(format!("http://{}/api/payments/unknown", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(files.matching("API_REQUEST").len(), 6);
    assert_eq!(files.matching("API_RESPONSE").len(), 5);
    let errors = files.matching("API_ERROR");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.ends_with("| Error: HTTP 404 | Status: 404"));
}

#[tokio::test]
async fn host_forwards_to_upstream_unchanged() {
    let upstream = spawn_app(upstream_app()).await;
    let (logger, files) = memory_logger();
    let state = AppState::new(RequestTracker::new(logger), format!("http://{}", upstream)).unwrap();
    let addr = spawn_app(crate::routing::router::create_router(state)).await;
    let client = Client::new();

    let res = client
        .post(format!("http://{}/api/payments/validate-phone", addr))
        .body("254712345678")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "echo:254712345678");

    let res = client
        .get(format!("http://{}/api/payments/status/PAY_001?fresh=1", addr))
        .header("x-booking-id", "BK-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 202);
    assert_eq!(res.headers()["x-upstream"], "payments");
    assert_eq!(res.text().await.unwrap(), "BK-42");

    let res = client
        .post(format!("http://{}/api/payments/cancel", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    let res = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "OK");

    assert_eq!(files.matching("API_REQUEST").len(), 4);
    assert_eq!(files.matching("API_RESPONSE").len(), 3);
    let errors = files.matching("API_ERROR");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("Endpoint: /api/payments/cancel"));
}

#[tokio::test]
async fn unreachable_upstream_answers_502_and_logs_error() {
    // Bind then drop to get a port nobody listens on
    let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream = closed.local_addr().unwrap();
    drop(closed);

    let (logger, files) = memory_logger();
    let state = AppState::new(RequestTracker::new(logger), format!("http://{}", upstream)).unwrap();
    let addr = spawn_app(crate::routing::router::create_router(state)).await;

    let res = Client::new()
        .post(format!("http://{}/api/payments/mpesa", addr))
        .header("user-agent", "paylog-test/1.0")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 502);
    assert_eq!(res.text().await.unwrap(), "Upstream request failed");

    let errors: Vec<_> = files
        .records()
        .into_iter()
        .filter(|r| r.category == LogCategory::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.starts_with("ERROR | Message: "));
    assert!(errors[0].message.contains(r#""route_path":"/api/payments/mpesa""#));
    assert!(errors[0].message.contains(r#""user_agent":"paylog-test/1.0""#));

    let api_errors = files.matching("API_ERROR");
    assert_eq!(api_errors.len(), 1);
    assert!(api_errors[0].message.ends_with("| Error: HTTP 502 | Status: 502"));
}

#[tokio::test]
async fn serve_stops_on_shutdown() {
    let (logger, _files) = memory_logger();
    let state = AppState::new(RequestTracker::new(logger), "http://127.0.0.1:9").unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownCoordinator::new();

    let handle = tokio::spawn(serve(listener, state, shutdown.clone()));

    let res = Client::new()
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    shutdown.initiate_shutdown();
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
