use super::*;
use crate::downloader::test_helpers::{MockExtractor, MockOutcome};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;


/// Helper to create a test VideoDownloader around a scripted extractor
fn create_test_downloader(
    extractor: MockExtractor,
) -> (Arc<VideoDownloader>, tempfile::TempDir) {
    crate::downloader::test_helpers::create_test_downloader(Arc::new(extractor))
}

/// Router over a downloader whose extractor succeeds with `title`
fn test_app(title: &str) -> (Router, Arc<VideoDownloader>, tempfile::TempDir) {
    let (downloader, temp_dir) = create_test_downloader(MockExtractor::succeeding(title));
    let config = downloader.get_config();
    (create_router(downloader.clone(), config), downloader, temp_dir)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_serve_until_stops_on_shutdown_signal() {
    let (downloader, _temp_dir) = create_test_downloader(MockExtractor::new(MockOutcome::Block));

    let mut config = (*downloader.get_config()).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(serve_until(downloader, config, async {
        let _ = rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(50)).await;
    tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let (downloader, _temp_dir) = create_test_downloader(MockExtractor::new(MockOutcome::Block));

    // Occupy a port so the server cannot bind it
    let blocker = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = (*downloader.get_config()).clone();
    config.server.api.bind_address = blocker.local_addr().unwrap();

    let result = start_api_server(downloader, Arc::new(config)).await;
    assert!(matches!(result, Err(crate::Error::Io(_))));
}

#[tokio::test]
async fn test_server_responds_over_tcp() {
    let (app, _downloader, _temp_dir) = test_app("Clip");

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();

    assert!(raw.starts_with("HTTP/1.1 200"), "unexpected response: {raw}");
    assert!(raw.contains(r#""status":"ok""#));

    server.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let (downloader, _temp_dir) = create_test_downloader(MockExtractor::succeeding("x"));

    let mut config = (*downloader.get_config()).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let app = create_router(downloader, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let (downloader, _temp_dir) = create_test_downloader(MockExtractor::succeeding("x"));

    let mut config = (*downloader.get_config()).clone();
    config.server.api.cors_origins = vec!["http://allowed.example".to_string()];
    let app = create_router(downloader, Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://allowed.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://allowed.example"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (downloader, _temp_dir) = create_test_downloader(MockExtractor::succeeding("x"));

    let mut config = (*downloader.get_config()).clone();
    config.server.api.cors_enabled = false;
    let app = create_router(downloader, Arc::new(config));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be absent when CORS is disabled"
    );
}

#[test]
fn test_build_cors_layer_skips_invalid_origins() {
    // Must not panic on an origin that is not a valid header value
    let _layer = build_cors_layer(&["http://ok.example".into(), "bad\norigin".into()]);
}
