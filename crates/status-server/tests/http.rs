use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use chrono::Local;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;

use livecap_capture_engine::{
    CaptureConfig, CaptureScheduler, PersistencePolicy, RawCapture, SchedulerState,
    ScreenshotStore, SyntheticBackend,
};
use livecap_common::config::ServerConfig;
use livecap_platform_core::CaptureMode;
use livecap_status_server::StatusServer;

fn server_with(backend: Arc<SyntheticBackend>) -> StatusServer {
    let scheduler = CaptureScheduler::new(backend, Arc::new(ScreenshotStore::new()));
    StatusServer::new(Arc::new(scheduler), ServerConfig::default())
}

fn idle_server() -> StatusServer {
    server_with(Arc::new(SyntheticBackend::new()))
}

async fn send(server: &StatusServer, method: Method, uri: &str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    server.router().oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn publish(store: &ScreenshotStore, dir: &Path, png: &'static [u8], width: u32, height: u32) {
    let policy = PersistencePolicy::new(dir, true, CaptureMode::FullScreen);
    store
        .publish(RawCapture::from_png(png, width, height), Local::now(), &policy)
        .unwrap();
}

fn store_of(server: &StatusServer) -> Arc<ScreenshotStore> {
    Arc::clone(&server.state().store)
}

fn server_scheduler(server: &StatusServer) -> Arc<CaptureScheduler> {
    Arc::clone(&server.state().scheduler)
}

#[tokio::test]
async fn endpoints_report_missing_screenshot_as_404() {
    let server = idle_server();

    for uri in ["/screenshot", "/metadata"] {
        let response = send(&server, Method::GET, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "No screenshot available." })
        );
    }
}

#[tokio::test]
async fn screenshot_serves_latest_png_and_ignores_query() {
    let dir = tempfile::tempdir().unwrap();
    let server = idle_server();
    let store = store_of(&server);
    publish(&store, dir.path(), b"first-png", 4, 3);
    publish(&store, dir.path(), b"second-png", 8, 6);

    let response = send(&server, Method::GET, "/screenshot?timestamp=1718000000000").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    assert_eq!(response.headers()["x-capture-sequence"], "2");
    assert_eq!(body_bytes(response).await, b"second-png");
}

#[tokio::test]
async fn metadata_describes_the_current_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let server = idle_server();
    let store = store_of(&server);
    publish(&store, dir.path(), b"png", 1920, 1080);

    let response = send(&server, Method::GET, "/metadata").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["width"], 1920);
    assert_eq!(json["height"], 1080);
    assert_eq!(json["dimensions"], "1920x1080");
    assert_eq!(json["sequence"], 1);
    let timestamp = json["timestamp"].as_str().unwrap();
    assert_eq!(timestamp.len(), "2026-10-19 14:25:01.123".len());
}

#[tokio::test]
async fn status_follows_the_scheduler() {
    let dir = tempfile::tempdir().unwrap();
    let server = idle_server();
    let scheduler = server_scheduler(&server);

    let json = body_json(send(&server, Method::GET, "/status").await).await;
    assert_eq!(json, serde_json::json!({ "status": "idle" }));

    let config = CaptureConfig::new(
        CaptureMode::FullScreen,
        None,
        dir.path(),
        true,
        Duration::from_millis(50),
    )
    .unwrap();
    scheduler.start(config).await.unwrap();
    let json = body_json(send(&server, Method::GET, "/status").await).await;
    assert_eq!(json["status"], "running");

    scheduler.stop().await;
    let json = body_json(send(&server, Method::GET, "/status").await).await;
    assert_eq!(json["status"], "idle");
}

#[tokio::test]
async fn viewer_refreshes_at_the_capture_interval() {
    let dir = tempfile::tempdir().unwrap();
    let server = idle_server();

    let response = send(&server, Method::GET, "/viewer").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("setInterval(refreshImage, 3000);"));

    let config = CaptureConfig::new(
        CaptureMode::FullScreen,
        None,
        dir.path(),
        true,
        Duration::from_millis(1500),
    )
    .unwrap();
    server_scheduler(&server).reconfigure(config).await.unwrap();
    let html = String::from_utf8(body_bytes(send(&server, Method::GET, "/viewer").await).await)
        .unwrap();
    assert!(html.contains("setInterval(refreshImage, 1500);"));
}

#[tokio::test]
async fn shutdown_only_accepts_post() {
    let server = idle_server();
    let handle = server.shutdown_handle();

    let response = send(&server, Method::GET, "/shutdown").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(!handle.is_triggered());

    let response = send(&server, Method::POST, "/shutdown").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "message": "Server shutting down..." })
    );
    assert!(handle.is_triggered());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_lets_the_in_flight_capture_finish() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(SyntheticBackend::new().with_delay(Duration::from_millis(150)));
    let scheduler = Arc::new(CaptureScheduler::new(
        backend.clone(),
        Arc::new(ScreenshotStore::new()),
    ));
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        shutdown_grace_secs: 5.0,
    };
    let server = StatusServer::new(Arc::clone(&scheduler), config);
    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();
    let serving = tokio::spawn(server.serve(listener));

    let capture = CaptureConfig::new(
        CaptureMode::FullScreen,
        None,
        dir.path(),
        true,
        Duration::from_millis(20),
    )
    .unwrap();
    scheduler.start(capture).await.unwrap();
    while backend.grabs_started() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(
            b"POST /shutdown HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await
        .unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8_lossy(&raw);
    assert!(raw.starts_with("HTTP/1.1 200"), "{raw}");
    assert!(raw.contains("Server shutting down..."));

    tokio::time::timeout(Duration::from_secs(5), serving)
        .await
        .expect("server did not exit")
        .unwrap()
        .unwrap();

    assert_eq!(scheduler.state(), SchedulerState::Idle);
    assert_eq!(backend.grabs_finished(), backend.grabs_started());
    assert!(scheduler.store().sequence() >= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reads_during_publishes_never_mix_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let server = idle_server();
    let store = store_of(&server);
    let policy = PersistencePolicy::new(dir.path(), true, CaptureMode::FullScreen);

    // Frame n carries body "frame-n" and dimensions n x (n + 1).
    let frame = |n: u32| RawCapture::from_png(format!("frame-{n}").into_bytes(), n, n + 1);
    store.publish(frame(1), Local::now(), &policy).unwrap();

    let publisher = {
        let store = Arc::clone(&store);
        std::thread::spawn(move || {
            for n in 2..=300 {
                store.publish(frame(n), Local::now(), &policy).unwrap();
            }
        })
    };

    let app = server.router();
    let mut readers = Vec::new();
    for _ in 0..4 {
        let app = app.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..60 {
                let request = Request::get("/screenshot").body(Body::empty()).unwrap();
                let response = app.clone().oneshot(request).await.unwrap();
                let sequence: u64 = response.headers()["x-capture-sequence"]
                    .to_str()
                    .unwrap()
                    .parse()
                    .unwrap();
                assert_eq!(body_bytes(response).await, format!("frame-{sequence}").into_bytes());

                let request = Request::get("/metadata").body(Body::empty()).unwrap();
                let json = body_json(app.clone().oneshot(request).await.unwrap()).await;
                let sequence = json["sequence"].as_u64().unwrap();
                assert_eq!(json["width"].as_u64().unwrap(), sequence);
                assert_eq!(json["height"].as_u64().unwrap(), sequence + 1);
                assert_eq!(json["dimensions"], format!("{}x{}", sequence, sequence + 1));
            }
        }));
    }

    for reader in readers {
        reader.await.unwrap();
    }
    publisher.join().unwrap();
    assert_eq!(store.sequence(), 300);
}
