//! Tests for the TLS web app and its redirect listener

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::server::{build_rustls_config, shutdown_channel, tls::generate_self_signed};
use axum::http::Uri;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Serve the app router over plain HTTP so API behaviour can be tested
/// without TLS
async fn start_plain(static_dir: &Path) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(static_dir);
    tokio::spawn(async move { axum::serve(listener, app).await });
    addr
}

fn static_site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>fleetcheck</h1>").unwrap();
    std::fs::write(dir.path().join("app.js"), "console.log('hi');").unwrap();
    dir
}

#[test]
fn test_https_location_swaps_port_and_keeps_path() {
    let uri: Uri = "/docs/page?x=1&y=2".parse().unwrap();

    assert_eq!(
        https_location("example.com:8000", &uri, 8443).as_deref(),
        Some("https://example.com:8443/docs/page?x=1&y=2")
    );
    assert_eq!(
        https_location("example.com", &uri, 443).as_deref(),
        Some("https://example.com/docs/page?x=1&y=2")
    );
    assert_eq!(
        https_location("10.1.2.3:8000", &"/".parse().unwrap(), 8443).as_deref(),
        Some("https://10.1.2.3:8443/")
    );
}

#[test]
fn test_https_location_rejects_bad_host() {
    let uri: Uri = "/".parse().unwrap();

    assert_eq!(https_location("", &uri, 8443), None);
    assert_eq!(https_location("bad host", &uri, 8443), None);
}

#[test]
fn test_https_location_rejects_userinfo() {
    let uri: Uri = "/a?b=1".parse().unwrap();

    assert_eq!(https_location("user@evil.com:8000", &uri, 8443), None);
    assert_eq!(https_location("user:pw@localhost", &uri, 8443), None);
    assert_eq!(
        https_location("localhost:8000", &uri, 8443).as_deref(),
        Some("https://localhost:8443/a?b=1")
    );
}

#[tokio::test]
async fn test_redirect_listener_sends_302_to_https() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (_controller, signal) = shutdown_channel();
    tokio::spawn(async move { serve_redirect(listener, 8443, signal).await });

    for method in [reqwest::Method::GET, reqwest::Method::POST] {
        let response = client()
            .request(method, format!("http://{}/api/sample?verbose=1", addr))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 302);
        assert_eq!(
            response.headers()["location"],
            "https://127.0.0.1:8443/api/sample?verbose=1"
        );
    }
}

#[tokio::test]
async fn test_api_health_and_sample() {
    let site = static_site();
    let addr = start_plain(site.path()).await;

    let health: Value = client()
        .get(format!("http://{}/api/health", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"status": "healthy"}));

    let sample: Value = client()
        .get(format!("http://{}/api/sample", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(sample["message"], SAMPLE_MESSAGE);
    let timestamp = sample["timestamp"].as_str().unwrap();
    assert!(timestamp.ends_with('Z'), "UTC timestamp: {}", timestamp);
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn test_api_post_echoes_body() {
    let site = static_site();
    let addr = start_plain(site.path()).await;
    let payload = json!({"name": "fleet", "count": 5});

    let response = client()
        .post(format!("http://{}/api", addr))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.json::<Value>().await.unwrap(), payload);

    let bad = client()
        .post(format!("http://{}/api", addr))
        .body("nope")
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), 400);
}

#[tokio::test]
async fn test_static_files_served_as_fallback() {
    let site = static_site();
    let addr = start_plain(site.path()).await;

    let index = client()
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(index.status(), 200);
    assert_eq!(index.text().await.unwrap(), "<h1>fleetcheck</h1>");

    let script = client()
        .get(format!("http://{}/app.js", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(script.status(), 200);

    let missing = client()
        .get(format!("http://{}/missing.css", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_https_listener_serves_api_over_tls() {
    let site = static_site();
    let tls = build_rustls_config(&generate_self_signed(&[]).unwrap()).unwrap();
    let handle = Handle::new();
    let (controller, signal) = shutdown_channel();

    let server = tokio::spawn(serve_https(
        SocketAddr::from(([127, 0, 0, 1], 0)),
        build_router(site.path()),
        tls,
        handle.clone(),
        signal,
    ));
    let addr = handle.listening().await.expect("HTTPS server should bind");

    let tls_client = reqwest::Client::builder()
        .no_proxy()
        .danger_accept_invalid_certs(true)
        .resolve("localhost", addr)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let response = tls_client
        .get(format!("https://localhost:{}/api/health", addr.port()))
        .send()
        .await
        .expect("TLS request should succeed");

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({"status": "healthy"})
    );

    drop(tls_client);
    controller.shutdown();
    let result = tokio::time::timeout(Duration::from_secs(15), server).await;
    assert!(matches!(result, Ok(Ok(Ok(())))));
}

#[tokio::test]
async fn test_https_bind_failure_reports_no_listener() {
    let site = static_site();
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = occupied.local_addr().unwrap();
    let tls = build_rustls_config(&generate_self_signed(&[]).unwrap()).unwrap();
    let handle = Handle::new();
    let (_controller, signal) = shutdown_channel();

    let app = build_router(site.path());
    let (listening, served) = tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(
            handle.listening(),
            serve_https(addr, app, tls, handle.clone(), signal)
        )
    })
    .await
    .expect("bind failure should resolve promptly");

    assert_eq!(listening, None);
    assert_eq!(served.unwrap_err().kind(), std::io::ErrorKind::AddrInUse);
    drop(occupied);
}
