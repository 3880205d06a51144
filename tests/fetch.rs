//! Handler-level tests for /fetch against a mock upstream.
//!
//! The router is driven with `tower::ServiceExt::oneshot`; upstream playlists
//! are served by wiremock on 127.0.0.1, so the classifier is pointed at the
//! mock server's address.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use crest::{
    config::ProxyConfig,
    server::{create_router, handlers::REWRITTEN_HEADER, signature::SigningKey},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const MPEGURL: &str = "application/vnd.apple.mpegurl";

const MASTER: &str = "#EXTM3U
#EXT-X-VERSION:6
#EXT-X-INDEPENDENT-SEGMENTS
#EXT-X-STREAM-INF:BANDWIDTH=288000,RESOLUTION=480x270,CODECS=\"avc1.4d001e\"
/pl/avc1/480x270/low.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2176000,RESOLUTION=1280x720,CODECS=\"avc1.640020\"
/pl/avc1/1280x720/high.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=832000,RESOLUTION=640x360,CODECS=\"avc1.4d001f\"
/pl/avc1/640x360/mid.m3u8
";

const REWRITTEN: &str = "#EXTM3U
#EXT-X-VERSION:6
#EXT-X-INDEPENDENT-SEGMENTS
#EXT-X-STREAM-INF:BANDWIDTH=2176000,RESOLUTION=1280x720,CODECS=\"avc1.640020\"
/pl/avc1/1280x720/high.m3u8";

const MEDIA: &str = "#EXTM3U
#EXT-X-VERSION:6
#EXT-X-TARGETDURATION:3
#EXT-X-MEDIA-SEQUENCE:0
#EXT-X-STREAM-INF:BANDWIDTH=1 appears in a stray line
#EXTINF:3.000,
/seg/0.m4s
#EXT-X-ENDLIST
";

fn test_config(server: &MockServer) -> ProxyConfig {
    ProxyConfig {
        playlist_host: server.address().to_string(),
        allow_http: true,
        ..ProxyConfig::default()
    }
}

async fn upstream() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pl/master.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(MASTER, MPEGURL))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pl/avc1/640x360/mid.m3u8"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(MEDIA, MPEGURL))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pl/gone.m3u8"))
        .respond_with(ResponseTemplate::new(410).set_body_raw(MASTER, MPEGURL))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/master.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(MASTER, "text/plain"))
        .mount(&server)
        .await;

    server
}

fn fetch_request(target: &str, extra: &str) -> Request<Body> {
    let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
    Request::builder()
        .uri(format!("/fetch?url={encoded}{extra}"))
        .body(Body::empty())
        .unwrap()
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn tracked_requests(app: Router) -> u64 {
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    json["tracked_requests"].as_u64().unwrap()
}

// ── Health ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_status_and_version() {
    let app = create_router(&ProxyConfig::default()).unwrap();

    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["tracked_requests"], 0);
}

// ── Rewriting ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn master_playlist_is_reduced_to_best_variant() {
    let server = upstream().await;
    let app = create_router(&test_config(&server)).unwrap();

    let target = format!("{}/pl/master.m3u8", server.uri());
    let resp = app.clone().oneshot(fetch_request(&target, "")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(REWRITTEN_HEADER).unwrap(), "1");
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), MPEGURL);
    assert_eq!(body_text(resp).await, REWRITTEN);

    assert_eq!(tracked_requests(app).await, 0);
}

#[tokio::test]
async fn media_playlist_passes_through() {
    let server = upstream().await;
    let app = create_router(&test_config(&server)).unwrap();

    let target = format!("{}/pl/avc1/640x360/mid.m3u8", server.uri());
    let resp = app.oneshot(fetch_request(&target, "")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(REWRITTEN_HEADER).is_none());
    assert_eq!(body_text(resp).await, MEDIA);
}

#[tokio::test]
async fn non_playlist_url_is_not_inspected() {
    let server = upstream().await;
    let app = create_router(&test_config(&server)).unwrap();

    let target = format!("{}/master.txt", server.uri());
    let resp = app.oneshot(fetch_request(&target, "")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(REWRITTEN_HEADER).is_none());
    assert_eq!(body_text(resp).await, MASTER);
}

#[tokio::test]
async fn foreign_host_is_not_inspected() {
    let server = upstream().await;
    let app = create_router(&ProxyConfig::default()).unwrap();

    let target = format!("{}/pl/master.m3u8", server.uri());
    let resp = app.oneshot(fetch_request(&target, "")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, MASTER);
}

#[tokio::test]
async fn upstream_status_is_preserved() {
    let server = upstream().await;
    let app = create_router(&test_config(&server)).unwrap();

    let target = format!("{}/pl/missing.m3u8", server.uri());
    let resp = app.oneshot(fetch_request(&target, "")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn error_page_is_never_rewritten() {
    let server = upstream().await;
    let app = create_router(&test_config(&server)).unwrap();

    let target = format!("{}/pl/gone.m3u8", server.uri());
    let resp = app.clone().oneshot(fetch_request(&target, "")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::GONE);
    assert!(resp.headers().get(REWRITTEN_HEADER).is_none());
    assert_eq!(body_text(resp).await, MASTER);
    assert_eq!(tracked_requests(app).await, 0);
}

#[tokio::test]
async fn oversized_body_streams_through_uninspected() {
    let server = upstream().await;
    let config = ProxyConfig {
        max_inspect_bytes: 64,
        ..test_config(&server)
    };
    let app = create_router(&config).unwrap();

    let target = format!("{}/pl/master.m3u8", server.uri());
    let resp = app.clone().oneshot(fetch_request(&target, "")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(REWRITTEN_HEADER).is_none());
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), MPEGURL);
    assert_eq!(body_text(resp).await, MASTER);
    assert_eq!(tracked_requests(app).await, 0);
}

#[tokio::test]
async fn playlist_on_other_port_is_not_inspected() {
    let server = upstream().await;
    let config = ProxyConfig {
        playlist_host: "127.0.0.1:1".to_string(),
        ..test_config(&server)
    };
    let app = create_router(&config).unwrap();

    let target = format!("{}/pl/master.m3u8", server.uri());
    let resp = app.oneshot(fetch_request(&target, "")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get(REWRITTEN_HEADER).is_none());
    assert_eq!(body_text(resp).await, MASTER);
}

// ── Request validation ──────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_target_url_is_rejected() {
    let app = create_router(&ProxyConfig::default()).unwrap();

    let resp = app.oneshot(fetch_request("not a url", "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(json["code"], "INVALID_URL");
}

#[tokio::test]
async fn invalid_header_encoding_is_rejected() {
    let server = upstream().await;
    let app = create_router(&test_config(&server)).unwrap();

    let target = format!("{}/pl/master.m3u8", server.uri());
    let resp = app
        .oneshot(fetch_request(&target, "&h=%25%25%25"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signature_is_enforced_when_configured() {
    let server = upstream().await;
    let key = SigningKey::new(b"integration-secret".to_vec());
    let config = ProxyConfig {
        signing_key: key.clone(),
        ..test_config(&server)
    };
    let app = create_router(&config).unwrap();
    let target = format!("{}/pl/master.m3u8", server.uri());

    let resp = app.clone().oneshot(fetch_request(&target, "")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .clone()
        .oneshot(fetch_request(&target, "&sig=deadbeef"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let sig = key.sign(&target);
    let resp = app
        .oneshot(fetch_request(&target, &format!("&sig={sig}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, REWRITTEN);
}
