//! Integration tests against a canned local HTTP responder.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use knowton_core::types::{ContentCategory, ContentMetadata};
use knowton_ext_http::HttpValuationOracle;
use knowton_traits::{TraitError, ValuationOracle, ValuationRequest};
use rust_decimal_macros::dec;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serves one connection with `status` and `body`; yields the raw request.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (format!("http://{addr}"), handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn request() -> ValuationRequest {
    ValuationRequest::new(
        42,
        ContentMetadata {
            category: ContentCategory::Artwork,
            creator_address: "0xcreator".into(),
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            views: 1_000,
            likes: 20,
            tags: vec!["generative".into()],
            content_hash: "QmArt".into(),
        },
    )
}

#[tokio::test]
async fn test_valuation_round_trip() {
    let (base, server) = serve_once(
        "200 OK",
        r#"{"estimated_value": 3200.0, "confidence_interval": [2800.0, 3600.0], "factors": {"quality": 0.9}}"#,
    )
    .await;

    let oracle = HttpValuationOracle::new(base, Duration::from_secs(5)).unwrap();
    let estimate = oracle.valuate(&request()).await.unwrap();
    assert_eq!(estimate.estimated_value, dec!(3200));
    assert!((estimate.confidence() - 0.75).abs() < 1e-9);

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /api/v1/oracle/valuation "));
    assert!(raw.contains(r#""token_id":42"#));
    assert!(raw.contains(r#""category":"artwork""#));
    assert!(!raw.contains("historical_data"));
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let (base, server) = serve_once("503 Service Unavailable", r#"{"detail":"model loading"}"#).await;

    let oracle = HttpValuationOracle::new(base, Duration::from_secs(5)).unwrap();
    let err = oracle.valuate(&request()).await.unwrap_err();
    assert!(matches!(err, TraitError::ConnectionFailed(ref msg) if msg.contains("model loading")));
    assert!(err.is_retryable());
    server.await.unwrap();
}

#[tokio::test]
async fn test_health_check() {
    let (base, server) = serve_once("200 OK", r#"{"status":"healthy"}"#).await;

    let oracle = HttpValuationOracle::new(base, Duration::from_secs(5)).unwrap();
    oracle.health_check().await.unwrap();
    assert!(server.await.unwrap().starts_with("GET /health "));
}

#[tokio::test]
async fn test_unreachable_oracle() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let oracle = HttpValuationOracle::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let err = oracle.health_check().await.unwrap_err();
    assert!(err.is_retryable(), "unexpected error: {err:?}");
}
