mod common;

use axum::http::StatusCode;
use common::{json, TestApp};
use meme_service::services::codec::decode_base64;
use meme_service::services::providers::mock::MockGateway;
use meme_service::services::providers::GatewayError;

#[tokio::test]
async fn generate_meme_returns_base64_png() {
    let app = TestApp::new();

    let (status, body) = app
        .get("/generateMeme?description=A%20cat%20wearing%20sunglasses")
        .await;

    assert_eq!(status, StatusCode::OK);
    let image = json(&body)["image"].as_str().unwrap().to_string();
    let bytes = decode_base64(&image).unwrap();
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    assert_eq!(app.gateway.calls().generate_image, 1);
}

#[tokio::test]
async fn blank_description_is_rejected_without_gateway_call() {
    let app = TestApp::new();

    for uri in ["/generateMeme", "/generateMeme?description=", "/generateMeme?description=%20%20"] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json(&body),
            serde_json::json!({"error": "Description cannot be empty"})
        );
    }

    assert_eq!(app.gateway.calls().total(), 0);
}

#[tokio::test]
async fn png_format_returns_raw_image() {
    let app = TestApp::new();

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        axum::http::Request::builder()
            .uri("/generateMeme?description=sunrise&format=png")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
}

#[tokio::test]
async fn unknown_format_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app.get("/generateMeme?description=sunrise&format=gif").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Invalid value for parameter 'format'");
    assert_eq!(app.gateway.calls().total(), 0);
}

#[tokio::test]
async fn generation_failure_is_generic_server_error() {
    let app = TestApp::with_gateway(
        MockGateway::new().failing(GatewayError::GenerationFailed("content policy".to_string())),
    );

    let (status, body) = app.get("/generateMeme?description=sunrise").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json(&body), serde_json::json!({"error": "Image generation failed"}));
}

#[tokio::test]
async fn trailing_slash_is_routed() {
    let app = TestApp::new();

    let (status, _) = app.get("/generateMeme/?description=sunrise").await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn duplicate_query_key_answers_with_json_error() {
    let app = TestApp::new();

    let (status, body) = app.get("/generateMeme?description=a&description=b").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body), serde_json::json!({"error": "Invalid query string"}));
    assert_eq!(app.gateway.calls().total(), 0);
}
