#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use meme_service::config::{LimitsConfig, MemeConfig, ModelConfig, OpenAiSettings};
use meme_service::services::codec::encode_base64;
use meme_service::services::providers::mock::MockGateway;
use meme_service::services::MemeOrchestrator;
use meme_service::startup::{build_router, AppState};
use secrecy::Secret;
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const BOUNDARY: &str = "meme-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub gateway: Arc<MockGateway>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_gateway(MockGateway::new())
    }

    pub fn with_gateway(gateway: MockGateway) -> Self {
        let gateway = Arc::new(gateway);
        let orchestrator =
            MemeOrchestrator::new(gateway.clone(), gateway.clone(), LimitsConfig::default());
        let router = build_router(AppState::new(orchestrator));
        Self { router, gateway }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: impl Into<Body>) -> (StatusCode, Vec<u8>) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
                .unwrap(),
        )
        .await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        field: &str,
        data: &[u8],
    ) -> (StatusCode, Vec<u8>) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(field, data)))
                .unwrap(),
        )
        .await
    }
}

/// Single-file multipart body.
pub fn multipart_body(field: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"upload.png\"\r\n",
            field
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 120, 200])));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

pub fn png_base64() -> String {
    encode_base64(&png_bytes(24, 16))
}

pub fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

/// Configuration for a server bound to a random local port.
pub fn test_config() -> MemeConfig {
    MemeConfig {
        common: service_core::config::Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..Default::default()
        },
        openai: OpenAiSettings {
            api_key: Secret::new("test-key".to_string()),
            base_url: "http://127.0.0.1:9".to_string(),
        },
        models: ModelConfig {
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            variation_model: "dall-e-2".to_string(),
            variation_size: "1024x1024".to_string(),
            vision_model: "gpt-4o-mini".to_string(),
            text_model: "gpt-4o-mini".to_string(),
        },
        limits: LimitsConfig::default(),
    }
}
