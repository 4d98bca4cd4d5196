//! AI gateway abstractions and implementations.
//!
//! The orchestrator only talks to the two capability traits below, so the OpenAI
//! backend and the in-process mock are interchangeable.

pub mod mock;
pub mod openai;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Error type for gateway operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Authentication with AI provider failed: {0}")]
    AuthenticationFailed(String),

    #[error("AI provider call timed out after {0:?}")]
    Timeout(Duration),

    #[error("AI provider unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl GatewayError {
    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::GenerationFailed(_) => "generation_failed",
            GatewayError::AuthenticationFailed(_) => "authentication_failed",
            GatewayError::Timeout(_) => "timeout",
            GatewayError::Unavailable(_) => "unavailable",
            GatewayError::InvalidResponse(_) => "invalid_response",
            GatewayError::NotConfigured(_) => "not_configured",
        }
    }
}

/// A raster image travelling to or from the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageArtifact {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/png")
    }
}

/// Result of a sentiment call: free-text sentiment, or the subset of candidate tags the
/// message relates to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentimentOutcome {
    Sentiment(String),
    RelevantTags(Vec<String>),
}

/// Image generation and variation (e.g., DALL-E).
#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    /// Generate one image from a text description.
    async fn generate_image(&self, description: &str) -> Result<ImageArtifact, GatewayError>;

    /// Create one variation of an existing image.
    async fn create_variation(&self, source: &ImageArtifact)
        -> Result<ImageArtifact, GatewayError>;

    /// Configuration-level readiness check. Does not call the provider.
    async fn health_check(&self) -> Result<(), GatewayError>;
}

/// Vision and text analysis (e.g., GPT-4o).
#[async_trait]
pub trait VisionAnalysisService: Send + Sync {
    /// Descriptive tags for an image. Implementations may return more than `num_tags`;
    /// callers truncate.
    async fn extract_tags(
        &self,
        image: &ImageArtifact,
        num_tags: usize,
    ) -> Result<Vec<String>, GatewayError>;

    /// Free-text description of an image, roughly `max_len` words.
    async fn extract_content(
        &self,
        image: &ImageArtifact,
        max_len: usize,
    ) -> Result<String, GatewayError>;

    /// Sentiment of `message`, or the relevant subset of `candidate_tags` when given.
    async fn classify_sentiment(
        &self,
        message: &str,
        candidate_tags: Option<&[String]>,
    ) -> Result<SentimentOutcome, GatewayError>;

    /// Configuration-level readiness check. Does not call the provider.
    async fn health_check(&self) -> Result<(), GatewayError>;
}
