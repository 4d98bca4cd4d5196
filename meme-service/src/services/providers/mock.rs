//! Mock gateway for testing.
//!
//! Counts every call so tests can assert that rejected requests never reached the
//! gateway.

use super::{
    GatewayError, ImageArtifact, ImageGenerationService, SentimentOutcome, VisionAnalysisService,
};
use crate::services::codec::{encode_image, TransportFormat};
use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Tag returned by tag matching that was never a candidate.
pub const MOCK_STRAY_TAG: &str = "not-a-candidate";

/// Snapshot of how often each gateway operation ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub generate_image: usize,
    pub create_variation: usize,
    pub extract_tags: usize,
    pub extract_content: usize,
    pub classify_sentiment: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.generate_image
            + self.create_variation
            + self.extract_tags
            + self.extract_content
            + self.classify_sentiment
    }
}

#[derive(Default)]
struct Counters {
    generate_image: AtomicUsize,
    create_variation: AtomicUsize,
    extract_tags: AtomicUsize,
    extract_content: AtomicUsize,
    classify_sentiment: AtomicUsize,
}

/// Mock image and vision gateway.
pub struct MockGateway {
    enabled: bool,
    failure: Option<GatewayError>,
    content_failure: Option<GatewayError>,
    delay: Option<Duration>,
    first_tags_delay: Option<Duration>,
    raw_tag_count: usize,
    counters: Counters,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            enabled: true,
            failure: None,
            content_failure: None,
            delay: None,
            first_tags_delay: None,
            raw_tag_count: 15,
            counters: Counters::default(),
        }
    }

    /// A gateway whose health check reports it as not configured.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    /// Every operation fails with `error`.
    pub fn failing(mut self, error: GatewayError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Only `extract_content` fails with `error`.
    pub fn failing_content(mut self, error: GatewayError) -> Self {
        self.content_failure = Some(error);
        self
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Sleep only in the first `extract_tags` call, so one image of a batch stalls.
    pub fn with_first_tags_delay(mut self, delay: Duration) -> Self {
        self.first_tags_delay = Some(delay);
        self
    }

    /// Number of tags `extract_tags` returns regardless of what was asked.
    pub fn with_raw_tags(mut self, count: usize) -> Self {
        self.raw_tag_count = count;
        self
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            generate_image: self.counters.generate_image.load(Ordering::SeqCst),
            create_variation: self.counters.create_variation.load(Ordering::SeqCst),
            extract_tags: self.counters.extract_tags.load(Ordering::SeqCst),
            extract_content: self.counters.extract_content.load(Ordering::SeqCst),
            classify_sentiment: self.counters.classify_sentiment.load(Ordering::SeqCst),
        }
    }

    /// Count the call and apply the configured delay and failure. Returns the call's
    /// zero-based index.
    async fn enter(&self, counter: &AtomicUsize) -> Result<usize, GatewayError> {
        let index = counter.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(index),
        }
    }

    fn check_enabled(&self) -> Result<(), GatewayError> {
        if self.enabled {
            Ok(())
        } else {
            Err(GatewayError::NotConfigured(
                "Mock gateway not enabled".to_string(),
            ))
        }
    }

    fn sample_png() -> Result<Vec<u8>, GatewayError> {
        let img = RgbImage::from_pixel(8, 8, Rgb([255, 200, 0]));
        encode_image(&DynamicImage::ImageRgb8(img), TransportFormat::Png)
            .map_err(|e| GatewayError::GenerationFailed(e.to_string()))
    }
}

#[async_trait]
impl ImageGenerationService for MockGateway {
    async fn generate_image(&self, _description: &str) -> Result<ImageArtifact, GatewayError> {
        self.enter(&self.counters.generate_image).await?;
        Ok(ImageArtifact::png(Self::sample_png()?))
    }

    async fn create_variation(
        &self,
        _source: &ImageArtifact,
    ) -> Result<ImageArtifact, GatewayError> {
        self.enter(&self.counters.create_variation).await?;
        Ok(ImageArtifact::png(Self::sample_png()?))
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        self.check_enabled()
    }
}

#[async_trait]
impl VisionAnalysisService for MockGateway {
    async fn extract_tags(
        &self,
        _image: &ImageArtifact,
        _num_tags: usize,
    ) -> Result<Vec<String>, GatewayError> {
        let index = self.enter(&self.counters.extract_tags).await?;
        if let (0, Some(delay)) = (index, self.first_tags_delay) {
            tokio::time::sleep(delay).await;
        }
        Ok((0..self.raw_tag_count)
            .map(|i| format!("  tag{}  ", i))
            .collect())
    }

    async fn extract_content(
        &self,
        _image: &ImageArtifact,
        max_len: usize,
    ) -> Result<String, GatewayError> {
        self.enter(&self.counters.extract_content).await?;
        if let Some(err) = &self.content_failure {
            return Err(err.clone());
        }
        Ok(format!("Mock description in {} words", max_len))
    }

    async fn classify_sentiment(
        &self,
        message: &str,
        candidate_tags: Option<&[String]>,
    ) -> Result<SentimentOutcome, GatewayError> {
        self.enter(&self.counters.classify_sentiment).await?;
        match candidate_tags {
            None => Ok(SentimentOutcome::Sentiment(format!(
                "Mock sentiment for: {}",
                message
            ))),
            Some(tags) => {
                let mut relevant: Vec<String> = tags.iter().take(2).cloned().collect();
                relevant.push(MOCK_STRAY_TAG.to_string());
                Ok(SentimentOutcome::RelevantTags(relevant))
            }
        }
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        self.check_enabled()
    }
}
