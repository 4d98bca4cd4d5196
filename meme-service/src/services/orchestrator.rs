//! Request orchestration: validated input in, gateway calls, assembled results out.
//!
//! Every gateway call goes through `timed`, which applies the configured timeout and
//! records latency and error metrics. Batch items are isolated from each other: a bad
//! payload or a failed analysis only turns its own entry into an error.

use crate::config::LimitsConfig;
use crate::error::{ApiError, EncodingError, Operation, MAX_BATCH_SIZE};
use crate::models::{
    AnalysisParams, AnalysisResult, GenerationRequest, ImageBatch, ImagePayload, SentimentQuery,
};
use crate::services::codec::{decode_base64, prepare_image, TransportFormat};
use crate::services::metrics;
use crate::services::providers::{
    GatewayError, ImageArtifact, ImageGenerationService, SentimentOutcome, VisionAnalysisService,
};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-item message for a failed analysis.
const ANALYSIS_FAILED: &str = "Image analysis failed";
const ANALYSIS_TIMED_OUT: &str = "Image analysis timed out";

#[derive(Clone)]
pub struct MemeOrchestrator {
    images: Arc<dyn ImageGenerationService>,
    vision: Arc<dyn VisionAnalysisService>,
    limits: LimitsConfig,
    timeout: Duration,
}

impl MemeOrchestrator {
    pub fn new(
        images: Arc<dyn ImageGenerationService>,
        vision: Arc<dyn VisionAnalysisService>,
        limits: LimitsConfig,
    ) -> Self {
        let timeout = limits.gateway_timeout();
        Self {
            images,
            vision,
            limits,
            timeout,
        }
    }

    /// Override the per-call gateway timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Readiness of both gateways; configuration-only, no upstream traffic.
    pub async fn check_gateways(&self) -> Result<(), GatewayError> {
        self.images.health_check().await?;
        self.vision.health_check().await
    }

    #[tracing::instrument(skip(self, request), fields(description_len = request.description.len()))]
    pub async fn generate_meme(
        &self,
        request: &GenerationRequest,
    ) -> Result<ImageArtifact, ApiError> {
        let artifact = self
            .timed(
                Operation::GenerateImage,
                self.images.generate_image(&request.description),
            )
            .await
            .map_err(|e| ApiError::gateway(Operation::GenerateImage, e))?;

        tracing::info!(bytes = artifact.bytes.len(), "Meme generated");
        Ok(artifact)
    }

    /// Variation of an uploaded image, normalized to a square PNG first.
    #[tracing::instrument(skip(self, upload), fields(upload_bytes = upload.len()))]
    pub async fn regenerate_from_image(&self, upload: Vec<u8>) -> Result<ImageArtifact, ApiError> {
        let source = self
            .prepare(ImagePayload::Bytes(upload), TransportFormat::Png)
            .await?;

        let artifact = self
            .timed(
                Operation::CreateVariation,
                self.images.create_variation(&source),
            )
            .await
            .map_err(|e| ApiError::gateway(Operation::CreateVariation, e))?;

        tracing::info!(bytes = artifact.bytes.len(), "Variation generated");
        Ok(artifact)
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn regenerate_from_description(
        &self,
        request: &GenerationRequest,
    ) -> Result<ImageArtifact, ApiError> {
        self.generate_meme(request).await
    }

    /// Sentiment of a message, or the subset of the candidate pool it relates to.
    #[tracing::instrument(
        skip(self, query),
        fields(candidates = query.candidate_tags.as_ref().map(Vec::len))
    )]
    pub async fn analyze_sentiment(
        &self,
        query: &SentimentQuery,
    ) -> Result<SentimentOutcome, ApiError> {
        let pool = query.candidate_tags.as_deref();

        let outcome = self
            .timed(
                Operation::ClassifySentiment,
                self.vision.classify_sentiment(&query.message, pool),
            )
            .await
            .map_err(|e| ApiError::gateway(Operation::ClassifySentiment, e))?;

        Ok(match (outcome, pool) {
            (SentimentOutcome::RelevantTags(tags), Some(pool)) => {
                SentimentOutcome::RelevantTags(filter_to_pool(tags, pool))
            }
            (outcome, _) => outcome,
        })
    }

    /// Analyze every image of a batch, one result per item in input order.
    ///
    /// All payloads are decoded before any gateway call. When none of them decodes the
    /// whole request fails with the first item's error.
    #[tracing::instrument(skip(self, batch), fields(batch_size = batch.len()))]
    pub async fn analyze_batch(
        &self,
        batch: ImageBatch,
        params: AnalysisParams,
    ) -> Result<Vec<AnalysisResult>, ApiError> {
        let prepared: Vec<(Option<String>, Result<ImageArtifact, EncodingError>)> =
            stream::iter(batch.into_items())
                .map(|item| async move {
                    let artifact = self.prepare(item.payload, TransportFormat::Jpeg).await;
                    (item.id, artifact)
                })
                .buffered(MAX_BATCH_SIZE)
                .collect()
                .await;

        if prepared.iter().all(|(_, artifact)| artifact.is_err()) {
            if let Some((_, Err(first))) = prepared.into_iter().next() {
                tracing::warn!(error = %first, "No image in batch could be decoded");
                return Err(first.into());
            }
            return Ok(Vec::new());
        }

        let results: Vec<AnalysisResult> = stream::iter(prepared)
            .map(|(id, artifact)| async move {
                match artifact {
                    Err(e) => {
                        metrics::record_item_failure("decode");
                        tracing::warn!(id = ?id, error = %e, "Skipping undecodable batch item");
                        AnalysisResult::failed(id, e.to_string())
                    }
                    Ok(artifact) => match self.analyze_artifact(&artifact, params).await {
                        Ok((tags, content)) => AnalysisResult::analyzed(id, tags, content),
                        Err(e) => {
                            metrics::record_item_failure("gateway");
                            tracing::error!(
                                id = ?id,
                                error_type = e.kind(),
                                error = %e,
                                "Batch item analysis failed"
                            );
                            AnalysisResult::failed(id, item_error_message(&e))
                        }
                    },
                }
            })
            .buffered(MAX_BATCH_SIZE)
            .collect()
            .await;

        tracing::info!(
            items = results.len(),
            failed = results.iter().filter(|r| r.is_failed()).count(),
            "Batch analysis complete"
        );
        Ok(results)
    }

    /// Analyze one uploaded image. Decode failures are 400, gateway failures 500.
    #[tracing::instrument(skip(self, upload), fields(upload_bytes = upload.len()))]
    pub async fn analyze_single(
        &self,
        upload: Vec<u8>,
        params: AnalysisParams,
    ) -> Result<AnalysisResult, ApiError> {
        let artifact = self
            .prepare(ImagePayload::Bytes(upload), TransportFormat::Jpeg)
            .await?;

        let (tags, content) = self
            .analyze_artifact(&artifact, params)
            .await
            .map_err(|e| ApiError::gateway(Operation::AnalyzeImage, e))?;

        Ok(AnalysisResult::analyzed(None, tags, content))
    }

    async fn analyze_artifact(
        &self,
        artifact: &ImageArtifact,
        params: AnalysisParams,
    ) -> Result<(Vec<String>, String), GatewayError> {
        let (tags, content) = tokio::join!(
            self.timed(
                Operation::AnalyzeImage,
                self.vision.extract_tags(artifact, params.num_tags),
            ),
            self.timed(
                Operation::AnalyzeImage,
                self.vision.extract_content(artifact, params.content_length),
            ),
        );

        Ok((normalize_tags(tags?, params.num_tags), content?.trim().to_string()))
    }

    /// Decode and normalize a payload off the async runtime.
    async fn prepare(
        &self,
        payload: ImagePayload,
        format: TransportFormat,
    ) -> Result<ImageArtifact, EncodingError> {
        let size = self.limits.normalize_size;

        let bytes = tokio::task::spawn_blocking(move || {
            let raw = match payload {
                ImagePayload::Base64(encoded) => decode_base64(&encoded)?,
                ImagePayload::Bytes(bytes) => bytes,
            };
            prepare_image(&raw, size, format)
        })
        .await
        .map_err(|e| EncodingError::InvalidImage(e.to_string()))??;

        Ok(ImageArtifact::new(bytes, format.mime_type()))
    }

    async fn timed<T, F>(&self, operation: Operation, call: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        let start = Instant::now();

        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.timeout)),
        };

        metrics::record_gateway_latency(operation.as_str(), start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            metrics::record_gateway_error(operation.as_str(), e.kind());
        }

        result
    }
}

/// Trim, drop empties, keep at most `limit`.
pub fn normalize_tags(raw: Vec<String>, limit: usize) -> Vec<String> {
    raw.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .take(limit)
        .collect()
}

/// Keep tags that appear in `pool` (case-insensitive), spelled as in the pool, once each.
pub fn filter_to_pool(tags: Vec<String>, pool: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    for tag in tags {
        let wanted = tag.trim().to_lowercase();
        if let Some(candidate) = pool.iter().find(|c| c.to_lowercase() == wanted) {
            if !kept.contains(candidate) {
                kept.push(candidate.clone());
            }
        }
    }
    kept
}

fn item_error_message(error: &GatewayError) -> &'static str {
    match error {
        GatewayError::Timeout(_) => ANALYSIS_TIMED_OUT,
        _ => ANALYSIS_FAILED,
    }
}
