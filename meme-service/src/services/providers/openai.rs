//! OpenAI gateway implementation.
//!
//! Image generation and variations go through the Images API; tags, descriptions and
//! sentiment go through Chat Completions with inline `data:` image parts.

use super::{
    GatewayError, ImageArtifact, ImageGenerationService, SentimentOutcome, VisionAnalysisService,
};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{multipart, Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

/// OpenAI gateway configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Secret<String>,
    pub base_url: String,
    pub image_model: String,
    pub image_size: String,
    pub variation_model: String,
    pub variation_size: String,
    pub vision_model: String,
    pub text_model: String,
    pub request_timeout: Duration,
}

/// Gateway backed by the OpenAI HTTP API.
pub struct OpenAiGateway {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiGateway {
    pub fn new(config: OpenAiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to create HTTP client for OpenAI API, using default client");
                Client::default()
            });

        Self { config, client }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.config.api_key.expose_secret())
    }

    fn ensure_configured(&self) -> Result<(), GatewayError> {
        if self.config.api_key.expose_secret().trim().is_empty() {
            return Err(GatewayError::NotConfigured(
                "OpenAI API key not configured".to_string(),
            ));
        }
        Ok(())
    }

    fn transport_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(self.config.request_timeout)
        } else {
            GatewayError::Unavailable(err.to_string())
        }
    }

    /// Send a prepared request and map non-success statuses onto gateway errors.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        on_rejected: fn(String) -> GatewayError,
    ) -> Result<reqwest::Response, GatewayError> {
        let response = request
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_to_error(status, &body, on_rejected))
    }

    /// Decode the first `b64_json` entry of an Images API response.
    async fn read_image(&self, response: reqwest::Response) -> Result<ImageArtifact, GatewayError> {
        let payload: ImagesResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let encoded = payload
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or_else(|| GatewayError::InvalidResponse("No image in response".to_string()))?;

        let bytes = general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| GatewayError::InvalidResponse(format!("Image payload is not base64: {}", e)))?;

        Ok(ImageArtifact::png(bytes))
    }

    /// Run a chat completion and return the trimmed text of the first choice.
    async fn chat(
        &self,
        model: &str,
        messages: serde_json::Value,
        max_tokens: Option<u32>,
    ) -> Result<String, GatewayError> {
        self.ensure_configured()?;

        let request = ChatCompletionRequest {
            model,
            messages,
            max_tokens,
        };

        tracing::debug!(model = %model, "Sending chat completion request to OpenAI API");

        let response = self
            .send(
                self.client.post(self.api_url("chat/completions")).json(&request),
                GatewayError::InvalidResponse,
            )
            .await?;

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| GatewayError::InvalidResponse("No content in response".to_string()))
    }

    /// Single user turn carrying a text prompt and one inline image.
    fn vision_messages(prompt: String, image: &ImageArtifact) -> serde_json::Value {
        let data_url = format!(
            "data:{};base64,{}",
            image.mime_type,
            general_purpose::STANDARD.encode(&image.bytes)
        );

        json!([
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            }
        ])
    }
}

#[async_trait]
impl ImageGenerationService for OpenAiGateway {
    async fn generate_image(&self, description: &str) -> Result<ImageArtifact, GatewayError> {
        self.ensure_configured()?;

        let request = ImageGenerationRequest {
            model: &self.config.image_model,
            prompt: description,
            n: 1,
            size: &self.config.image_size,
            response_format: "b64_json",
        };

        tracing::debug!(
            model = %self.config.image_model,
            prompt_len = description.len(),
            "Sending image generation request to OpenAI API"
        );

        let response = self
            .send(
                self.client.post(self.api_url("images/generations")).json(&request),
                GatewayError::GenerationFailed,
            )
            .await?;

        self.read_image(response).await
    }

    async fn create_variation(
        &self,
        source: &ImageArtifact,
    ) -> Result<ImageArtifact, GatewayError> {
        self.ensure_configured()?;

        let image_part = multipart::Part::bytes(source.bytes.clone())
            .file_name("image.png")
            .mime_str(&source.mime_type)
            .map_err(|e| GatewayError::GenerationFailed(format!("Invalid image part: {}", e)))?;

        let form = multipart::Form::new()
            .part("image", image_part)
            .text("model", self.config.variation_model.clone())
            .text("n", "1")
            .text("size", self.config.variation_size.clone())
            .text("response_format", "b64_json");

        tracing::debug!(
            model = %self.config.variation_model,
            image_size = source.bytes.len(),
            "Sending image variation request to OpenAI API"
        );

        let response = self
            .send(
                self.client.post(self.api_url("images/variations")).multipart(form),
                GatewayError::GenerationFailed,
            )
            .await?;

        self.read_image(response).await
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        self.ensure_configured()
    }
}

#[async_trait]
impl VisionAnalysisService for OpenAiGateway {
    async fn extract_tags(
        &self,
        image: &ImageArtifact,
        num_tags: usize,
    ) -> Result<Vec<String>, GatewayError> {
        let prompt = format!(
            "Generate {} descriptive tags for this image. Consider the emotion and sentiment \
             of the image as well as its content. If the image contains text or other key \
             information, include a descriptive tag for it. Respond with ONLY the tags as a \
             comma separated list, without brackets.",
            num_tags
        );

        let text = self
            .chat(
                &self.config.vision_model,
                Self::vision_messages(prompt, image),
                None,
            )
            .await?;

        Ok(parse_tag_list(&text))
    }

    async fn extract_content(
        &self,
        image: &ImageArtifact,
        max_len: usize,
    ) -> Result<String, GatewayError> {
        let prompt = format!(
            "Write a {} word description of what is going on in this meme. Analyze its \
             sentiment, and if the image contains any text, include that text in the \
             description.",
            max_len
        );

        self.chat(
            &self.config.vision_model,
            Self::vision_messages(prompt, image),
            None,
        )
        .await
    }

    async fn classify_sentiment(
        &self,
        message: &str,
        candidate_tags: Option<&[String]>,
    ) -> Result<SentimentOutcome, GatewayError> {
        match candidate_tags {
            None => {
                let messages = json!([
                    {
                        "role": "system",
                        "content": "You are an assistant that analyzes sentiment in messages."
                    },
                    {
                        "role": "user",
                        "content": format!(
                            "Analyze the following message based on its content and sentiment, \
                             and give a short description of its sentiment: {}",
                            message
                        )
                    }
                ]);

                let text = self.chat(&self.config.text_model, messages, Some(50)).await?;
                Ok(SentimentOutcome::Sentiment(text))
            }
            Some(tags) => {
                let messages = json!([
                    {
                        "role": "system",
                        "content": "You match chat messages to meme tags."
                    },
                    {
                        "role": "user",
                        "content": format!(
                            "Message: {}\nTags: {}\nRespond with ONLY the tags from the list \
                             that fit the content and sentiment of the message, as a comma \
                             separated list.",
                            message,
                            tags.join(", ")
                        )
                    }
                ]);

                let text = self.chat(&self.config.text_model, messages, None).await?;
                Ok(SentimentOutcome::RelevantTags(parse_tag_list(&text)))
            }
        }
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        self.ensure_configured()
    }
}

/// Map an unsuccessful HTTP status onto a gateway error.
///
/// `on_rejected` builds the error for statuses that are neither auth nor availability
/// problems (typically 400s from content policy or bad parameters).
fn status_to_error(
    status: StatusCode,
    body: &str,
    on_rejected: fn(String) -> GatewayError,
) -> GatewayError {
    let detail = match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => format!("OpenAI API error {}: {}", status, envelope.error.message),
        Err(_) => format!("OpenAI API error {}: {}", status, body),
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GatewayError::AuthenticationFailed(detail)
        }
        StatusCode::TOO_MANY_REQUESTS => GatewayError::Unavailable(detail),
        s if s.is_server_error() => GatewayError::Unavailable(detail),
        _ => on_rejected(detail),
    }
}

/// Split a comma or newline separated model reply into clean tags.
pub(crate) fn parse_tag_list(text: &str) -> Vec<String> {
    text.split([',', '\n'])
        .map(|t| t.trim().trim_matches(|c: char| c == '"' || c == '\'' || c == '#').trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// OpenAI API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    b64_json: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
