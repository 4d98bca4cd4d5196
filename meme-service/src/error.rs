//! Request-level error taxonomy and its HTTP mapping.
//!
//! Validation and encoding problems are the caller's fault and answer 400 with a
//! specific message. Gateway failures answer 500 with a generic message; the detail only
//! reaches the logs.

use crate::services::providers::GatewayError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use service_core::error::error_response;
use thiserror::Error;

/// Maximum number of images accepted in one batch.
pub const MAX_BATCH_SIZE: usize = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{} cannot be empty", capitalize(.0))]
    MissingField(String),

    #[error("Batch size exceeds limit of {limit} images")]
    BatchTooLarge { limit: usize, actual: usize },

    #[error("Invalid value for parameter '{0}'")]
    InvalidParameter(String),

    #[error("Invalid JSON data")]
    MalformedBody,

    #[error("Invalid query string")]
    MalformedQuery,

    #[error("Invalid upload: {0}")]
    MalformedUpload(String),

    #[error("Request body too large")]
    PayloadTooLarge,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Invalid base64 image data: {0}")]
    InvalidEncoding(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

/// Which gateway-backed operation failed; picks the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GenerateImage,
    CreateVariation,
    AnalyzeImage,
    ClassifySentiment,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::GenerateImage => "generate_image",
            Operation::CreateVariation => "create_variation",
            Operation::AnalyzeImage => "analyze_image",
            Operation::ClassifySentiment => "classify_sentiment",
        }
    }

    fn public_message(self) -> &'static str {
        match self {
            Operation::GenerateImage | Operation::CreateVariation => "Image generation failed",
            Operation::AnalyzeImage => "Image analysis failed",
            Operation::ClassifySentiment => "Internal server error",
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("{} failed: {source}", .operation.as_str())]
    Gateway {
        operation: Operation,
        #[source]
        source: GatewayError,
    },
}

impl ApiError {
    pub fn gateway(operation: Operation, source: GatewayError) -> Self {
        ApiError::Gateway { operation, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(ValidationError::PayloadTooLarge) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Validation(_) | ApiError::Encoding(_) => StatusCode::BAD_REQUEST,
            ApiError::Gateway { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Validation(err) => err.to_string(),
            ApiError::Encoding(err) => err.to_string(),
            ApiError::Gateway { operation, .. } => operation.public_message().to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Gateway { operation, source } = &self {
            tracing::error!(
                operation = operation.as_str(),
                error_type = source.kind(),
                error = %source,
                "Gateway call failed"
            );
        }

        error_response(self.status(), self.public_message())
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_message_is_capitalized() {
        let err = ValidationError::MissingField("message".to_string());
        assert_eq!(err.to_string(), "Message cannot be empty");
    }

    #[test]
    fn batch_too_large_message_is_fixed() {
        let err = ValidationError::BatchTooLarge {
            limit: MAX_BATCH_SIZE,
            actual: 11,
        };
        assert_eq!(err.to_string(), "Batch size exceeds limit of 10 images");
    }

    #[test]
    fn gateway_errors_hide_upstream_detail() {
        let err = ApiError::gateway(
            Operation::ClassifySentiment,
            GatewayError::AuthenticationFailed("sk-... rejected".to_string()),
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn client_errors_are_bad_request() {
        let err: ApiError = ValidationError::MalformedBody.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "Invalid JSON data");

        let err: ApiError = EncodingError::InvalidImage("bad".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = ValidationError::PayloadTooLarge.into();
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
