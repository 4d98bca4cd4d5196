//! Validated request values. Construction goes through `services::validation`.

use crate::error::{ValidationError, MAX_BATCH_SIZE};

/// Non-empty, trimmed description for image generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub description: String,
}

/// How the generated meme is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `{"image": "<base64>"}`
    #[default]
    Json,
    /// Raw `image/png` body.
    Png,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentimentQuery {
    pub message: String,
    /// Candidate tag pool; `Some` selects the tag-matching variant.
    pub candidate_tags: Option<Vec<String>>,
}

/// Bounds for one analysis call, already clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisParams {
    pub num_tags: usize,
    pub content_length: usize,
}

/// Image data as received. Base64 payloads are decoded per item so a bad one only
/// fails its own result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    Base64(String),
    Bytes(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageItem {
    pub id: Option<String>,
    pub payload: ImagePayload,
}

/// Ordered, non-empty sequence of at most `MAX_BATCH_SIZE` images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBatch {
    items: Vec<ImageItem>,
}

impl ImageBatch {
    pub fn new(items: Vec<ImageItem>) -> Result<Self, ValidationError> {
        check_batch_len(items.len())?;
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<ImageItem> {
        self.items
    }
}

/// Batch-size rule shared by the batch constructor and the raw body parser.
pub(crate) fn check_batch_len(len: usize) -> Result<(), ValidationError> {
    if len == 0 {
        return Err(ValidationError::MissingField("images".to_string()));
    }
    if len > MAX_BATCH_SIZE {
        return Err(ValidationError::BatchTooLarge {
            limit: MAX_BATCH_SIZE,
            actual: len,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(n: usize) -> ImageItem {
        ImageItem {
            id: Some(format!("image_{}", n)),
            payload: ImagePayload::Base64("aGVsbG8=".to_string()),
        }
    }

    #[test]
    fn batch_accepts_up_to_cap() {
        let batch = ImageBatch::new((0..MAX_BATCH_SIZE).map(item).collect()).unwrap();
        assert_eq!(batch.len(), MAX_BATCH_SIZE);
    }

    #[test]
    fn batch_rejects_over_cap_wholesale() {
        let err = ImageBatch::new((0..11).map(item).collect()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::BatchTooLarge {
                limit: 10,
                actual: 11
            }
        );
    }

    #[test]
    fn batch_rejects_empty() {
        assert!(matches!(
            ImageBatch::new(Vec::new()),
            Err(ValidationError::MissingField(_))
        ));
    }
}
