//! Input checks for every endpoint.
//!
//! Each function turns raw query/body input into a validated model or a
//! `ValidationError`. Nothing here calls the gateway.

use crate::config::LimitsConfig;
use crate::error::ValidationError;
use crate::models::request::check_batch_len;
use crate::models::{
    AnalysisParams, GenerationRequest, ImageBatch, ImageItem, ImagePayload, OutputFormat,
    SentimentQuery,
};

/// Trimmed value of a required text field, or `MissingField(name)` when absent or blank.
pub fn require_text(name: &str, value: Option<&str>) -> Result<String, ValidationError> {
    match well_formed(name, value)?.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::MissingField(name.to_string())),
    }
}

/// Query decoding replaces invalid UTF-8 with U+FFFD; such values are rejected.
fn well_formed<'a>(
    name: &str,
    value: Option<&'a str>,
) -> Result<Option<&'a str>, ValidationError> {
    match value {
        Some(v) if v.contains(char::REPLACEMENT_CHARACTER) => {
            Err(ValidationError::InvalidParameter(name.to_string()))
        }
        other => Ok(other),
    }
}

pub fn generation_request(description: Option<&str>) -> Result<GenerationRequest, ValidationError> {
    Ok(GenerationRequest {
        description: require_text("description", description)?,
    })
}

pub fn output_format(raw: Option<&str>) -> Result<OutputFormat, ValidationError> {
    match well_formed("format", raw)?.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("json") => Ok(OutputFormat::Json),
        Some("png") | Some("binary") => Ok(OutputFormat::Png),
        Some(_) => Err(ValidationError::InvalidParameter("format".to_string())),
    }
}

/// Message is required; when `tags` is present it must hold at least one tag.
pub fn sentiment_query(
    message: Option<&str>,
    tags: Option<&str>,
) -> Result<SentimentQuery, ValidationError> {
    let message = require_text("message", message)?;

    let candidate_tags = match well_formed("tags", tags)? {
        None => None,
        Some(raw) => {
            let pool: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
            if pool.is_empty() {
                return Err(ValidationError::MissingField("tags".to_string()));
            }
            Some(pool)
        }
    };

    Ok(SentimentQuery {
        message,
        candidate_tags,
    })
}

/// Parse an optional positive integer parameter and clamp it to `max`.
///
/// Non-numeric input and values below 1 are rejected.
pub fn bounded_count(
    name: &str,
    raw: Option<&str>,
    default: usize,
    max: usize,
) -> Result<usize, ValidationError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(default.min(max)),
        Some(v) => v,
    };

    let value: i64 = raw
        .parse()
        .map_err(|_| ValidationError::InvalidParameter(name.to_string()))?;

    if value < 1 {
        return Err(ValidationError::InvalidParameter(name.to_string()));
    }

    Ok(usize::try_from(value).unwrap_or(usize::MAX).min(max))
}

pub fn analysis_params(
    num_tags: Option<&str>,
    content_length: Option<&str>,
    limits: &LimitsConfig,
) -> Result<AnalysisParams, ValidationError> {
    Ok(AnalysisParams {
        num_tags: bounded_count(
            "numTags",
            num_tags,
            limits.default_num_tags,
            limits.max_num_tags,
        )?,
        content_length: bounded_count(
            "contentLength",
            content_length,
            limits.default_content_length,
            limits.max_content_length,
        )?,
    })
}

/// Validate a JSON batch body: `[{"Id": "...", "imageFile": "<base64>"}, ...]`.
///
/// Order of checks: JSON syntax, array-of-objects shape, batch size, then per-item
/// fields. A field of the wrong type is `InvalidParameter`, not `MalformedBody`. The
/// base64 payloads themselves are not decoded here.
pub fn image_batch(body: &[u8]) -> Result<ImageBatch, ValidationError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| ValidationError::MalformedBody)?;

    let raw_items = match value {
        serde_json::Value::Array(items) => items,
        _ => return Err(ValidationError::MalformedBody),
    };

    check_batch_len(raw_items.len())?;

    let items = raw_items
        .iter()
        .map(|raw| {
            let fields = raw.as_object().ok_or(ValidationError::MalformedBody)?;
            let id = fields.get("Id").or_else(|| fields.get("id"));
            let id = string_field("Id", id)?.map(str::to_string);
            let image_file = string_field("imageFile", fields.get("imageFile"))?;
            let image_file = require_text("imageFile", image_file)?;
            Ok(ImageItem {
                id,
                payload: ImagePayload::Base64(image_file),
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    ImageBatch::new(items)
}

/// Optional string field: absent or `null` is `None`, any other non-string is invalid.
fn string_field<'a>(
    name: &str,
    value: Option<&'a serde_json::Value>,
) -> Result<Option<&'a str>, ValidationError> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ValidationError::InvalidParameter(name.to_string())),
    }
}

/// Validate a JSON `{"description": "..."}` body.
pub fn description_body(body: &[u8]) -> Result<GenerationRequest, ValidationError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| ValidationError::MalformedBody)?;
    let fields = value.as_object().ok_or(ValidationError::MalformedBody)?;
    generation_request(string_field("description", fields.get("description"))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limits() -> LimitsConfig {
        LimitsConfig::default()
    }

    #[test]
    fn blank_text_is_missing() {
        for input in [None, Some(""), Some("   "), Some("\n\t")] {
            assert_eq!(
                require_text("description", input),
                Err(ValidationError::MissingField("description".to_string()))
            );
        }
        assert_eq!(require_text("description", Some("  a cat ")).unwrap(), "a cat");
    }

    #[test]
    fn output_format_accepts_known_values() {
        assert_eq!(output_format(None).unwrap(), OutputFormat::Json);
        assert_eq!(output_format(Some("PNG")).unwrap(), OutputFormat::Png);
        assert_eq!(
            output_format(Some("gif")),
            Err(ValidationError::InvalidParameter("format".to_string()))
        );
    }

    #[test]
    fn sentiment_without_tags_is_plain_variant() {
        let query = sentiment_query(Some("I love this!"), None).unwrap();
        assert_eq!(query.message, "I love this!");
        assert!(query.candidate_tags.is_none());
    }

    #[test]
    fn sentiment_tag_pool_is_split_and_trimmed() {
        let query = sentiment_query(Some("hi"), Some(" happy, dog ,,sad ")).unwrap();
        assert_eq!(
            query.candidate_tags.unwrap(),
            vec!["happy".to_string(), "dog".to_string(), "sad".to_string()]
        );
    }

    #[test]
    fn sentiment_rejects_blank_message_before_tags() {
        assert_eq!(
            sentiment_query(Some(" "), Some("")),
            Err(ValidationError::MissingField("message".to_string()))
        );
        assert_eq!(
            sentiment_query(Some("hi"), Some(" , ")),
            Err(ValidationError::MissingField("tags".to_string()))
        );
    }

    #[test]
    fn counts_parse_default_and_clamp() {
        assert_eq!(bounded_count("numTags", None, 10, 50).unwrap(), 10);
        assert_eq!(bounded_count("numTags", Some("5"), 10, 50).unwrap(), 5);
        assert_eq!(bounded_count("numTags", Some("5000"), 10, 50).unwrap(), 50);
        assert_eq!(
            bounded_count("numTags", Some("ten"), 10, 50),
            Err(ValidationError::InvalidParameter("numTags".to_string()))
        );
        assert!(bounded_count("numTags", Some("0"), 10, 50).is_err());
        assert!(bounded_count("numTags", Some("-3"), 10, 50).is_err());
    }

    #[test]
    fn analysis_params_use_configured_defaults() {
        let params = analysis_params(None, Some("100"), &limits()).unwrap();
        assert_eq!(params.num_tags, 10);
        assert_eq!(params.content_length, 100);

        assert_eq!(
            analysis_params(None, Some("long"), &limits()),
            Err(ValidationError::InvalidParameter("contentLength".to_string()))
        );
    }

    #[test]
    fn batch_rejects_invalid_json() {
        assert_eq!(
            image_batch(b"Invalid JSON data"),
            Err(ValidationError::MalformedBody)
        );
        assert_eq!(
            image_batch(br#"{"Id": "a", "imageFile": "aGk="}"#),
            Err(ValidationError::MalformedBody)
        );
    }

    #[test]
    fn batch_size_is_checked_before_fields() {
        let items: Vec<_> = (0..11).map(|_| json!({})).collect();
        let body = serde_json::to_vec(&items).unwrap();
        assert_eq!(
            image_batch(&body),
            Err(ValidationError::BatchTooLarge {
                limit: 10,
                actual: 11
            })
        );
    }

    #[test]
    fn batch_requires_image_file() {
        let body = serde_json::to_vec(&json!([{"Id": "a"}])).unwrap();
        assert_eq!(
            image_batch(&body),
            Err(ValidationError::MissingField("imageFile".to_string()))
        );
    }

    #[test]
    fn batch_field_of_wrong_type_is_invalid_parameter() {
        let body = serde_json::to_vec(&json!([{"Id": 5, "imageFile": "AAAA"}])).unwrap();
        assert_eq!(
            image_batch(&body),
            Err(ValidationError::InvalidParameter("Id".to_string()))
        );

        let body = serde_json::to_vec(&json!([{"Id": "a", "imageFile": 123}])).unwrap();
        assert_eq!(
            image_batch(&body),
            Err(ValidationError::InvalidParameter("imageFile".to_string()))
        );
    }

    #[test]
    fn batch_of_non_objects_is_malformed() {
        assert_eq!(
            image_batch(br#"["AAAA", "BBBB"]"#),
            Err(ValidationError::MalformedBody)
        );
    }

    #[test]
    fn replacement_character_in_query_value_is_rejected() {
        assert_eq!(
            sentiment_query(Some("caf\u{FFFD}"), None),
            Err(ValidationError::InvalidParameter("message".to_string()))
        );
        assert_eq!(
            sentiment_query(Some("hi"), Some("dog,\u{FFFD}")),
            Err(ValidationError::InvalidParameter("tags".to_string()))
        );
    }

    #[test]
    fn batch_keeps_order_and_ids() {
        let body = serde_json::to_vec(&json!([
            {"Id": "first", "imageFile": "AAAA"},
            {"imageFile": "BBBB"},
            {"id": "third", "imageFile": "CCCC"}
        ]))
        .unwrap();

        let items = image_batch(&body).unwrap().into_items();
        let ids: Vec<_> = items.iter().map(|i| i.id.clone()).collect();
        assert_eq!(
            ids,
            vec![Some("first".to_string()), None, Some("third".to_string())]
        );
        assert_eq!(items[1].payload, ImagePayload::Base64("BBBB".to_string()));
    }

    #[test]
    fn description_body_distinguishes_malformed_from_missing() {
        assert_eq!(
            description_body(b"invalid json"),
            Err(ValidationError::MalformedBody)
        );
        assert_eq!(
            description_body(br#"{"description": "  "}"#),
            Err(ValidationError::MissingField("description".to_string()))
        );
        assert_eq!(
            description_body(br#"{"description": "A sunrise"}"#)
                .unwrap()
                .description,
            "A sunrise"
        );
        assert_eq!(
            description_body(br#"{"description": 42}"#),
            Err(ValidationError::InvalidParameter("description".to_string()))
        );
    }
}
