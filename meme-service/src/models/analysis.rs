//! Per-image analysis results.

use serde::Serialize;

/// Result for one image of an analysis request.
///
/// Serializes as `{"id", "tags", "content"}` or `{"id", "error"}`; `id` is omitted when
/// the caller supplied none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(flatten)]
    pub outcome: AnalysisOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Analyzed { tags: Vec<String>, content: String },
    Failed { error: String },
}

impl AnalysisResult {
    pub fn analyzed(id: Option<String>, tags: Vec<String>, content: String) -> Self {
        Self {
            id,
            outcome: AnalysisOutcome::Analyzed { tags, content },
        }
    }

    pub fn failed(id: Option<String>, error: impl Into<String>) -> Self {
        Self {
            id,
            outcome: AnalysisOutcome::Failed {
                error: error.into(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, AnalysisOutcome::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn analyzed_result_has_tags_and_content_only() {
        let result = AnalysisResult::analyzed(
            Some("a".to_string()),
            vec!["funny".to_string()],
            "A cat".to_string(),
        );
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"id": "a", "tags": ["funny"], "content": "A cat"})
        );
    }

    #[test]
    fn failed_result_has_error_only() {
        let result = AnalysisResult::failed(None, "Invalid image");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"error": "Invalid image"})
        );
        assert!(result.is_failed());
    }
}
