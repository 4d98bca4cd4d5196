use crate::services::providers::SentimentOutcome;
use serde::{Deserialize, Serialize};

/// Query string of `GET /generateMeme`.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateMemeParams {
    pub description: Option<String>,
    pub format: Option<String>,
}

/// Query string of `GET /getSentiment`.
#[derive(Debug, Default, Deserialize)]
pub struct SentimentParams {
    pub message: Option<String>,
    pub tags: Option<String>,
}

/// Query string of `POST /imageInfo`. Numbers stay strings until validated.
#[derive(Debug, Default, Deserialize)]
pub struct ImageInfoParams {
    #[serde(rename = "numTags", alias = "num_tags")]
    pub num_tags: Option<String>,
    #[serde(rename = "contentLength", alias = "content_length")]
    pub content_length: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageResponse {
    pub image: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageFileResponse {
    #[serde(rename = "imageFile")]
    pub image_file: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SentimentResponse {
    pub sentiment: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RelevantTagsResponse {
    /// Matching candidate tags joined with `", "`.
    #[serde(rename = "relevantTags")]
    pub relevant_tags: String,
}

/// Body of a successful `GET /getSentiment`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SentimentBody {
    Sentiment(SentimentResponse),
    RelevantTags(RelevantTagsResponse),
}

impl From<SentimentOutcome> for SentimentBody {
    fn from(outcome: SentimentOutcome) -> Self {
        match outcome {
            SentimentOutcome::Sentiment(sentiment) => {
                SentimentBody::Sentiment(SentimentResponse { sentiment })
            }
            SentimentOutcome::RelevantTags(tags) => {
                SentimentBody::RelevantTags(RelevantTagsResponse {
                    relevant_tags: tags.join(", "),
                })
            }
        }
    }
}
