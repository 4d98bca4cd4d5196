//! Domain models for the meme service. All of them live for one request.

pub mod analysis;
pub mod request;

pub use analysis::{AnalysisOutcome, AnalysisResult};
pub use request::{
    AnalysisParams, GenerationRequest, ImageBatch, ImageItem, ImagePayload, OutputFormat,
    SentimentQuery,
};
