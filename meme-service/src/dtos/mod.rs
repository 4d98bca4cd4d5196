pub mod memes;

pub use memes::{
    GenerateMemeParams, ImageFileResponse, ImageInfoParams, ImageResponse, RelevantTagsResponse,
    SentimentBody, SentimentParams, SentimentResponse,
};
