// * Result Rendering
// * Turns a fitted model and its corpus into the two run artifacts: an interactive-style
// * topic map document and a word-cloud raster.

pub mod glyphs;
pub mod visualization;
pub mod wordcloud;

use thiserror::Error;

// * Re-exports for convenient access
pub use visualization::{render_visualization, RelevantTerm, SalientTerm, TopicMap, TopicSummary};
pub use wordcloud::{
    render_word_cloud, word_frequencies, PlacedWord, WordCloud, WordCloudConfig, WordCloudImage,
};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Model, corpus and vocabulary do not match: {0}")]
    Mismatch(String),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Payload serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
