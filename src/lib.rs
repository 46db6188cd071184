// * Review-Topics
// * Scrapes paginated review listings and models their topics.

pub mod config;
pub mod engine;
pub mod network;
pub mod ops;
pub mod pipeline;
pub mod refinery;
pub mod render;
pub mod topics;

pub use config::PipelineConfig;
pub use pipeline::{PipelineError, ReviewTopicPipeline, RunResult};
