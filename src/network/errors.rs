use thiserror::Error;

// * Unified Error type for the Network Layer.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTTP {0} returned for page")]
    HttpStatus(u16),

    #[error("Empty response body")]
    EmptyResponse,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Simulated failure: {0}")]
    Simulated(String),
}
