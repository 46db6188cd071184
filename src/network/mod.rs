pub mod client;
pub mod errors;
pub mod memory;

pub use client::{HttpFetcher, PageFetcher};
pub use errors::NetworkError;
pub use memory::InMemoryFetcher;
