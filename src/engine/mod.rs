pub mod pagination;
pub mod retry;
pub mod scraper;

pub use pagination::{PageJob, UrlTemplate};
pub use retry::{DelayStrategy, RetryPolicy};
pub use scraper::{PaginatedScraper, ScrapeError};
