// * Paginated Scraper
// * Walks the pages of a review listing in order, re-reading any page that fails until it
// * reads cleanly, and concatenates the records in visit order.

use crate::engine::pagination::{PageJob, UrlTemplate};
use crate::engine::retry::RetryPolicy;
use crate::network::client::PageFetcher;
use crate::network::errors::NetworkError;
use crate::ops::telemetry;
use crate::refinery::extractor::{ReviewRecord, ScrapeResult, Site};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Page {page_index} ({url}) still failing after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        page_index: usize,
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Scrape cancelled at page {page_index}")]
    Cancelled { page_index: usize },

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}

// * Why a single attempt at a page did not produce usable records
#[derive(Debug)]
enum AttemptFailure {
    Fetch(NetworkError),
    Mismatch(ScrapeResult),
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptFailure::Fetch(e) => write!(f, "{}", e),
            AttemptFailure::Mismatch(result) => write!(
                f,
                "unequal field sizes (texts={}, titles={}, ratings={}, dates={})",
                result.sizes.texts, result.sizes.titles, result.sizes.ratings, result.sizes.dates
            ),
        }
    }
}

/// Drives a `PageFetcher` and a `Site` extractor across a paginated listing.
///
/// # Example
/// ```no_run
/// use review_topics::engine::{PaginatedScraper, RetryPolicy, UrlTemplate};
/// use review_topics::network::HttpFetcher;
/// use review_topics::refinery::Site;
/// use std::time::Duration;
///
/// # async fn scrape() -> Result<(), Box<dyn std::error::Error>> {
/// let template = UrlTemplate::new(
///     "https://www.tripadvisor.co.uk/Attraction_Review-g1-d2-Reviews",
///     "-or",
///     "",
///     "-Name.html",
/// );
/// let scraper = PaginatedScraper::new(HttpFetcher::new()?, Site::TripAdvisor)
///     .with_policy(RetryPolicy::unbounded(Duration::from_secs(1)));
/// let records = scraper.run(&template, 20, 10).await?;
/// println!("{} reviews", records.len());
/// # Ok(())
/// # }
/// ```
pub struct PaginatedScraper<F: PageFetcher> {
    fetcher: F,
    site: Site,
    policy: RetryPolicy,
    page_delay: Duration,
    cancel: Option<Arc<AtomicBool>>,
}

impl<F: PageFetcher> PaginatedScraper<F> {
    pub fn new(fetcher: F, site: Site) -> Self {
        let policy = RetryPolicy::default();
        Self {
            fetcher,
            site,
            page_delay: policy.delay_for(1),
            policy,
            cancel: None,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Wait between two successfully read pages
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Flag checked before every attempt; setting it stops the run with `Cancelled`
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn site(&self) -> Site {
        self.site
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Scrapes pages 1..=total_pages strictly in order.
    ///
    /// A page that fails to fetch or fails the extraction length check is re-read
    /// according to the retry policy; with the default unbounded policy this only returns
    /// once every page has been read.
    pub async fn run(
        &self,
        template: &UrlTemplate,
        total_pages: usize,
        increment: usize,
    ) -> Result<Vec<ReviewRecord>, ScrapeError> {
        let jobs = template.jobs(total_pages, increment);
        let mut records = Vec::new();

        info!(site = %self.site, "Getting reviews 0/{}", total_pages);

        for job in &jobs {
            let page_records = self.scrape_page(job).await?;
            debug!(page = job.page_index, records = page_records.len(), "Page read");
            records.extend(page_records);

            info!(site = %self.site, "Getting reviews {}/{}", job.page_index, total_pages);

            if job.page_index < total_pages && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        info!(records = records.len(), pages = total_pages, "Scrape complete");
        Ok(records)
    }

    /// Reads one page, re-reading until it succeeds or the policy gives up
    pub async fn scrape_page(&self, job: &PageJob) -> Result<Vec<ReviewRecord>, ScrapeError> {
        let mut attempt: u32 = 0;

        loop {
            self.check_cancelled(job.page_index)?;
            attempt += 1;

            match self.attempt(&job.url).await {
                Ok(result) => return Ok(result.records),
                Err(failure) => {
                    if !self.policy.allows_another(attempt) {
                        return Err(ScrapeError::RetriesExhausted {
                            page_index: job.page_index,
                            url: job.url.clone(),
                            attempts: attempt,
                            last_error: failure.to_string(),
                        });
                    }

                    telemetry::record_page_reread();
                    warn!(
                        url = %job.url,
                        page = job.page_index,
                        attempt = attempt,
                        error = %failure,
                        "Error in reading - Re-reading"
                    );

                    let delay = self.policy.delay_for(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    /// One fetch and extraction of a single URL, without retry.
    ///
    /// The returned result may have `success == false`; only transport errors are `Err`.
    pub async fn scrape_once(&self, url: &str) -> Result<ScrapeResult, ScrapeError> {
        let body = self.fetcher.fetch(url).await?;
        Ok(self.site.extract(&body))
    }

    async fn attempt(&self, url: &str) -> Result<ScrapeResult, AttemptFailure> {
        let started = Instant::now();
        let fetched = self.fetcher.fetch(url).await;
        telemetry::record_fetch_duration(started.elapsed().as_secs_f64());

        let body = match fetched {
            Ok(body) => body,
            Err(e) => {
                telemetry::record_page_fetched("network_error");
                return Err(AttemptFailure::Fetch(e));
            }
        };

        let result = self.site.extract(&body);
        if result.success {
            telemetry::record_page_fetched("success");
            telemetry::record_records_extracted(result.records.len());
            Ok(result)
        } else {
            telemetry::record_page_fetched("mismatch");
            Err(AttemptFailure::Mismatch(result))
        }
    }

    fn check_cancelled(&self, page_index: usize) -> Result<(), ScrapeError> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => {
                warn!(page = page_index, "Scrape cancelled");
                Err(ScrapeError::Cancelled { page_index })
            }
            _ => Ok(()),
        }
    }
}
