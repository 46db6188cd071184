// * Configuration
// * Typed run configuration loaded from JSON, with defaults from `constants`.

pub mod constants;

use crate::engine::pagination::UrlTemplate;
use crate::engine::retry::RetryPolicy;
use crate::refinery::collocations::PhraseConfig;
use crate::refinery::extractor::Site;
use crate::render::wordcloud::WordCloudConfig;
use crate::topics::coherence::CoherenceConfig;
use crate::topics::lda::LdaConfig;
use crate::topics::selector::SelectorConfig;
use constants::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("The site {0} is not supported")]
    UnsupportedSite(String),

    #[error("Invalid page URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("total_pages must be at least 1")]
    ZeroPages,

    #[error("Topic count must be at least 1")]
    ZeroTopics,

    #[error("Candidate topic range {start}..{end} is empty")]
    EmptyCandidateRange { start: usize, end: usize },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything one run needs to know.
///
/// # Example
/// ```no_run
/// use review_topics::PipelineConfig;
///
/// # fn load() -> Result<(), review_topics::config::ConfigError> {
/// let config = PipelineConfig::from_json_str(r#"{
///     "scrape": {
///         "site": "tripadvisor",
///         "url_prefix": "https://www.tripadvisor.co.uk/Attraction_Review-g1-d2-Reviews",
///         "increment_token": "-or",
///         "url_suffix": "-Name.html",
///         "total_pages": 20
///     }
/// }"#)?;
/// assert_eq!(config.scrape.total_pages, 20);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub scrape: ScrapeConfig,
    pub model: ModelConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub site: String,
    pub url_prefix: String,
    pub increment_token: String,
    /// Text between the page offset and `url_suffix`
    pub increment_suffix: String,
    pub url_suffix: String,
    pub increment_amount: usize,
    pub total_pages: usize,
    /// Wait between pages, and between re-reads of a failing page
    pub inter_page_delay_secs: f64,
    /// Attempts per page before giving up; absent means retry forever
    pub max_attempts: Option<u32>,
    pub page_timeout_ms: u64,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            site: Site::TripAdvisor.as_str().to_string(),
            url_prefix: String::new(),
            increment_token: String::new(),
            increment_suffix: String::new(),
            url_suffix: String::new(),
            increment_amount: DEFAULT_INCREMENT,
            total_pages: 1,
            inter_page_delay_secs: DEFAULT_WAIT_SECS,
            max_attempts: None,
            page_timeout_ms: PAGE_TIMEOUT_MS,
        }
    }
}

impl ScrapeConfig {
    /// Resolves the configured site name; unknown names fail here, before any fetch.
    pub fn site(&self) -> Result<Site, ConfigError> {
        self.site
            .parse()
            .map_err(|_| ConfigError::UnsupportedSite(self.site.clone()))
    }

    pub fn template(&self) -> UrlTemplate {
        UrlTemplate::new(
            self.url_prefix.clone(),
            self.increment_token.clone(),
            self.increment_suffix.clone(),
            self.url_suffix.clone(),
        )
    }

    /// Negative, non-finite or out-of-range delays are `InvalidValue`.
    pub fn page_delay(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.inter_page_delay_secs).map_err(|_| ConfigError::InvalidValue {
            field: "inter_page_delay_secs",
            value: self.inter_page_delay_secs.to_string(),
        })
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms)
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        let delay = self.page_delay()?;
        Ok(match self.max_attempts {
            Some(max) => RetryPolicy::bounded(max, delay),
            None => RetryPolicy::unbounded(delay),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.site()?;

        if self.total_pages == 0 {
            return Err(ConfigError::ZeroPages);
        }
        self.page_delay()?;

        if UrlTemplate::offset(self.total_pages, self.increment_amount).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "increment_amount",
                value: self.increment_amount.to_string(),
            });
        }

        // * the last page exercises every template part
        let template = self.template();
        for url in [template.first_page(), template.page_url(self.total_pages, self.increment_amount)] {
            Url::parse(&url).map_err(|e| ConfigError::InvalidUrl {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Fit exactly this many topics; `null` searches `candidate_start..candidate_end`
    pub fixed_topic_count: Option<usize>,
    pub candidate_start: usize,
    pub candidate_end: usize,
    pub seed: u64,
    pub passes: usize,
    pub eta: f64,
    pub learn_alpha: bool,
    pub coherence_window: usize,
    pub coherence_top_n: usize,
    pub phrase_min_count: usize,
    pub phrase_threshold: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            fixed_topic_count: Some(DEFAULT_FIXED_TOPICS),
            candidate_start: CANDIDATE_TOPICS_START,
            candidate_end: CANDIDATE_TOPICS_END,
            seed: RANDOM_SEED,
            passes: LDA_PASSES,
            eta: LDA_ETA,
            learn_alpha: true,
            coherence_window: COHERENCE_WINDOW,
            coherence_top_n: COHERENCE_TOP_N,
            phrase_min_count: PHRASE_MIN_COUNT,
            phrase_threshold: PHRASE_THRESHOLD,
        }
    }
}

impl ModelConfig {
    pub fn selector_config(&self) -> SelectorConfig {
        SelectorConfig {
            candidates: self.candidate_start..self.candidate_end,
            lda: LdaConfig {
                passes: self.passes,
                eta: self.eta,
                seed: self.seed,
                learn_alpha: self.learn_alpha,
                ..LdaConfig::default()
            },
            coherence: CoherenceConfig {
                window: self.coherence_window,
                top_n: self.coherence_top_n,
            },
        }
    }

    pub fn phrase_config(&self) -> PhraseConfig {
        PhraseConfig {
            min_count: self.phrase_min_count,
            threshold: self.phrase_threshold,
            ..PhraseConfig::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.fixed_topic_count {
            Some(0) => return Err(ConfigError::ZeroTopics),
            Some(_) => {}
            None if self.candidate_start >= self.candidate_end => {
                return Err(ConfigError::EmptyCandidateRange {
                    start: self.candidate_start,
                    end: self.candidate_end,
                });
            }
            None if self.candidate_start == 0 => return Err(ConfigError::ZeroTopics),
            None => {}
        }
        if !(self.eta.is_finite() && self.eta > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "eta",
                value: self.eta.to_string(),
            });
        }
        if self.coherence_window == 0 || self.coherence_top_n == 0 {
            return Err(ConfigError::InvalidValue {
                field: "coherence_window/coherence_top_n",
                value: format!("{}/{}", self.coherence_window, self.coherence_top_n),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub word_cloud: WordCloudConfig,
    pub top_terms: usize,
    pub relevance_lambda: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            word_cloud: WordCloudConfig::default(),
            top_terms: VIS_TOP_TERMS,
            relevance_lambda: VIS_RELEVANCE_LAMBDA,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.relevance_lambda) {
            return Err(ConfigError::InvalidValue {
                field: "relevance_lambda",
                value: self.relevance_lambda.to_string(),
            });
        }
        if self.word_cloud.width == 0 || self.word_cloud.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "word_cloud",
                value: format!("{}x{}", self.word_cloud.width, self.word_cloud.height),
            });
        }
        Ok(())
    }
}

impl PipelineConfig {
    /// Parses and validates
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scrape.validate()?;
        self.model.validate()?;
        self.render.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "scrape": {
            "site": "tripadvisor",
            "url_prefix": "https://www.tripadvisor.co.uk/Attraction_Review-g1-d2-Reviews",
            "increment_token": "-or",
            "url_suffix": "-Name.html",
            "total_pages": 20
        }
    }"#;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = PipelineConfig::from_json_str(MINIMAL).unwrap();
        assert_eq!(config.scrape.increment_amount, 10);
        assert_eq!(config.scrape.inter_page_delay_secs, 1.0);
        assert_eq!(config.scrape.max_attempts, None);
        assert_eq!(config.model.fixed_topic_count, Some(3));
        assert_eq!(config.scrape.site().unwrap(), Site::TripAdvisor);
    }

    #[test]
    fn test_null_topic_count_enables_search() {
        let json = MINIMAL.replacen("\"scrape\"", "\"model\": {\"fixed_topic_count\": null}, \"scrape\"", 1);
        let config = PipelineConfig::from_json_str(&json).unwrap();
        assert_eq!(config.model.fixed_topic_count, None);
        assert_eq!(config.model.selector_config().candidates, 2..6);
    }

    #[test]
    fn test_unsupported_site_fails_fast() {
        let json = MINIMAL.replace("tripadvisor\"", "booking\"");
        match PipelineConfig::from_json_str(&json) {
            Err(ConfigError::UnsupportedSite(site)) => assert_eq!(site, "booking"),
            other => panic!("Expected UnsupportedSite, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_pages_rejected() {
        let json = MINIMAL.replace("\"total_pages\": 20", "\"total_pages\": 0");
        assert!(matches!(PipelineConfig::from_json_str(&json), Err(ConfigError::ZeroPages)));
    }

    #[test]
    fn test_relative_url_rejected() {
        let json = MINIMAL.replace("https://www.tripadvisor.co.uk", "");
        assert!(matches!(
            PipelineConfig::from_json_str(&json),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_template_and_policy() {
        let config = PipelineConfig::from_json_str(MINIMAL).unwrap();
        assert_eq!(
            config.scrape.template().page_url(3, config.scrape.increment_amount),
            "https://www.tripadvisor.co.uk/Attraction_Review-g1-d2-Reviews-or20-Name.html"
        );
        assert!(config.scrape.retry_policy().unwrap().allows_another(1_000));
    }

    #[test]
    fn test_huge_delay_rejected_before_use() {
        let json = MINIMAL.replace("\"total_pages\": 20", "\"total_pages\": 20, \"inter_page_delay_secs\": 1e30");
        match PipelineConfig::from_json_str(&json) {
            Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "inter_page_delay_secs"),
            other => panic!("Expected InvalidValue, got {:?}", other),
        }

        let mut scrape = PipelineConfig::from_json_str(MINIMAL).unwrap().scrape;
        scrape.inter_page_delay_secs = -1.0;
        assert!(scrape.page_delay().is_err());
        assert!(scrape.retry_policy().is_err());
        scrape.inter_page_delay_secs = f64::NAN;
        assert!(scrape.validate().is_err());
    }

    #[test]
    fn test_overflowing_increment_rejected() {
        let json = MINIMAL.replace(
            "\"total_pages\": 20",
            "\"total_pages\": 20, \"increment_amount\": 18446744073709551615",
        );
        match PipelineConfig::from_json_str(&json) {
            Err(ConfigError::InvalidValue { field, value }) => {
                assert_eq!(field, "increment_amount");
                assert_eq!(value, usize::MAX.to_string());
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }

        // * a single page never applies the increment
        let json = MINIMAL.replace(
            "\"total_pages\": 20",
            "\"total_pages\": 1, \"increment_amount\": 18446744073709551615",
        );
        assert!(PipelineConfig::from_json_str(&json).is_ok());
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(PipelineConfig::from_json_str("{"), Err(ConfigError::Json(_))));
    }
}
