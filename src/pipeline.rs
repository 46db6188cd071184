// * Review Topic Pipeline
// * scrape -> normalize -> fold phrases -> select topic model -> render artifacts

use crate::config::{ConfigError, PipelineConfig, RenderConfig};
use crate::engine::pagination::UrlTemplate;
use crate::engine::scraper::{PaginatedScraper, ScrapeError};
use crate::network::client::PageFetcher;
use crate::refinery::collocations::CollocationBuilder;
use crate::refinery::extractor::ReviewRecord;
use crate::refinery::normalizer::{StopWords, TextNormalizer};
use crate::refinery::prepare_documents;
use crate::render::visualization::TopicMap;
use crate::render::wordcloud::{render_word_cloud, WordCloudImage};
use crate::render::RenderError;
use crate::topics::lda::LdaError;
use crate::topics::selector::{TopicSelection, TopicSelector};
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scrape error: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("Model fitting error: {0}")]
    Model(#[from] LdaError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// Everything a run produces, held in memory; persisting it is the caller's concern.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub job_name: String,
    pub records: Vec<ReviewRecord>,
    /// Normalized, phrase-folded documents in record order
    pub documents: Vec<Vec<String>>,
    pub selection: TopicSelection,
    pub topic_map: TopicMap,
    pub visualization_html: String,
    pub word_cloud: WordCloudImage,
}

impl RunResult {
    /// Token -> total count across the corpus, stop words excluded
    pub fn frequency_dict(&self) -> &BTreeMap<String, usize> {
        &self.word_cloud.frequencies
    }

    pub fn word_cloud_png(&self) -> &[u8] {
        &self.word_cloud.png
    }

    /// (topic count, coherence) for every candidate evaluated
    pub fn scores(&self) -> &[(usize, f64)] {
        &self.selection.scores
    }
}

/// One configured run against one review listing.
///
/// # Example
/// ```no_run
/// use review_topics::network::HttpFetcher;
/// use review_topics::{PipelineConfig, ReviewTopicPipeline};
///
/// # async fn hotel() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PipelineConfig::from_file("job.json")?;
/// let pipeline = ReviewTopicPipeline::from_config(HttpFetcher::new()?, &config)?;
/// let result = pipeline.run("hotel-42").await?;
/// std::fs::write("hotel-42.html", &result.visualization_html)?;
/// # Ok(())
/// # }
/// ```
pub struct ReviewTopicPipeline<F: PageFetcher> {
    scraper: PaginatedScraper<F>,
    template: UrlTemplate,
    total_pages: usize,
    increment: usize,
    normalizer: TextNormalizer,
    collocations: CollocationBuilder,
    selector: TopicSelector,
    fixed_topic_count: Option<usize>,
    render: RenderConfig,
}

impl<F: PageFetcher> ReviewTopicPipeline<F> {
    /// Validates `config` and wires every stage; an unsupported site fails here.
    pub fn from_config(fetcher: F, config: &PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let scrape = &config.scrape;

        let scraper = PaginatedScraper::new(fetcher, scrape.site()?)
            .with_policy(scrape.retry_policy()?)
            .with_page_delay(scrape.page_delay()?);

        Ok(Self {
            scraper,
            template: scrape.template(),
            total_pages: scrape.total_pages,
            increment: scrape.increment_amount,
            normalizer: TextNormalizer::default(),
            collocations: CollocationBuilder::with_config(config.model.phrase_config()),
            selector: TopicSelector::new(config.model.selector_config()),
            fixed_topic_count: config.model.fixed_topic_count,
            render: config.render.clone(),
        })
    }

    /// Replaces the English stop-word list for both tokenization and the word cloud
    pub fn with_stopwords(mut self, stopwords: StopWords) -> Self {
        self.normalizer = TextNormalizer::new(stopwords);
        self
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.scraper = self.scraper.with_cancel_flag(flag);
        self
    }

    pub fn scraper(&self) -> &PaginatedScraper<F> {
        &self.scraper
    }

    /// Scrapes every page, then analyzes the records.
    pub async fn run(&self, job_name: &str) -> Result<RunResult, PipelineError> {
        info!(job = job_name, site = %self.scraper.site(), pages = self.total_pages, "Run started");

        let records = self
            .scraper
            .run(&self.template, self.total_pages, self.increment)
            .await?;

        self.analyze(job_name, records)
    }

    /// Topic modeling and rendering over already scraped records.
    pub fn analyze(&self, job_name: &str, records: Vec<ReviewRecord>) -> Result<RunResult, PipelineError> {
        let started = Instant::now();

        let documents = prepare_documents(
            records.iter().map(|r| r.full_text.as_str()),
            &self.normalizer,
            &self.collocations,
        );
        info!(job = job_name, documents = documents.len(), "Documents prepared");

        let selection = self.selector.select(&documents, self.fixed_topic_count)?;

        let topic_map = TopicMap::build(
            &selection.best.model,
            &selection.corpus,
            &selection.vocabulary,
            self.render.relevance_lambda,
            self.render.top_terms,
        )?;
        let visualization_html = topic_map.to_html(job_name)?;

        let word_cloud = render_word_cloud(
            &selection.corpus,
            &selection.vocabulary,
            self.normalizer.stopwords(),
            &self.render.word_cloud,
        )?;

        info!(
            job = job_name,
            topics = selection.best.topic_count,
            coherence = selection.best.coherence,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Run analyzed"
        );

        Ok(RunResult {
            job_name: job_name.to_string(),
            records,
            documents,
            selection,
            topic_map,
            visualization_html,
            word_cloud,
        })
    }
}
