use review_topics::config::{ConfigError, PipelineConfig};
use review_topics::engine::ScrapeError;
use review_topics::network::InMemoryFetcher;
use review_topics::{PipelineError, ReviewTopicPipeline};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

// * End-to-end runs against an in-memory review site

const PREFIX: &str = "https://www.tripadvisor.co.uk/Attraction_Review-g1-d2-Reviews";
const SUFFIX: &str = "-Mosaic_Museum.html";

const REVIEWS: [(&str, &str, &str); 6] = [
    ("The pool and the beach were wonderful, sunny loungers everywhere", "Pool heaven", "bubble_50"),
    ("Reception staff were rude and the checkin queue was endless", "Rude staff", "bubble_10"),
    ("Breakfast buffet had fresh coffee, eggs and pastry", "Great breakfast", "bubble_45"),
    ("Sunny beach, warm pool, comfortable loungers", "Beach days", "bubble_40"),
    ("Manager ignored our complaint at reception, staff unhelpful", "Poor service", "bubble_20"),
    ("Coffee and pastry at breakfast every morning, lovely eggs", "Tasty mornings", "bubble_50"),
];

fn page(reviews: &[(&str, &str, &str)]) -> String {
    let blocks: String = reviews
        .iter()
        .map(|(text, title, bubble)| {
            format!(
                r#"<div class="review-container"><span class="ui_bubble_rating {bubble}"></span><span class="ratingDate">Reviewed 1 June 2019</span><span class="noQuotes">{title}</span><p class="partial_entry entry">{text}</p></div>"#
            )
        })
        .collect();
    format!("<html><body>{blocks}</body></html>")
}

fn config_json(site: &str, pages: usize) -> String {
    format!(
        r#"{{
            "scrape": {{
                "site": "{site}",
                "url_prefix": "{PREFIX}",
                "increment_token": "-or",
                "url_suffix": "{SUFFIX}",
                "total_pages": {pages},
                "inter_page_delay_secs": 0.0
            }},
            "model": {{ "passes": 60 }}
        }}"#
    )
}

fn site() -> InMemoryFetcher {
    InMemoryFetcher::new()
        .with_page(format!("{PREFIX}{SUFFIX}"), page(&REVIEWS[..3]))
        .with_page(format!("{PREFIX}-or10{SUFFIX}"), page(&REVIEWS[3..]))
}

#[tokio::test]
async fn test_run_produces_both_artifacts() {
    let config = PipelineConfig::from_json_str(&config_json("tripadvisor", 2)).unwrap();
    let pipeline = ReviewTopicPipeline::from_config(site(), &config).unwrap();

    let result = pipeline.run("museum-job").await.unwrap();

    assert_eq!(result.job_name, "museum-job");
    assert_eq!(result.records.len(), 6);
    let ratings: Vec<f64> = result.records.iter().map(|r| r.rating).collect();
    assert_eq!(ratings, vec![5.0, 1.0, 4.5, 4.0, 2.0, 5.0]);

    assert_eq!(result.selection.best.topic_count, 3);
    assert_eq!(result.scores().len(), 1);
    assert_eq!(result.topic_map.topics.len(), 3);
    assert_eq!(result.documents.len(), 6);

    assert!(result.visualization_html.contains("<title>museum-job</title>"));
    assert_eq!(&result.word_cloud_png()[1..4], b"PNG");

    // * the frequency dictionary accounts for every corpus token
    let corpus_tokens: usize = result.documents.iter().map(Vec::len).sum();
    let mapped: usize = result.frequency_dict().values().sum();
    assert_eq!(mapped, corpus_tokens);
    assert_eq!(result.frequency_dict()["pool"], 3);
}

#[tokio::test]
async fn test_analyze_is_reproducible() {
    let config = PipelineConfig::from_json_str(&config_json("tripadvisor", 2)).unwrap();
    let pipeline = ReviewTopicPipeline::from_config(site(), &config).unwrap();
    let records = pipeline.run("first").await.unwrap().records;

    let a = pipeline.analyze("again", records.clone()).unwrap();
    let b = pipeline.analyze("again", records).unwrap();
    assert_eq!(a.selection.best.coherence, b.selection.best.coherence);
    assert_eq!(a.topic_map, b.topic_map);
    assert_eq!(a.frequency_dict(), b.frequency_dict());
}

#[test]
fn test_unsupported_site_fails_before_any_fetch() {
    let raw: PipelineConfig = serde_json::from_str(&config_json("booking", 2)).unwrap();
    match ReviewTopicPipeline::from_config(InMemoryFetcher::new(), &raw) {
        Err(PipelineError::Config(ConfigError::UnsupportedSite(site))) => assert_eq!(site, "booking"),
        Err(other) => panic!("Expected UnsupportedSite, got {other}"),
        Ok(_) => panic!("Expected UnsupportedSite, got a pipeline"),
    }
}

#[tokio::test]
async fn test_cancelled_run_surfaces_scrape_error() {
    let config = PipelineConfig::from_json_str(&config_json("tripadvisor", 2)).unwrap();
    let pipeline = ReviewTopicPipeline::from_config(site(), &config)
        .unwrap()
        .with_cancel_flag(Arc::new(AtomicBool::new(true)));

    assert!(matches!(
        pipeline.run("cancelled").await,
        Err(PipelineError::Scrape(ScrapeError::Cancelled { page_index: 1 }))
    ));
    assert!(pipeline.scraper().fetcher().calls().is_empty());
}

#[tokio::test]
async fn test_empty_listing_is_a_model_error() {
    let fetcher = InMemoryFetcher::new().with_page(format!("{PREFIX}{SUFFIX}"), "<html><body></body></html>");
    let config = PipelineConfig::from_json_str(&config_json("tripadvisor", 1)).unwrap();
    let pipeline = ReviewTopicPipeline::from_config(fetcher, &config).unwrap();

    assert!(matches!(pipeline.run("empty").await, Err(PipelineError::Model(_))));
}
