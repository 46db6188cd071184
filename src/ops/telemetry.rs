// * Telemetry - JSON Logging and Prometheus Metrics
// * Provides structured logging and metrics for scraping runs and topic selection

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_gauge_vec,
    register_histogram, Counter, CounterVec, Encoder, Gauge, GaugeVec, Histogram, TextEncoder,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

lazy_static! {
    // * Page attempts by outcome (success, mismatch, network_error)
    pub static ref PAGES_FETCHED_TOTAL: CounterVec = register_counter_vec!(
        "review_pages_fetched_total",
        "Page read attempts by outcome",
        &["outcome"]
    ).unwrap();

    // * Attempts that were followed by a re-read (or gave up)
    pub static ref PAGE_REREADS_TOTAL: Counter = register_counter!(
        "review_page_rereads_total",
        "Re-reads scheduled after a failed page read"
    ).unwrap();

    // * Review records accepted from clean pages
    pub static ref RECORDS_EXTRACTED_TOTAL: Counter = register_counter!(
        "review_records_extracted_total",
        "Review records extracted from pages"
    ).unwrap();

    // * Fetch latency
    pub static ref FETCH_DURATION_SECONDS: Histogram = register_histogram!(
        "review_fetch_duration_seconds",
        "Page fetch duration in seconds",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    // * Coherence of the last model fitted for each topic count
    pub static ref CANDIDATE_COHERENCE: GaugeVec = register_gauge_vec!(
        "review_candidate_coherence",
        "c_v coherence per candidate topic count",
        &["topics"]
    ).unwrap();

    // * Topic count retained by the last selection
    pub static ref SELECTED_TOPIC_COUNT: Gauge = register_gauge!(
        "review_selected_topic_count",
        "Topic count of the retained model"
    ).unwrap();
}

/// Initializes the tracing subscriber with JSON formatting
///
/// # Example
/// ```ignore
/// use review_topics::ops::telemetry;
///
/// telemetry::init_tracing();
/// tracing::info!(url = "https://example.com", "Getting reviews 1/20");
/// ```
pub fn init_tracing() {
    init_tracing_with_level("review_topics=debug,info");
}

/// Initializes tracing with a custom default filter (`RUST_LOG` still wins)
pub fn init_tracing_with_level(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).json())
        .init();
}

/// Initializes tracing with pretty formatting (for development)
pub fn init_tracing_pretty() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().pretty())
        .init();
}

/// Returns the current metrics as a string
pub fn get_metrics_string() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Records one page read attempt
pub fn record_page_fetched(outcome: &str) {
    PAGES_FETCHED_TOTAL.with_label_values(&[outcome]).inc();
}

/// Records a failed page read
pub fn record_page_reread() {
    PAGE_REREADS_TOTAL.inc();
}

/// Records records accepted from a page
pub fn record_records_extracted(count: usize) {
    RECORDS_EXTRACTED_TOTAL.inc_by(count as f64);
}

/// Records the duration of one fetch
pub fn record_fetch_duration(seconds: f64) {
    FETCH_DURATION_SECONDS.observe(seconds);
}

/// Records the coherence of a candidate model
pub fn record_candidate_coherence(topic_count: usize, coherence: f64) {
    let label = topic_count.to_string();
    CANDIDATE_COHERENCE
        .with_label_values(&[label.as_str()])
        .set(coherence);
}

/// Records the topic count of the retained model
pub fn set_selected_topic_count(topic_count: usize) {
    SELECTED_TOPIC_COUNT.set(topic_count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_page_fetched() {
        let before = PAGES_FETCHED_TOTAL.with_label_values(&["success"]).get();
        record_page_fetched("success");
        let after = PAGES_FETCHED_TOTAL.with_label_values(&["success"]).get();
        assert!(after >= before + 1.0);
    }

    #[test]
    fn test_record_records_extracted() {
        let before = RECORDS_EXTRACTED_TOTAL.get();
        record_records_extracted(3);
        assert!(RECORDS_EXTRACTED_TOTAL.get() >= before + 3.0);
    }

    #[test]
    fn test_candidate_coherence_gauge() {
        record_candidate_coherence(97, 0.42);
        assert_eq!(CANDIDATE_COHERENCE.with_label_values(&["97"]).get(), 0.42);
    }

    #[test]
    fn test_get_metrics_string() {
        record_page_reread();
        let metrics = get_metrics_string();
        assert!(metrics.contains("review_page_rereads_total"));
    }

    #[test]
    fn test_record_duration() {
        record_fetch_duration(0.5);
        assert!(FETCH_DURATION_SECONDS.get_sample_count() >= 1);
    }
}
