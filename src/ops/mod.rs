// * Operations
// * Structured logging setup and Prometheus metrics for pipeline runs

pub mod telemetry;

// * Re-exports for convenient access
pub use telemetry::{
    get_metrics_string, init_tracing, init_tracing_pretty, init_tracing_with_level,
    record_candidate_coherence, record_fetch_duration, record_page_fetched, record_page_reread,
    record_records_extracted, set_selected_topic_count,
};
