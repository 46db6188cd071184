// * Configuration Constants
// * Central location for all configurable thresholds and timeouts

// * Page fetch timeout in milliseconds
pub const PAGE_TIMEOUT_MS: u64 = 60_000;

// * Default wait between page requests (and between re-reads of a failed page)
pub const DEFAULT_WAIT_SECS: f64 = 1.0;

// * Default page offset step (review sites page in blocks of 10)
pub const DEFAULT_INCREMENT: usize = 10;

// * Minimum joint occurrences before a token pair can become a phrase
pub const PHRASE_MIN_COUNT: usize = 3;

// * Minimum collocation score for a token pair to be fused
pub const PHRASE_THRESHOLD: f64 = 50.0;

// * Joiner used when folding a phrase into a single token
pub const PHRASE_DELIMITER: &str = "_";

// * Token length bounds applied by the text normalizer
pub const MIN_TOKEN_LEN: usize = 2;
pub const MAX_TOKEN_LEN: usize = 15;

// * Topic counts tried by the free search (end exclusive)
pub const CANDIDATE_TOPICS_START: usize = 2;
pub const CANDIDATE_TOPICS_END: usize = 6;

// * Topic count used by the default end-to-end run
pub const DEFAULT_FIXED_TOPICS: usize = 3;

// * Seed shared by every model fit so runs are reproducible
pub const RANDOM_SEED: u64 = 100;

// * Gibbs sweeps over the corpus per model fit
pub const LDA_PASSES: usize = 200;

// * Sweeps between two alpha re-estimations, and sweeps before the first one
pub const ALPHA_UPDATE_EVERY: usize = 10;
pub const ALPHA_BURN_IN: usize = 50;

// * Symmetric topic-word prior
pub const LDA_ETA: f64 = 0.01;

// * Boolean sliding window size for c_v coherence
pub const COHERENCE_WINDOW: usize = 110;

// * Number of top terms per topic scored by coherence
pub const COHERENCE_TOP_N: usize = 10;

// * Terms listed per topic in the visualization and relevance weight
pub const VIS_TOP_TERMS: usize = 30;
pub const VIS_RELEVANCE_LAMBDA: f64 = 0.6;

// * Word cloud canvas defaults
pub const WORDCLOUD_WIDTH: u32 = 400;
pub const WORDCLOUD_HEIGHT: u32 = 200;
pub const WORDCLOUD_MAX_WORDS: usize = 200;
pub const WORDCLOUD_MAX_SCALE: u32 = 8;
