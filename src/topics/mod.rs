// * Topic Modeling
// * Vocabulary and bag-of-words corpus, seeded LDA, c_v coherence and topic-count selection.

pub mod coherence;
pub mod lda;
pub mod selector;
pub mod vocabulary;

// * Re-exports for convenient access
pub use coherence::{model_coherence, CoherenceConfig, WindowCounts};
pub use lda::{LdaConfig, LdaError, LdaModel};
pub use selector::{keep_best, SelectorConfig, TopicModelCandidate, TopicSelection, TopicSelector};
pub use vocabulary::{BagOfWords, Corpus, TermId, Vocabulary};
