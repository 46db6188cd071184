// * Topic Selector
// * Builds the vocabulary and bag-of-words corpus, then either fits one model at a fixed topic
// * count or searches the candidate range and keeps the most coherent model.

use crate::config::constants::{CANDIDATE_TOPICS_END, CANDIDATE_TOPICS_START};
use crate::ops::telemetry;
use crate::topics::coherence::{model_coherence, CoherenceConfig};
use crate::topics::lda::{LdaConfig, LdaError, LdaModel};
use crate::topics::vocabulary::{Corpus, TermId, Vocabulary};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::info;

/// A fitted model together with its coherence score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicModelCandidate {
    pub topic_count: usize,
    pub model: LdaModel,
    pub coherence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Topic counts tried in the free search, in order
    pub candidates: Range<usize>,
    /// Base training settings; `num_topics` is overridden per candidate
    pub lda: LdaConfig,
    pub coherence: CoherenceConfig,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            candidates: CANDIDATE_TOPICS_START..CANDIDATE_TOPICS_END,
            lda: LdaConfig::default(),
            coherence: CoherenceConfig::default(),
        }
    }
}

/// Output of a selection: the retained model and the corpus it was fitted on
#[derive(Debug, Clone)]
pub struct TopicSelection {
    pub best: TopicModelCandidate,
    pub corpus: Corpus,
    pub vocabulary: Vocabulary,
    /// (topic count, coherence) of every candidate evaluated, in evaluation order
    pub scores: Vec<(usize, f64)>,
}

#[derive(Debug, Clone, Default)]
pub struct TopicSelector {
    config: SelectorConfig,
}

impl TopicSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Fits at `fixed_topic_count` when given, otherwise searches the candidate range.
    pub fn select(
        &self,
        docs: &[Vec<String>],
        fixed_topic_count: Option<usize>,
    ) -> Result<TopicSelection, LdaError> {
        let vocabulary = Vocabulary::from_documents(docs);
        let corpus = vocabulary.corpus(docs);
        let encoded: Vec<Vec<TermId>> = docs.iter().map(|doc| vocabulary.encode(doc)).collect();

        info!(
            documents = docs.len(),
            vocabulary = vocabulary.len(),
            "Corpus ready for topic modeling"
        );

        let counts: Vec<usize> = match fixed_topic_count {
            Some(k) => vec![k],
            None => self.config.candidates.clone().collect(),
        };

        let mut scores = Vec::with_capacity(counts.len());
        let best = counts
            .into_iter()
            .try_fold(None, |best: Option<TopicModelCandidate>, k| {
                let candidate = self.evaluate(&corpus, &encoded, vocabulary.len(), k)?;
                scores.push((candidate.topic_count, candidate.coherence));
                Ok::<_, LdaError>(Some(keep_best(best, candidate)))
            })?
            .ok_or(LdaError::NoCandidates)?;

        telemetry::set_selected_topic_count(best.topic_count);
        info!(
            topics = best.topic_count,
            coherence = best.coherence,
            "Topic model selected"
        );

        Ok(TopicSelection {
            best,
            corpus,
            vocabulary,
            scores,
        })
    }

    /// Fits one model at `topic_count` and scores it
    pub fn evaluate(
        &self,
        corpus: &Corpus,
        encoded: &[Vec<TermId>],
        vocab_size: usize,
        topic_count: usize,
    ) -> Result<TopicModelCandidate, LdaError> {
        let lda = self.config.lda.clone().with_topics(topic_count);
        let model = LdaModel::fit(corpus, vocab_size, &lda)?;
        let coherence = model_coherence(&model, encoded, &self.config.coherence);

        if !coherence.is_finite() {
            return Err(LdaError::NonFinite("coherence"));
        }

        telemetry::record_candidate_coherence(topic_count, coherence);
        info!(topics = topic_count, coherence = coherence, "Candidate model scored");

        Ok(TopicModelCandidate {
            topic_count,
            model,
            coherence,
        })
    }
}

/// Keeps the incumbent unless the challenger scores strictly higher.
pub fn keep_best(
    best: Option<TopicModelCandidate>,
    candidate: TopicModelCandidate,
) -> TopicModelCandidate {
    match best {
        Some(current) if current.coherence >= candidate.coherence => current,
        _ => candidate,
    }
}
