// * Latent Dirichlet Allocation
// * Collapsed Gibbs sampling over a bag-of-words corpus, seeded for reproducibility.
// * The document-topic prior is asymmetric and re-estimated from the data while sampling.

use crate::config::constants::{
    ALPHA_BURN_IN, ALPHA_UPDATE_EVERY, LDA_ETA, LDA_PASSES, RANDOM_SEED,
};
use crate::topics::vocabulary::{Corpus, TermId, Vocabulary};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

// * Lower bound on any alpha component so digamma stays finite
const MIN_ALPHA: f64 = 1e-5;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LdaError {
    #[error("Cannot fit a topic model on an empty corpus")]
    EmptyCorpus,

    #[error("Topic count must be at least 1")]
    NoTopics,

    #[error("No candidate topic counts to evaluate")]
    NoCandidates,

    #[error("Corpus references term {term} outside a vocabulary of {vocab_size} terms")]
    TermOutOfRange { term: TermId, vocab_size: usize },

    #[error("Sampling weights invalid: {0}")]
    Sampling(String),

    #[error("Non-finite {0} during training")]
    NonFinite(&'static str),
}

/// Training hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdaConfig {
    pub num_topics: usize,
    /// Full Gibbs sweeps over the corpus
    pub passes: usize,
    /// Symmetric topic-word prior
    pub eta: f64,
    pub seed: u64,
    /// Re-estimate alpha from the data ("auto"); otherwise it stays at 1 / num_topics
    pub learn_alpha: bool,
    pub alpha_update_every: usize,
    pub alpha_burn_in: usize,
}

impl Default for LdaConfig {
    fn default() -> Self {
        Self {
            num_topics: 3,
            passes: LDA_PASSES,
            eta: LDA_ETA,
            seed: RANDOM_SEED,
            learn_alpha: true,
            alpha_update_every: ALPHA_UPDATE_EVERY,
            alpha_burn_in: ALPHA_BURN_IN,
        }
    }
}

impl LdaConfig {
    pub fn with_topics(mut self, num_topics: usize) -> Self {
        self.num_topics = num_topics;
        self
    }
}

/// A fitted topic model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdaModel {
    num_topics: usize,
    vocab_size: usize,
    alpha: Vec<f64>,
    eta: f64,
    /// phi[t][w]
    topic_word: Vec<Vec<f64>>,
    /// theta[d][t]
    doc_topic: Vec<Vec<f64>>,
    /// Tokens assigned to each (topic, term) by the final sweep
    term_counts: Vec<Vec<usize>>,
}

// * Sampler state, dropped once the model is fitted
struct GibbsSampler {
    k: usize,
    v: usize,
    alpha: Vec<f64>,
    eta: f64,
    docs: Vec<Vec<TermId>>,
    z: Vec<Vec<usize>>,   // topic of each token position
    ndk: Vec<Vec<usize>>, // [doc][topic]
    nkw: Vec<Vec<usize>>, // [topic][word]
    nk: Vec<usize>,       // [topic]
    rng: StdRng,
}

impl GibbsSampler {
    fn new(docs: Vec<Vec<TermId>>, k: usize, v: usize, eta: f64, seed: u64) -> Self {
        let d = docs.len();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut z = Vec::with_capacity(d);
        let mut ndk = vec![vec![0usize; k]; d];
        let mut nkw = vec![vec![0usize; v]; k];
        let mut nk = vec![0usize; k];

        // * random initialization of topic assignments
        for (di, doc) in docs.iter().enumerate() {
            let mut assignments = Vec::with_capacity(doc.len());
            for &w in doc {
                let topic = rng.gen_range(0..k);
                assignments.push(topic);
                ndk[di][topic] += 1;
                nkw[topic][w] += 1;
                nk[topic] += 1;
            }
            z.push(assignments);
        }

        Self {
            k,
            v,
            alpha: vec![1.0 / k as f64; k],
            eta,
            docs,
            z,
            ndk,
            nkw,
            nk,
            rng,
        }
    }

    fn sweep(&mut self) -> Result<(), LdaError> {
        let vb = self.v as f64 * self.eta;
        let mut weights = vec![0.0f64; self.k];

        for di in 0..self.docs.len() {
            for pi in 0..self.docs[di].len() {
                let w = self.docs[di][pi];
                let old_t = self.z[di][pi];

                self.ndk[di][old_t] -= 1;
                self.nkw[old_t][w] -= 1;
                self.nk[old_t] -= 1;

                // * p(t) ∝ (ndk[d][t] + alpha[t]) * (nkw[t][w] + eta) / (nk[t] + V*eta)
                for (t, weight) in weights.iter_mut().enumerate() {
                    let left = self.ndk[di][t] as f64 + self.alpha[t];
                    let right = (self.nkw[t][w] as f64 + self.eta) / (self.nk[t] as f64 + vb);
                    *weight = left * right;
                }

                let index = WeightedIndex::new(&weights)
                    .map_err(|e| LdaError::Sampling(e.to_string()))?;
                let new_t = index.sample(&mut self.rng);

                self.z[di][pi] = new_t;
                self.ndk[di][new_t] += 1;
                self.nkw[new_t][w] += 1;
                self.nk[new_t] += 1;
            }
        }

        Ok(())
    }

    // * Minka fixed-point update of the asymmetric Dirichlet prior
    fn update_alpha(&mut self) -> Result<(), LdaError> {
        let alpha_sum: f64 = self.alpha.iter().sum();
        let denominator: f64 = self
            .docs
            .iter()
            .filter(|doc| !doc.is_empty())
            .map(|doc| digamma(doc.len() as f64 + alpha_sum) - digamma(alpha_sum))
            .sum();

        if denominator <= 0.0 {
            return Ok(());
        }

        for t in 0..self.k {
            let a = self.alpha[t];
            let numerator: f64 = self
                .docs
                .iter()
                .enumerate()
                .filter(|(_, doc)| !doc.is_empty())
                .map(|(di, _)| digamma(self.ndk[di][t] as f64 + a) - digamma(a))
                .sum();
            let updated = (a * numerator / denominator).max(MIN_ALPHA);

            if !updated.is_finite() {
                return Err(LdaError::NonFinite("alpha"));
            }
            self.alpha[t] = updated;
        }

        Ok(())
    }

    fn into_model(self) -> LdaModel {
        let alpha_sum: f64 = self.alpha.iter().sum();
        let vb = self.v as f64 * self.eta;

        // * theta[d][t] = (ndk[d][t] + alpha[t]) / (N_d + sum(alpha))
        let doc_topic = self
            .docs
            .iter()
            .enumerate()
            .map(|(d, doc)| {
                let denom = doc.len() as f64 + alpha_sum;
                (0..self.k)
                    .map(|t| (self.ndk[d][t] as f64 + self.alpha[t]) / denom)
                    .collect()
            })
            .collect();

        // * phi[t][w] = (nkw[t][w] + eta) / (nk[t] + V*eta)
        let topic_word = (0..self.k)
            .map(|t| {
                let denom = self.nk[t] as f64 + vb;
                (0..self.v)
                    .map(|w| (self.nkw[t][w] as f64 + self.eta) / denom)
                    .collect()
            })
            .collect();

        LdaModel {
            num_topics: self.k,
            vocab_size: self.v,
            alpha: self.alpha,
            eta: self.eta,
            topic_word,
            doc_topic,
            term_counts: self.nkw,
        }
    }
}

impl LdaModel {
    /// Fits a model on `corpus` whose term ids index a vocabulary of `vocab_size` terms.
    pub fn fit(corpus: &Corpus, vocab_size: usize, config: &LdaConfig) -> Result<Self, LdaError> {
        if config.num_topics == 0 {
            return Err(LdaError::NoTopics);
        }

        let mut docs: Vec<Vec<TermId>> = Vec::with_capacity(corpus.len());
        for bow in corpus {
            let mut tokens = Vec::new();
            for &(term, count) in bow {
                if term >= vocab_size {
                    return Err(LdaError::TermOutOfRange { term, vocab_size });
                }
                tokens.extend(std::iter::repeat(term).take(count));
            }
            docs.push(tokens);
        }

        if vocab_size == 0 || docs.iter().all(|d| d.is_empty()) {
            return Err(LdaError::EmptyCorpus);
        }

        let mut sampler = GibbsSampler::new(docs, config.num_topics, vocab_size, config.eta, config.seed);

        for pass in 0..config.passes {
            sampler.sweep()?;

            let done = pass + 1;
            if config.learn_alpha
                && done >= config.alpha_burn_in
                && config.alpha_update_every > 0
                && done % config.alpha_update_every == 0
            {
                sampler.update_alpha()?;
            }

            if done % 50 == 0 {
                debug!(topics = config.num_topics, "Training LDA: pass {}/{}", done, config.passes);
            }
        }

        Ok(sampler.into_model())
    }

    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    pub fn eta(&self) -> f64 {
        self.eta
    }

    /// Topic-term distributions, one row per topic
    pub fn topic_word(&self) -> &[Vec<f64>] {
        &self.topic_word
    }

    /// Document-topic distributions, one row per training document
    pub fn doc_topic(&self) -> &[Vec<f64>] {
        &self.doc_topic
    }

    pub fn document_topics(&self, doc: usize) -> Option<&[f64]> {
        self.doc_topic.get(doc).map(Vec::as_slice)
    }

    /// Top `topn` terms of `topic` by probability; equal probabilities keep id order
    pub fn topic_terms(&self, topic: usize, topn: usize) -> Vec<(TermId, f64)> {
        let Some(row) = self.topic_word.get(topic) else {
            return Vec::new();
        };
        let mut pairs: Vec<(TermId, f64)> = row.iter().copied().enumerate().collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        pairs.truncate(topn);
        pairs
    }

    /// Like `topic_terms`, but only terms with at least one token assigned to `topic`.
    /// An unused topic has no observed terms.
    pub fn observed_terms(&self, topic: usize, topn: usize) -> Vec<(TermId, f64)> {
        let Some(counts) = self.term_counts.get(topic) else {
            return Vec::new();
        };
        let mut terms = self.topic_terms(topic, self.vocab_size);
        terms.retain(|&(id, _)| counts.get(id).copied().unwrap_or(0) > 0);
        terms.truncate(topn);
        terms
    }

    pub fn term_count(&self, topic: usize, term: TermId) -> usize {
        self.term_counts
            .get(topic)
            .and_then(|row| row.get(term))
            .copied()
            .unwrap_or(0)
    }

    /// Observed top terms of every topic, the input to coherence scoring
    pub fn top_term_ids(&self, topn: usize) -> Vec<Vec<TermId>> {
        (0..self.num_topics)
            .map(|t| self.observed_terms(t, topn).into_iter().map(|(id, _)| id).collect())
            .collect()
    }

    /// Top words per topic as strings
    pub fn show_topics(&self, vocab: &Vocabulary, topn: usize) -> Vec<Vec<(String, f64)>> {
        (0..self.num_topics)
            .map(|t| {
                self.topic_terms(t, topn)
                    .into_iter()
                    .filter_map(|(id, p)| vocab.token(id).map(|w| (w.to_string(), p)))
                    .collect()
            })
            .collect()
    }
}

/// Digamma function: recurrence up to x >= 6, then the asymptotic series
pub(crate) fn digamma(mut x: f64) -> f64 {
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    result + x.ln()
        - 0.5 / x
        - f * (1.0 / 12.0 - f * (1.0 / 120.0 - f * (1.0 / 252.0 - f * (1.0 / 240.0 - f / 132.0))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_theme_corpus() -> (Corpus, Vocabulary) {
        let mut docs: Vec<Vec<String>> = Vec::new();
        for _ in 0..10 {
            docs.push("pool beach sun pool sand".split(' ').map(String::from).collect());
            docs.push("staff rude manager staff desk".split(' ').map(String::from).collect());
        }
        let vocab = Vocabulary::from_documents(&docs);
        (vocab.corpus(&docs), vocab)
    }

    #[test]
    fn test_digamma_known_values() {
        // * psi(1) = -gamma
        assert!((digamma(1.0) + 0.577_215_664_901_532_9).abs() < 1e-10);
        // * psi(0.5) = -gamma - 2 ln 2
        assert!((digamma(0.5) - (-1.963_510_026_021_423_5)).abs() < 1e-10);
        assert!((digamma(10.0) - 2.251_752_589_066_721).abs() < 1e-10);
    }

    #[test]
    fn test_distributions_are_normalized() {
        let (corpus, vocab) = two_theme_corpus();
        let model = LdaModel::fit(&corpus, vocab.len(), &LdaConfig::default().with_topics(2)).unwrap();

        for row in model.topic_word() {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
        for row in model.doc_topic() {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
        assert!(model.alpha().iter().all(|a| a.is_finite() && *a > 0.0));
    }

    #[test]
    fn test_separates_obvious_themes() {
        let (corpus, vocab) = two_theme_corpus();
        let model = LdaModel::fit(&corpus, vocab.len(), &LdaConfig::default().with_topics(2)).unwrap();

        let pool = vocab.id("pool").unwrap();
        let staff = vocab.id("staff").unwrap();
        let pool_topic = (0..2).max_by(|&a, &b| model.topic_word()[a][pool].total_cmp(&model.topic_word()[b][pool])).unwrap();
        let staff_topic = (0..2).max_by(|&a, &b| model.topic_word()[a][staff].total_cmp(&model.topic_word()[b][staff])).unwrap();
        assert_ne!(pool_topic, staff_topic);
    }

    #[test]
    fn test_same_seed_same_model() {
        let (corpus, vocab) = two_theme_corpus();
        let config = LdaConfig::default().with_topics(3);
        let a = LdaModel::fit(&corpus, vocab.len(), &config).unwrap();
        let b = LdaModel::fit(&corpus, vocab.len(), &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_bad_input() {
        let (corpus, vocab) = two_theme_corpus();
        assert_eq!(
            LdaModel::fit(&corpus, vocab.len(), &LdaConfig::default().with_topics(0)),
            Err(LdaError::NoTopics)
        );
        assert_eq!(
            LdaModel::fit(&vec![vec![], vec![]], 0, &LdaConfig::default()),
            Err(LdaError::EmptyCorpus)
        );
        assert!(matches!(
            LdaModel::fit(&vec![vec![(5, 1)]], 2, &LdaConfig::default()),
            Err(LdaError::TermOutOfRange { term: 5, vocab_size: 2 })
        ));
    }

    #[test]
    fn test_topic_terms_sorted() {
        let (corpus, vocab) = two_theme_corpus();
        let model = LdaModel::fit(&corpus, vocab.len(), &LdaConfig::default().with_topics(2)).unwrap();
        let terms = model.topic_terms(0, 4);
        assert_eq!(terms.len(), 4);
        assert!(terms.windows(2).all(|w| w[0].1 >= w[1].1));
        assert!(model.topic_terms(9, 4).is_empty());
        assert_eq!(model.show_topics(&vocab, 3)[1].len(), 3);
    }

    // * topic 1 holds no tokens; its prior-only terms must not surface by id order
    fn model_with_unused_topic() -> LdaModel {
        let eta = 0.01;
        let v = 4;
        let row = |counts: &[usize]| -> Vec<f64> {
            let nk: usize = counts.iter().sum();
            let denom = nk as f64 + v as f64 * eta;
            counts.iter().map(|&c| (c as f64 + eta) / denom).collect()
        };
        LdaModel {
            num_topics: 2,
            vocab_size: v,
            alpha: vec![0.5, 1e-5],
            eta,
            topic_word: vec![row(&[0, 0, 6, 3]), row(&[0, 0, 0, 0])],
            doc_topic: vec![vec![1.0, 0.0]],
            term_counts: vec![vec![0, 0, 6, 3], vec![0, 0, 0, 0]],
        }
    }

    #[test]
    fn test_unused_topic_has_no_observed_terms() {
        let model = model_with_unused_topic();

        assert_eq!(model.topic_terms(1, 2).len(), 2);
        assert!(model.observed_terms(1, 10).is_empty());

        let observed: Vec<TermId> = model.observed_terms(0, 10).into_iter().map(|(id, _)| id).collect();
        assert_eq!(observed, vec![2, 3]);
        assert_eq!(model.top_term_ids(10), vec![vec![2, 3], vec![]]);
        assert_eq!(model.term_count(0, 2), 6);
        assert_eq!(model.term_count(5, 2), 0);
    }

    #[test]
    fn test_unused_topic_scores_zero_coherence() {
        use crate::topics::coherence::{coherence_per_topic, CoherenceConfig};

        let model = model_with_unused_topic();
        // * terms 0 and 1 always co-occur, so id-order filler would score a perfect topic
        let docs = vec![vec![0, 1, 2, 3], vec![0, 1], vec![0, 1, 2], vec![3]];

        let window = CoherenceConfig::default().window;
        let scores = coherence_per_topic(&model.top_term_ids(10), &docs, window);
        assert_eq!(scores[1], 0.0);
        assert!(coherence_per_topic(&[vec![0, 1]], &docs, window)[0] > 0.9);
    }

    #[test]
    fn test_fitted_counts_match_corpus() {
        let (corpus, vocab) = two_theme_corpus();
        let model = LdaModel::fit(&corpus, vocab.len(), &LdaConfig::default().with_topics(2)).unwrap();
        let pool = vocab.id("pool").unwrap();
        let total: usize = (0..2).map(|t| model.term_count(t, pool)).sum();
        assert_eq!(total, 20);
    }
}
