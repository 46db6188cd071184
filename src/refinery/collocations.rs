// * Collocation Builder
// * Learns bigram and trigram phrases from a tokenized corpus and folds them into single tokens.

use crate::config::constants::{PHRASE_DELIMITER, PHRASE_MIN_COUNT, PHRASE_THRESHOLD};
use std::collections::HashMap;
use tracing::debug;

/// Thresholds for phrase detection
#[derive(Debug, Clone)]
pub struct PhraseConfig {
    /// Minimum joint count of a pair
    pub min_count: usize,
    /// Minimum score of a pair
    pub threshold: f64,
    /// Joiner placed between the parts of a fused phrase
    pub delimiter: String,
}

impl Default for PhraseConfig {
    fn default() -> Self {
        Self {
            min_count: PHRASE_MIN_COUNT,
            threshold: PHRASE_THRESHOLD,
            delimiter: PHRASE_DELIMITER.to_string(),
        }
    }
}

/// A learned set of adjacent token pairs that get fused.
#[derive(Debug, Clone, Default)]
pub struct PhraseModel {
    phrases: HashMap<(String, String), f64>,
    delimiter: String,
}

impl PhraseModel {
    /// Counts adjacent pairs over the whole corpus and keeps the ones that co-occur more
    /// than chance would explain.
    ///
    /// score(a, b) = (count(a b) - min_count) / (count(a) * count(b)) * vocabulary_size
    ///
    /// where vocabulary_size counts distinct tokens plus distinct pairs. A pair becomes a
    /// phrase when count(a b) >= min_count and score >= threshold.
    pub fn learn(corpus: &[Vec<String>], config: &PhraseConfig) -> Self {
        let mut unigrams: HashMap<&str, usize> = HashMap::new();
        let mut pairs: HashMap<(&str, &str), usize> = HashMap::new();

        for doc in corpus {
            for token in doc {
                *unigrams.entry(token.as_str()).or_insert(0) += 1;
            }
            for window in doc.windows(2) {
                *pairs
                    .entry((window[0].as_str(), window[1].as_str()))
                    .or_insert(0) += 1;
            }
        }

        let vocab_size = (unigrams.len() + pairs.len()) as f64;
        let mut phrases = HashMap::new();

        for (&(a, b), &joint) in &pairs {
            if joint < config.min_count {
                continue;
            }
            let count_a = unigrams[a] as f64;
            let count_b = unigrams[b] as f64;
            let score = (joint - config.min_count) as f64 / (count_a * count_b) * vocab_size;

            if score >= config.threshold {
                phrases.insert((a.to_string(), b.to_string()), score);
            }
        }

        debug!(
            pairs = pairs.len(),
            phrases = phrases.len(),
            "Phrase model learned"
        );

        Self {
            phrases,
            delimiter: config.delimiter.clone(),
        }
    }

    /// Score of a learned phrase, `None` when the pair was not fused
    pub fn score(&self, a: &str, b: &str) -> Option<f64> {
        self.phrases.get(&(a.to_string(), b.to_string())).copied()
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Left-to-right greedy fold: a fused pair consumes both tokens.
    pub fn apply(&self, doc: &[String]) -> Vec<String> {
        let mut folded = Vec::with_capacity(doc.len());
        let mut i = 0;

        while i < doc.len() {
            if i + 1 < doc.len() {
                let key = (doc[i].clone(), doc[i + 1].clone());
                if self.phrases.contains_key(&key) {
                    folded.push(format!("{}{}{}", doc[i], self.delimiter, doc[i + 1]));
                    i += 2;
                    continue;
                }
            }
            folded.push(doc[i].clone());
            i += 1;
        }

        folded
    }
}

/// Bigram model plus a trigram model learned on bigram-folded text.
#[derive(Debug, Clone, Default)]
pub struct Collocations {
    pub bigrams: PhraseModel,
    pub trigrams: PhraseModel,
}

impl Collocations {
    /// Folds bigrams first, then trigrams. The order matters: a trigram is a learned
    /// pair over already-folded tokens.
    pub fn fold(&self, doc: &[String]) -> Vec<String> {
        self.trigrams.apply(&self.bigrams.apply(doc))
    }

    pub fn fold_all(&self, corpus: &[Vec<String>]) -> Vec<Vec<String>> {
        corpus.iter().map(|doc| self.fold(doc)).collect()
    }
}

/// Learns `Collocations` for a corpus
#[derive(Debug, Clone, Default)]
pub struct CollocationBuilder {
    config: PhraseConfig,
}

impl CollocationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PhraseConfig) -> Self {
        Self { config }
    }

    pub fn learn(&self, corpus: &[Vec<String>]) -> Collocations {
        let bigrams = PhraseModel::learn(corpus, &self.config);
        let bigram_folded: Vec<Vec<String>> = corpus.iter().map(|doc| bigrams.apply(doc)).collect();
        let trigrams = PhraseModel::learn(&bigram_folded, &self.config);

        Collocations { bigrams, trigrams }
    }
}
