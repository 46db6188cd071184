// * Topic Coherence (c_v)
// * Boolean sliding-window co-occurrence over the prepared documents, NPMI context vectors,
// * cosine against the topic's summed vector, averaged over terms and then over topics.

use crate::config::constants::{COHERENCE_TOP_N, COHERENCE_WINDOW};
use crate::topics::lda::LdaModel;
use crate::topics::vocabulary::TermId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const EPS: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoherenceConfig {
    /// Tokens per sliding window
    pub window: usize,
    /// Top terms taken from each topic
    pub top_n: usize,
}

impl Default for CoherenceConfig {
    fn default() -> Self {
        Self {
            window: COHERENCE_WINDOW,
            top_n: COHERENCE_TOP_N,
        }
    }
}

/// Document frequencies over boolean windows, restricted to a set of terms.
#[derive(Debug, Clone, Default)]
pub struct WindowCounts {
    windows: usize,
    single: HashMap<TermId, usize>,
    joint: HashMap<(TermId, TermId), usize>,
}

impl WindowCounts {
    /// Slides a window of `window` tokens over each document. A document no longer than the
    /// window counts as exactly one window.
    pub fn collect(docs: &[Vec<TermId>], relevant: &HashSet<TermId>, window: usize) -> Self {
        let window = window.max(1);
        let mut counts = Self::default();

        for doc in docs {
            if doc.len() <= window {
                counts.observe(doc, relevant);
            } else {
                for slice in doc.windows(window) {
                    counts.observe(slice, relevant);
                }
            }
        }

        counts
    }

    fn observe(&mut self, tokens: &[TermId], relevant: &HashSet<TermId>) {
        self.windows += 1;

        let mut present: Vec<TermId> = tokens
            .iter()
            .copied()
            .filter(|id| relevant.contains(id))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        present.sort_unstable();

        for (i, &a) in present.iter().enumerate() {
            *self.single.entry(a).or_insert(0) += 1;
            for &b in &present[i + 1..] {
                *self.joint.entry((a, b)).or_insert(0) += 1;
            }
        }
    }

    pub fn windows(&self) -> usize {
        self.windows
    }

    pub fn count(&self, id: TermId) -> usize {
        self.single.get(&id).copied().unwrap_or(0)
    }

    pub fn joint_count(&self, a: TermId, b: TermId) -> usize {
        if a == b {
            return self.count(a);
        }
        let key = if a < b { (a, b) } else { (b, a) };
        self.joint.get(&key).copied().unwrap_or(0)
    }

    /// Normalized pointwise mutual information in [-1, 1]
    pub fn npmi(&self, a: TermId, b: TermId) -> f64 {
        if self.windows == 0 {
            return 0.0;
        }
        let n = self.windows as f64;
        let p_a = self.count(a) as f64 / n;
        let p_b = self.count(b) as f64 / n;
        if p_a == 0.0 || p_b == 0.0 {
            return 0.0;
        }
        let p_ab = self.joint_count(a, b) as f64 / n;

        let pmi = ((p_ab + EPS) / (p_a * p_b)).ln();
        let denom = -(p_ab + EPS).ln();
        if denom.abs() < EPS {
            // * both terms in every window
            return 1.0;
        }
        pmi / denom
    }
}

/// c_v coherence of one topic given its top terms. Fewer than two terms have no pairs to
/// measure and score 0.
pub fn topic_coherence(terms: &[TermId], counts: &WindowCounts) -> f64 {
    if terms.len() < 2 {
        return 0.0;
    }

    let vectors: Vec<Vec<f64>> = terms
        .iter()
        .map(|&wi| terms.iter().map(|&wj| counts.npmi(wi, wj)).collect())
        .collect();

    let mut topic_vector = vec![0.0f64; terms.len()];
    for v in &vectors {
        for (acc, x) in topic_vector.iter_mut().zip(v) {
            *acc += x;
        }
    }

    let total: f64 = vectors.iter().map(|v| cosine(v, &topic_vector)).sum();
    total / terms.len() as f64
}

/// Per-topic c_v scores for already-selected top terms
pub fn coherence_per_topic(
    top_terms: &[Vec<TermId>],
    docs: &[Vec<TermId>],
    window: usize,
) -> Vec<f64> {
    let relevant: HashSet<TermId> = top_terms.iter().flatten().copied().collect();
    let counts = WindowCounts::collect(docs, &relevant, window);
    top_terms.iter().map(|terms| topic_coherence(terms, &counts)).collect()
}

/// Mean c_v over all topics of `model`, measured against the encoded documents.
/// Only terms the topic actually holds tokens for are ranked, so an unused topic scores 0.
pub fn model_coherence(model: &LdaModel, docs: &[Vec<TermId>], config: &CoherenceConfig) -> f64 {
    let top_terms = model.top_term_ids(config.top_n);
    let scores = coherence_per_topic(&top_terms, docs, config.window);
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}
