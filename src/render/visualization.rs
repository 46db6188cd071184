// * Topic Map
// * Everything an inter-topic distance map needs, derived from (model, corpus, vocabulary) alone:
// * Jensen-Shannon distances projected to 2D by principal coordinates, topic prevalence,
// * relevance-ranked terms per topic, globally salient terms and per-document topic mixtures.

use crate::config::constants::{VIS_RELEVANCE_LAMBDA, VIS_TOP_TERMS};
use crate::render::RenderError;
use crate::topics::lda::LdaModel;
use crate::topics::vocabulary::{Corpus, Vocabulary};
use serde::{Deserialize, Serialize};

const JACOBI_SWEEPS: usize = 100;
const JACOBI_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevantTerm {
    pub term: String,
    /// lambda * log p(w|t) + (1 - lambda) * log(p(w|t) / p(w))
    pub relevance: f64,
    pub probability: f64,
    /// Estimated occurrences of the term attributed to this topic
    pub topic_frequency: f64,
    pub corpus_frequency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    /// Index of the topic in the model
    pub topic: usize,
    pub x: f64,
    pub y: f64,
    /// Share of all tokens, in [0, 1]
    pub prevalence: f64,
    pub terms: Vec<RelevantTerm>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalientTerm {
    pub term: String,
    pub saliency: f64,
    pub corpus_frequency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicMap {
    pub lambda: f64,
    pub topics: Vec<TopicSummary>,
    pub salient_terms: Vec<SalientTerm>,
    pub doc_topics: Vec<Vec<f64>>,
}

pub fn render_visualization(
    model: &LdaModel,
    corpus: &Corpus,
    vocabulary: &Vocabulary,
) -> Result<TopicMap, RenderError> {
    TopicMap::build(model, corpus, vocabulary, VIS_RELEVANCE_LAMBDA, VIS_TOP_TERMS)
}

impl TopicMap {
    pub fn build(
        model: &LdaModel,
        corpus: &Corpus,
        vocabulary: &Vocabulary,
        lambda: f64,
        top_terms: usize,
    ) -> Result<Self, RenderError> {
        check_shapes(model, corpus, vocabulary)?;

        let k = model.num_topics();
        let v = vocabulary.len();
        let phi = model.topic_word();
        let theta = model.doc_topic();

        let mut term_counts = vec![0usize; v];
        let mut doc_lengths = Vec::with_capacity(corpus.len());
        for bow in corpus {
            let mut length = 0;
            for &(id, count) in bow {
                term_counts[id] += count;
                length += count;
            }
            doc_lengths.push(length as f64);
        }
        let total_tokens: usize = term_counts.iter().sum();
        if total_tokens == 0 {
            return Err(RenderError::Mismatch("corpus contains no tokens".to_string()));
        }

        // * topic_freq[t] = sum_d theta[d][t] * N_d
        let mut topic_freq = vec![0.0f64; k];
        for (row, &n) in theta.iter().zip(&doc_lengths) {
            for (acc, p) in topic_freq.iter_mut().zip(row) {
                *acc += p * n;
            }
        }
        let freq_sum: f64 = topic_freq.iter().sum();
        let prevalence: Vec<f64> = topic_freq.iter().map(|f| f / freq_sum).collect();

        let term_share: Vec<f64> = term_counts
            .iter()
            .map(|&c| c as f64 / total_tokens as f64)
            .collect();

        let coords = principal_coordinates(&distance_matrix(phi));

        let topics = (0..k)
            .map(|t| TopicSummary {
                topic: t,
                x: coords[t].0,
                y: coords[t].1,
                prevalence: prevalence[t],
                terms: relevant_terms(
                    &phi[t],
                    &term_share,
                    &term_counts,
                    topic_freq[t],
                    vocabulary,
                    lambda,
                    top_terms,
                ),
            })
            .collect();

        let salient_terms = salient_terms(phi, &prevalence, &term_share, &term_counts, vocabulary, top_terms);

        Ok(Self {
            lambda,
            topics,
            salient_terms,
            doc_topics: theta.to_vec(),
        })
    }

    /// JSON payload with `</` escaped so it can sit inside a script element
    pub fn to_embedded_json(&self) -> Result<String, RenderError> {
        Ok(serde_json::to_string(self)?.replace("</", "<\\/"))
    }

    /// A standalone HTML document: SVG distance map, per-topic term tables and the raw payload.
    pub fn to_html(&self, title: &str) -> Result<String, RenderError> {
        let json = self.to_embedded_json()?;
        let title = escape_html(title);

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str(&format!("<title>{}</title>\n", title));
        html.push_str(STYLE);
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!("<h1>{}</h1>\n", title));
        html.push_str("<section class=\"map\">\n<h2>Intertopic distance map</h2>\n");
        html.push_str(&self.svg_map());
        html.push_str("</section>\n<section class=\"topics\">\n");

        for topic in &self.topics {
            html.push_str(&format!(
                "<div class=\"topic\">\n<h3>Topic {} ({:.1}% of tokens)</h3>\n<table>\n<tr><th>Term</th><th>Relevance</th><th>p(w|t)</th><th>Count in topic</th><th>Total</th></tr>\n",
                topic.topic + 1,
                topic.prevalence * 100.0
            ));
            for term in &topic.terms {
                html.push_str(&format!(
                    "<tr><td>{}</td><td>{:.3}</td><td>{:.4}</td><td>{:.1}</td><td>{}</td></tr>\n",
                    escape_html(&term.term),
                    term.relevance,
                    term.probability,
                    term.topic_frequency,
                    term.corpus_frequency
                ));
            }
            html.push_str("</table>\n</div>\n");
        }

        html.push_str("</section>\n<section class=\"salient\">\n<h2>Most salient terms</h2>\n<ol>\n");
        for term in &self.salient_terms {
            html.push_str(&format!(
                "<li>{} <span>{:.4}</span></li>\n",
                escape_html(&term.term),
                term.saliency
            ));
        }
        html.push_str("</ol>\n</section>\n");
        html.push_str(&format!(
            "<script type=\"application/json\" id=\"topic-map-data\">{}</script>\n",
            json
        ));
        html.push_str("</body>\n</html>\n");

        Ok(html)
    }

    fn svg_map(&self) -> String {
        const SIZE: f64 = 480.0;
        const PAD: f64 = 60.0;

        let (min_x, max_x) = bounds(self.topics.iter().map(|t| t.x));
        let (min_y, max_y) = bounds(self.topics.iter().map(|t| t.y));
        let project = |value: f64, min: f64, max: f64| {
            if (max - min).abs() < f64::EPSILON {
                SIZE / 2.0
            } else {
                PAD + (value - min) / (max - min) * (SIZE - 2.0 * PAD)
            }
        };

        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{0}\" height=\"{0}\" viewBox=\"0 0 {0} {0}\">\n",
            SIZE
        );
        svg.push_str(&format!(
            "<line x1=\"0\" y1=\"{h}\" x2=\"{s}\" y2=\"{h}\" class=\"axis\"/><line x1=\"{h}\" y1=\"0\" x2=\"{h}\" y2=\"{s}\" class=\"axis\"/>\n",
            h = SIZE / 2.0,
            s = SIZE
        ));
        for topic in &self.topics {
            let cx = project(topic.x, min_x, max_x);
            // * PC2 grows upwards
            let cy = SIZE - project(topic.y, min_y, max_y);
            let r = 8.0 + 40.0 * topic.prevalence.sqrt();
            svg.push_str(&format!(
                "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{:.1}\"><title>Topic {}: {:.1}%</title></circle>\n<text x=\"{:.1}\" y=\"{:.1}\">{}</text>\n",
                cx,
                cy,
                r,
                topic.topic + 1,
                topic.prevalence * 100.0,
                cx,
                cy + 4.0,
                topic.topic + 1
            ));
        }
        svg.push_str("</svg>\n");
        svg
    }
}

const STYLE: &str = "<style>\nbody{font-family:sans-serif;margin:2em;color:#222}\n\
circle{fill:#1f77b4;fill-opacity:.45;stroke:#1f77b4}\n\
text{text-anchor:middle;font-size:12px}\n\
.axis{stroke:#ccc}\n\
.topic{display:inline-block;vertical-align:top;margin:0 2em 2em 0}\n\
table{border-collapse:collapse;font-size:13px}\n\
td,th{padding:2px 8px;border-bottom:1px solid #eee;text-align:left}\n\
</style>\n";

fn check_shapes(model: &LdaModel, corpus: &Corpus, vocabulary: &Vocabulary) -> Result<(), RenderError> {
    if model.vocab_size() != vocabulary.len() {
        return Err(RenderError::Mismatch(format!(
            "model has {} terms, vocabulary has {}",
            model.vocab_size(),
            vocabulary.len()
        )));
    }
    if model.doc_topic().len() != corpus.len() {
        return Err(RenderError::Mismatch(format!(
            "model was fitted on {} documents, corpus has {}",
            model.doc_topic().len(),
            corpus.len()
        )));
    }
    if let Some(&(id, _)) = corpus.iter().flatten().find(|(id, _)| *id >= vocabulary.len()) {
        return Err(RenderError::Mismatch(format!(
            "term id {} outside vocabulary of {} terms",
            id,
            vocabulary.len()
        )));
    }
    Ok(())
}

fn relevant_terms(
    phi_t: &[f64],
    term_share: &[f64],
    term_counts: &[usize],
    topic_freq: f64,
    vocabulary: &Vocabulary,
    lambda: f64,
    top_terms: usize,
) -> Vec<RelevantTerm> {
    let mut scored: Vec<(usize, f64)> = phi_t
        .iter()
        .zip(term_share)
        .enumerate()
        .filter(|(_, (_, share))| **share > 0.0)
        .map(|(w, (&p, &share))| (w, lambda * p.ln() + (1.0 - lambda) * (p / share).ln()))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(top_terms);

    scored
        .into_iter()
        .filter_map(|(w, relevance)| {
            vocabulary.token(w).map(|term| RelevantTerm {
                term: term.to_string(),
                relevance,
                probability: phi_t[w],
                topic_frequency: phi_t[w] * topic_freq,
                corpus_frequency: term_counts[w],
            })
        })
        .collect()
}

// * saliency(w) = p(w) * sum_t p(t|w) log(p(t|w) / p(t))
fn salient_terms(
    phi: &[Vec<f64>],
    prevalence: &[f64],
    term_share: &[f64],
    term_counts: &[usize],
    vocabulary: &Vocabulary,
    top_terms: usize,
) -> Vec<SalientTerm> {
    let mut scored: Vec<(usize, f64)> = (0..term_share.len())
        .filter(|&w| term_counts[w] > 0)
        .map(|w| {
            let joint: Vec<f64> = phi.iter().zip(prevalence).map(|(row, p)| row[w] * p).collect();
            let norm: f64 = joint.iter().sum();
            let distinctiveness: f64 = joint
                .iter()
                .zip(prevalence)
                .filter(|(j, p)| **j > 0.0 && **p > 0.0)
                .map(|(j, p)| {
                    let posterior = j / norm;
                    posterior * (posterior / p).ln()
                })
                .sum();
            (w, term_share[w] * distinctiveness)
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(top_terms);

    scored
        .into_iter()
        .filter_map(|(w, saliency)| {
            vocabulary.token(w).map(|term| SalientTerm {
                term: term.to_string(),
                saliency,
                corpus_frequency: term_counts[w],
            })
        })
        .collect()
}

/// Jensen-Shannon divergence (natural log)
pub fn jensen_shannon(p: &[f64], q: &[f64]) -> f64 {
    let kl = |a: &[f64], m: &[f64]| -> f64 {
        a.iter()
            .zip(m)
            .filter(|(x, _)| **x > 0.0)
            .map(|(x, y)| x * (x / y).ln())
            .sum()
    };
    let m: Vec<f64> = p.iter().zip(q).map(|(a, b)| 0.5 * (a + b)).collect();
    0.5 * kl(p, &m) + 0.5 * kl(q, &m)
}

fn distance_matrix(phi: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let k = phi.len();
    let mut d = vec![vec![0.0; k]; k];
    for i in 0..k {
        for j in (i + 1)..k {
            let dist = jensen_shannon(&phi[i], &phi[j]);
            d[i][j] = dist;
            d[j][i] = dist;
        }
    }
    d
}

/// Classical multidimensional scaling onto two axes.
pub fn principal_coordinates(distances: &[Vec<f64>]) -> Vec<(f64, f64)> {
    let n = distances.len();
    if n < 2 {
        return vec![(0.0, 0.0); n];
    }

    // * B = -1/2 * J D^2 J with J the centering matrix
    let sq: Vec<Vec<f64>> = distances
        .iter()
        .map(|row| row.iter().map(|d| d * d).collect())
        .collect();
    let row_means: Vec<f64> = sq.iter().map(|r| r.iter().sum::<f64>() / n as f64).collect();
    let grand_mean = row_means.iter().sum::<f64>() / n as f64;
    let b: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| -0.5 * (sq[i][j] - row_means[i] - row_means[j] + grand_mean))
                .collect()
        })
        .collect();

    let (values, vectors) = jacobi_eigen(b);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &c| values[c].total_cmp(&values[a]));

    let axis = |rank: usize, i: usize| -> f64 {
        match order.get(rank) {
            Some(&col) => vectors[i][col] * values[col].max(0.0).sqrt(),
            None => 0.0,
        }
    };
    (0..n).map(|i| (axis(0, i), axis(1, i))).collect()
}

// * Cyclic Jacobi rotations; returns eigenvalues and eigenvectors as columns
fn jacobi_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for _ in 0..JACOBI_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum();
        if off < JACOBI_TOLERANCE {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q].abs() < f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[k][p];
                    let akq = a[k][q];
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[p][k];
                    let aqk = a[q][k];
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let vp = row[p];
                    let vq = row[q];
                    row[p] = c * vp - s * vq;
                    row[q] = s * vp + c * vq;
                }
            }
        }
    }

    let values = (0..n).map(|i| a[i][i]).collect();
    (values, v)
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| (lo.min(x), hi.max(x)))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
