// * Vocabulary & Bag-of-Words
// * Bidirectional token <-> id mapping built once per run; ids assigned in first-seen order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type TermId = usize;

/// (term id, count) pairs, sorted by term id
pub type BagOfWords = Vec<(TermId, usize)>;

/// One bag of words per document, in document order
pub type Corpus = Vec<BagOfWords>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    id_to_token: Vec<String>,
    token_to_id: HashMap<String, TermId>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single pass over the documents, new tokens get the next free id
    pub fn from_documents(docs: &[Vec<String>]) -> Self {
        let mut vocab = Self::new();
        for doc in docs {
            for token in doc {
                vocab.add(token);
            }
        }
        vocab
    }

    /// Id of `token`, inserting it when unseen
    pub fn add(&mut self, token: &str) -> TermId {
        if let Some(&id) = self.token_to_id.get(token) {
            return id;
        }
        let id = self.id_to_token.len();
        self.id_to_token.push(token.to_string());
        self.token_to_id.insert(token.to_string(), id);
        id
    }

    pub fn id(&self, token: &str) -> Option<TermId> {
        self.token_to_id.get(token).copied()
    }

    pub fn token(&self, id: TermId) -> Option<&str> {
        self.id_to_token.get(id).map(String::as_str)
    }

    pub fn tokens(&self) -> &[String] {
        &self.id_to_token
    }

    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    /// Counts a document against the vocabulary. Unknown tokens are ignored.
    pub fn doc2bow(&self, doc: &[String]) -> BagOfWords {
        let mut counts: HashMap<TermId, usize> = HashMap::new();
        for token in doc {
            if let Some(id) = self.id(token) {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        let mut bow: BagOfWords = counts.into_iter().collect();
        bow.sort_unstable_by_key(|&(id, _)| id);
        bow
    }

    pub fn corpus(&self, docs: &[Vec<String>]) -> Corpus {
        docs.iter().map(|doc| self.doc2bow(doc)).collect()
    }

    /// Maps a document to term ids, keeping token order
    pub fn encode(&self, doc: &[String]) -> Vec<TermId> {
        doc.iter().filter_map(|token| self.id(token)).collect()
    }
}

impl From<Vec<String>> for Vocabulary {
    fn from(tokens: Vec<String>) -> Self {
        let mut vocab = Self::new();
        for token in &tokens {
            vocab.add(token);
        }
        vocab
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.id_to_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<Vec<String>> {
        vec![
            vec!["pool".into(), "clean".into(), "pool".into()],
            vec!["staff".into(), "clean".into()],
        ]
    }

    #[test]
    fn test_first_seen_ids() {
        let vocab = Vocabulary::from_documents(&docs());
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.id("pool"), Some(0));
        assert_eq!(vocab.id("clean"), Some(1));
        assert_eq!(vocab.id("staff"), Some(2));
    }

    #[test]
    fn test_ids_and_tokens_are_bijective() {
        let vocab = Vocabulary::from_documents(&docs());
        for (id, token) in vocab.tokens().iter().enumerate() {
            assert_eq!(vocab.id(token), Some(id));
            assert_eq!(vocab.token(id), Some(token.as_str()));
        }
        assert_eq!(vocab.token(3), None);
    }

    #[test]
    fn test_doc2bow_counts_and_sorts() {
        let vocab = Vocabulary::from_documents(&docs());
        let corpus = vocab.corpus(&docs());
        assert_eq!(corpus[0], vec![(0, 2), (1, 1)]);
        assert_eq!(corpus[1], vec![(1, 1), (2, 1)]);
    }

    #[test]
    fn test_unknown_tokens_ignored() {
        let vocab = Vocabulary::from_documents(&docs());
        assert!(vocab.doc2bow(&["museum".to_string()]).is_empty());
        assert_eq!(vocab.encode(&["museum".to_string(), "pool".to_string()]), vec![0]);
    }

    #[test]
    fn test_serde_roundtrip_keeps_ids() {
        let vocab = Vocabulary::from_documents(&docs());
        let json = serde_json::to_string(&vocab).unwrap();
        assert_eq!(json, r#"["pool","clean","staff"]"#);
        let back: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vocab);
    }
}
