// * Text Normalizer
// * Turns a review into lowercase, accent-free, stop-word-free tokens.

use crate::config::constants::{MAX_TOKEN_LEN, MIN_TOKEN_LEN};
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

// * English stop words (NLTK list)
const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// A stop-word set, injected into the normalizer and the word cloud.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// The English stop-word list.
    pub fn english() -> Self {
        ENGLISH_STOPWORDS.iter().copied().collect()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn insert(&mut self, word: impl Into<String>) {
        self.words.insert(word.into());
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for StopWords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Tokenizer for review text.
///
/// Tokens are maximal runs of letters, between `MIN_TOKEN_LEN` and `MAX_TOKEN_LEN`
/// characters long. Digits and punctuation split tokens and are dropped.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    stopwords: StopWords,
    min_len: usize,
    max_len: usize,
}

impl TextNormalizer {
    pub fn new(stopwords: StopWords) -> Self {
        Self {
            stopwords,
            min_len: MIN_TOKEN_LEN,
            max_len: MAX_TOKEN_LEN,
        }
    }

    pub fn with_token_bounds(mut self, min_len: usize, max_len: usize) -> Self {
        self.min_len = min_len;
        self.max_len = max_len;
        self
    }

    pub fn stopwords(&self) -> &StopWords {
        &self.stopwords
    }

    pub fn normalize(&self, text: &str) -> Vec<String> {
        let folded = deaccent(&text.to_lowercase());

        folded
            .unicode_words()
            .flat_map(|word| word.split(|c: char| !c.is_alphabetic()))
            .filter(|token| {
                let len = token.chars().count();
                len >= self.min_len && len <= self.max_len
            })
            .filter(|token| !self.stopwords.contains(token))
            .map(str::to_string)
            .collect()
    }

    pub fn normalize_all<'a, I>(&self, texts: I) -> Vec<Vec<String>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        texts.into_iter().map(|t| self.normalize(t)).collect()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(StopWords::english())
    }
}

// * Canonical decomposition, then drop the combining marks
fn deaccent(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}
