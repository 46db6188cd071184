// * The Refinery (Review Extraction & Text Preparation)
// * Goal: Turn review pages into records, and review text into modeling-ready tokens.

pub mod collocations;
pub mod extractor;
pub mod normalizer;
pub mod rating;

// * Re-exports for convenient access
pub use collocations::{CollocationBuilder, Collocations, PhraseConfig, PhraseModel};
pub use extractor::{extract_by_name, ExtractError, FieldSizes, ReviewRecord, ScrapeResult, Site};
pub use normalizer::{StopWords, TextNormalizer};
pub use rating::decode_rating;

/// Normalizes and phrase-folds a set of review texts.
///
/// The collocations are learned on the normalized texts of this call, so the returned
/// documents are only comparable with each other, not with another run.
pub fn prepare_documents<'a, I>(
    texts: I,
    normalizer: &TextNormalizer,
    builder: &CollocationBuilder,
) -> Vec<Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let normalized = normalizer.normalize_all(texts);
    let collocations = builder.learn(&normalized);
    collocations.fold_all(&normalized)
}
