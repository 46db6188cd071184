// * Site Extractor
// * Pulls review text, title, rating marker and date out of one review page.
// * Each supported site is a variant of a closed enum, chosen once at configuration time.

use crate::refinery::rating::decode_rating;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

// * TripAdvisor: nested review containers
static TA_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".review-container").expect("Invalid container selector"));
static TA_BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".entry").expect("Invalid body selector"));
static TA_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".noQuotes").expect("Invalid title selector"));
static TA_DATE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".ratingDate").expect("Invalid date selector"));

// * Yelp: flat review blocks, no titles
static YELP_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".review-content").expect("Invalid container selector"));
static YELP_BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("Invalid body selector"));
static YELP_RATING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".biz-rating").expect("Invalid rating selector"));
static YELP_DATE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".rating-qualifier").expect("Invalid date selector"));

// * Prefix Yelp puts in front of the date of an edited review
const UPDATED_REVIEW_PREFIX: &str = "Updated review";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractError {
    #[error("The site {0} is not supported")]
    UnsupportedSite(String),
}

/// Review sites the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Site {
    TripAdvisor,
    Yelp,
}

impl Site {
    pub const ALL: [Site; 2] = [Site::TripAdvisor, Site::Yelp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Site::TripAdvisor => "tripadvisor",
            Site::Yelp => "yelp",
        }
    }

    /// Extracts every review block on one page of this site.
    pub fn extract(&self, markup: &str) -> ScrapeResult {
        let document = Html::parse_document(markup);
        let columns = match self {
            Site::TripAdvisor => extract_tripadvisor(&document),
            Site::Yelp => extract_yelp(&document),
        };
        columns.into_result()
    }

    /// Decodes a rating marker using this site's marker set.
    pub fn decode_rating(&self, markup: &str) -> f64 {
        decode_rating(markup, *self)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Site {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tripadvisor" => Ok(Site::TripAdvisor),
            "yelp" => Ok(Site::Yelp),
            _ => Err(ExtractError::UnsupportedSite(s.to_string())),
        }
    }
}

impl TryFrom<String> for Site {
    type Error = ExtractError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One review as scraped from a page. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub text: String,
    pub title: String,
    pub rating: f64,
    pub date: String,
    /// `text + " " + title`, the document fed to topic modeling
    pub full_text: String,
}

impl ReviewRecord {
    pub fn new(text: String, title: String, rating: f64, date: String) -> Self {
        let full_text = format!("{} {}", text, title);
        Self {
            text,
            title,
            rating,
            date,
            full_text,
        }
    }
}

/// Lengths of the per-field sequences pulled from a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldSizes {
    pub texts: usize,
    pub titles: usize,
    pub ratings: usize,
    pub dates: usize,
}

impl FieldSizes {
    pub fn is_consistent(&self) -> bool {
        self.texts == self.titles && self.texts == self.ratings && self.texts == self.dates
    }

    fn shortest(&self) -> usize {
        self.texts.min(self.titles).min(self.ratings).min(self.dates)
    }
}

/// Outcome of extracting one page.
///
/// `success` is false when the field sequences disagree in length. The records are then
/// only the rows that every field covers, and should not be trusted for alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub records: Vec<ReviewRecord>,
    pub success: bool,
    pub sizes: FieldSizes,
}

// * Four parallel sequences built container by container
#[derive(Debug, Default)]
struct ReviewColumns {
    texts: Vec<String>,
    titles: Vec<String>,
    ratings: Vec<f64>,
    dates: Vec<String>,
}

impl ReviewColumns {
    fn sizes(&self) -> FieldSizes {
        FieldSizes {
            texts: self.texts.len(),
            titles: self.titles.len(),
            ratings: self.ratings.len(),
            dates: self.dates.len(),
        }
    }

    fn into_result(self) -> ScrapeResult {
        let sizes = self.sizes();
        let success = sizes.is_consistent();

        debug!(
            texts = sizes.texts,
            titles = sizes.titles,
            ratings = sizes.ratings,
            dates = sizes.dates,
            consistent = success,
            "Extraction diagnostics"
        );

        let rows = sizes.shortest();
        let records = self
            .texts
            .into_iter()
            .zip(self.titles)
            .zip(self.ratings)
            .zip(self.dates)
            .take(rows)
            .map(|(((text, title), rating), date)| ReviewRecord::new(text, title, rating, date))
            .collect();

        ScrapeResult {
            records,
            success,
            sizes,
        }
    }
}

fn first_text(container: &ElementRef, selector: &Selector) -> Option<String> {
    container
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>())
}

fn extract_tripadvisor(document: &Html) -> ReviewColumns {
    let mut columns = ReviewColumns::default();

    for container in document.select(&TA_CONTAINER) {
        if let Some(text) = first_text(&container, &TA_BODY) {
            columns.texts.push(text.trim().to_string());
        }

        // * The rating lives in a class name somewhere inside the container
        columns
            .ratings
            .push(decode_rating(&container.html(), Site::TripAdvisor));

        if let Some(title) = first_text(&container, &TA_TITLE) {
            columns.titles.push(title.trim().to_string());
        }
        if let Some(date) = first_text(&container, &TA_DATE) {
            columns.dates.push(date.trim().to_string());
        }
    }

    columns
}

fn extract_yelp(document: &Html) -> ReviewColumns {
    let mut columns = ReviewColumns::default();

    for container in document.select(&YELP_CONTAINER) {
        if let Some(text) = first_text(&container, &YELP_BODY) {
            let text = text.trim().to_string();
            // * No titles on Yelp: the body doubles as the title
            columns.titles.push(text.clone());
            columns.texts.push(text);
        }

        if let Some(rating) = container.select(&YELP_RATING).next() {
            columns.ratings.push(decode_rating(&rating.html(), Site::Yelp));
        }

        if let Some(date) = first_text(&container, &YELP_DATE) {
            columns
                .dates
                .push(date.replace(UPDATED_REVIEW_PREFIX, "").trim().to_string());
        }
    }

    columns
}

/// Extracts a page for a site given by name.
///
/// An unknown site name is an `Err`, kept apart from an `Ok` result that failed the
/// length check.
pub fn extract_by_name(markup: &str, site: &str) -> Result<ScrapeResult, ExtractError> {
    let site: Site = site.parse()?;
    Ok(site.extract(markup))
}
