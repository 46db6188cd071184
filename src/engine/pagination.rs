// * Page URL derivation
// * page 1:  prefix + suffix
// * page n:  prefix + increment_token + ((n - 1) * increment) + increment_suffix + suffix

use serde::{Deserialize, Serialize};

/// Static halves of a paginated review URL plus the text around the page offset.
///
/// For `https://www.tripadvisor.co.uk/Attraction_Review-g1-d2-Reviews-or10-Name.html`:
/// prefix `.../Attraction_Review-g1-d2-Reviews`, token `-or`, suffix `-Name.html`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UrlTemplate {
    pub prefix: String,
    pub increment_token: String,
    #[serde(default)]
    pub increment_suffix: String,
    pub suffix: String,
}

/// One page to visit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageJob {
    pub url: String,
    /// 1-based position of the page in the visit order
    pub page_index: usize,
}

impl UrlTemplate {
    pub fn new(
        prefix: impl Into<String>,
        increment_token: impl Into<String>,
        increment_suffix: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            increment_token: increment_token.into(),
            increment_suffix: increment_suffix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn first_page(&self) -> String {
        format!("{}{}", self.prefix, self.suffix)
    }

    /// Listing offset of the page at `page_index` (1-based), `None` when it overflows
    pub fn offset(page_index: usize, increment: usize) -> Option<usize> {
        page_index.saturating_sub(1).checked_mul(increment)
    }

    /// URL of the page at `page_index` (1-based).
    /// An offset past `usize::MAX` saturates; check `offset` first for untrusted inputs.
    pub fn page_url(&self, page_index: usize, increment: usize) -> String {
        if page_index <= 1 {
            return self.first_page();
        }
        let offset = Self::offset(page_index, increment).unwrap_or(usize::MAX);
        format!(
            "{}{}{}{}{}",
            self.prefix, self.increment_token, offset, self.increment_suffix, self.suffix
        )
    }

    /// One job per page, pages 1..=total_pages in visit order
    pub fn jobs(&self, total_pages: usize, increment: usize) -> Vec<PageJob> {
        (1..=total_pages)
            .map(|page_index| PageJob {
                url: self.page_url(page_index, increment),
                page_index,
            })
            .collect()
    }
}
