use review_topics::engine::{PaginatedScraper, RetryPolicy, ScrapeError, UrlTemplate};
use review_topics::network::InMemoryFetcher;
use review_topics::refinery::Site;
use std::time::Duration;

// * Scraper ordering and re-read behaviour over an in-memory site

fn template() -> UrlTemplate {
    UrlTemplate::new(
        "https://www.tripadvisor.co.uk/Attraction_Review-g1-d2-Reviews",
        "-or",
        "",
        "-Mosaics.html",
    )
}

fn page(texts: &[&str]) -> String {
    let blocks: String = texts
        .iter()
        .map(|t| {
            format!(
                r#"<div class="review-container"><span class="ui_bubble_rating bubble_40"></span><span class="ratingDate">today</span><span class="noQuotes">title {t}</span><p class="entry">{t}</p></div>"#
            )
        })
        .collect();
    format!("<html><body>{blocks}</body></html>")
}

fn three_page_site() -> InMemoryFetcher {
    let t = template();
    InMemoryFetcher::new()
        .with_page(t.page_url(1, 10), page(&["a1", "a2"]))
        .with_page(t.page_url(2, 10), page(&["b1"]))
        .with_page(t.page_url(3, 10), page(&["c1", "c2", "c3"]))
}

#[tokio::test]
async fn test_one_fetch_per_page_in_order() {
    let scraper = PaginatedScraper::new(three_page_site(), Site::TripAdvisor)
        .with_policy(RetryPolicy::immediate())
        .with_page_delay(Duration::ZERO);

    scraper.run(&template(), 3, 10).await.unwrap();

    let calls = scraper.fetcher().calls();
    assert_eq!(
        calls,
        vec![
            "https://www.tripadvisor.co.uk/Attraction_Review-g1-d2-Reviews-Mosaics.html",
            "https://www.tripadvisor.co.uk/Attraction_Review-g1-d2-Reviews-or10-Mosaics.html",
            "https://www.tripadvisor.co.uk/Attraction_Review-g1-d2-Reviews-or20-Mosaics.html",
        ]
    );
}

#[tokio::test]
async fn test_records_concatenate_in_page_order() {
    let scraper = PaginatedScraper::new(three_page_site(), Site::TripAdvisor)
        .with_policy(RetryPolicy::immediate())
        .with_page_delay(Duration::ZERO);

    let records = scraper.run(&template(), 3, 10).await.unwrap();
    let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["a1", "a2", "b1", "c1", "c2", "c3"]);
}

#[tokio::test]
async fn test_failed_page_is_reread_before_moving_on() {
    let t = template();
    let fetcher = InMemoryFetcher::new()
        .with_page(t.page_url(1, 10), page(&["a1"]))
        .with_failure(t.page_url(2, 10), "connection reset")
        .with_failure(t.page_url(2, 10), "timed out")
        .with_page(t.page_url(2, 10), page(&["b1"]))
        .with_page(t.page_url(3, 10), page(&["c1"]));
    let scraper = PaginatedScraper::new(fetcher, Site::TripAdvisor)
        .with_policy(RetryPolicy::immediate())
        .with_page_delay(Duration::ZERO);

    let records = scraper.run(&t, 3, 10).await.unwrap();
    assert_eq!(records.len(), 3);

    let calls = scraper.fetcher().calls();
    assert_eq!(calls.len(), 5);
    assert_eq!(calls[1], calls[2]);
    assert_eq!(calls[2], calls[3]);
    assert_eq!(calls[4], t.page_url(3, 10));
}

#[tokio::test]
async fn test_bounded_policy_surfaces_page() {
    let t = template();
    let fetcher = InMemoryFetcher::new()
        .with_page(t.page_url(1, 10), page(&["a1"]))
        .with_failure(t.page_url(2, 10), "connection reset");
    let scraper = PaginatedScraper::new(fetcher, Site::TripAdvisor)
        .with_policy(RetryPolicy::bounded(2, Duration::ZERO))
        .with_page_delay(Duration::ZERO);

    match scraper.run(&t, 2, 10).await {
        Err(ScrapeError::RetriesExhausted { page_index, attempts, .. }) => {
            assert_eq!(page_index, 2);
            assert_eq!(attempts, 2);
        }
        other => panic!("Expected RetriesExhausted, got {:?}", other.map(|r| r.len())),
    }
}

#[test]
fn test_page_urls_follow_offsets() {
    let t = UrlTemplate::new("https://www.yelp.com/biz/cafe", "?start=", "", "");
    let jobs = t.jobs(3, 20);
    let urls: Vec<&str> = jobs.iter().map(|j| j.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://www.yelp.com/biz/cafe",
            "https://www.yelp.com/biz/cafe?start=20",
            "https://www.yelp.com/biz/cafe?start=40",
        ]
    );
    assert!(jobs.iter().map(|j| j.page_index).eq(1..=3));
}
