use review_topics::refinery::{decode_rating, extract_by_name, ExtractError, Site};

// * Extraction and rating decoding against synthetic review pages

fn tripadvisor_block(text: &str, title: &str, rating_class: &str) -> String {
    format!(
        r#"<div class="review-container">
            <div class="rating"><span class="ui_bubble_rating {rating_class}"></span>
            <span class="ratingDate" title="4 May 2019">Reviewed 4 May 2019</span></div>
            <div class="quote"><a href="/ShowUserReviews"><span class="noQuotes">{title}</span></a></div>
            <div class="prw_reviews_text_summary_hsx"><p class="partial_entry entry">{text}</p></div>
        </div>"#
    )
}

#[test]
fn test_end_to_end_ratings_and_full_text() {
    let html = format!(
        "<html><body>{}{}{}</body></html>",
        tripadvisor_block("Breathtaking mosaics everywhere.", "A must", "bubble_50"),
        tripadvisor_block("Queue was endless.", "Avoid weekends", "bubble_5"),
        tripadvisor_block("Nice garden.", "Pleasant", "stars_unknown"),
    );

    let result = Site::TripAdvisor.extract(&html);
    assert!(result.success);

    let ratings: Vec<f64> = result.records.iter().map(|r| r.rating).collect();
    assert_eq!(ratings, vec![5.0, 0.5, 0.0]);

    for record in &result.records {
        assert_eq!(record.full_text, format!("{} {}", record.text, record.title));
    }
    assert_eq!(result.records[1].full_text, "Queue was endless. Avoid weekends");
}

#[test]
fn test_length_mismatch_sets_failure() {
    // * second block has no title
    let html = format!(
        r#"<html><body>{}<div class="review-container"><span class="ui_bubble_rating bubble_40"></span><span class="ratingDate">d</span><p class="entry">orphan</p></div></body></html>"#,
        tripadvisor_block("Fine.", "Ok", "bubble_30"),
    );

    let result = Site::TripAdvisor.extract(&html);
    assert!(!result.success);
    assert!(!result.sizes.is_consistent());
    assert_eq!(result.sizes.titles + 1, result.sizes.texts);
}

#[test]
fn test_yelp_missing_date_sets_failure() {
    let html = r#"<html><body>
        <div class="review-content"><div class="biz-rating"><div title="5.0 star rating"></div><span class="rating-qualifier">1/2/2021</span></div><p>Great tacos.</p></div>
        <div class="review-content"><div class="biz-rating"><div title="1.0 star rating"></div></div><p>Rude.</p></div>
    </body></html>"#;

    let result = Site::Yelp.extract(html);
    assert!(!result.success);
    assert_eq!(result.sizes.dates, 1);
    assert_eq!(result.sizes.ratings, 2);
}

#[test]
fn test_rating_decoder_is_total() {
    let inputs = [
        "",
        "bubble_",
        "bubble_55",
        "bubble_7",
        "bubble_00",
        "<span class=\"ui_bubble_rating bubble_35\">",
        "5.5 star rating",
        "0.0 star rating",
        "3.5 star rating",
        "garbage \u{1F600}",
    ];
    let allowed: Vec<f64> = (0..=10).map(|i| i as f64 / 2.0).collect();

    for site in Site::ALL {
        for input in inputs {
            let rating = decode_rating(input, site);
            assert!(allowed.contains(&rating), "{site} decoded {input:?} to {rating}");
        }
        assert_eq!(decode_rating("no marker here", site), 0.0);
    }
}

#[test]
fn test_unsupported_site_is_an_error() {
    assert_eq!(
        extract_by_name("<html></html>", "booking").unwrap_err(),
        ExtractError::UnsupportedSite("booking".to_string())
    );
}
