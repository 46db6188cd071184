// * Rating Decoder
// * Maps a site-specific rating marker found in markup to a half-star value in [0, 5].

use crate::refinery::extractor::Site;
use regex::Regex;
use std::sync::LazyLock;

// * TripAdvisor encodes the rating in a class name: bubble_5 .. bubble_50
static BUBBLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bbubble_(\d{1,2})\b").expect("Invalid bubble regex"));

// * Yelp encodes the rating in a label: "4.5 star rating"
static STAR_LABEL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d)\.(\d) star").expect("Invalid star label regex"));

/// Decodes the first known rating marker of `site` found in `markup`.
///
/// Total over any input: a fragment with no known marker decodes to `0.0`, which is
/// indistinguishable from a genuine zero rating.
pub fn decode_rating(markup: &str, site: Site) -> f64 {
    match site {
        Site::TripAdvisor => decode_bubble(markup),
        Site::Yelp => decode_star_label(markup),
    }
}

fn decode_bubble(markup: &str) -> f64 {
    BUBBLE_REGEX
        .captures_iter(markup)
        .filter_map(|cap| cap.get(1)?.as_str().parse::<u32>().ok())
        .find(|n| (5..=50).contains(n) && n % 5 == 0)
        .map(|n| n as f64 / 10.0)
        .unwrap_or(0.0)
}

fn decode_star_label(markup: &str) -> f64 {
    STAR_LABEL_REGEX
        .captures_iter(markup)
        .filter_map(|cap| {
            let whole = cap.get(1)?.as_str().parse::<u32>().ok()?;
            let tenth = cap.get(2)?.as_str().parse::<u32>().ok()?;
            Some(whole * 10 + tenth)
        })
        .find(|n| (5..=50).contains(n) && n % 5 == 0)
        .map(|n| n as f64 / 10.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_half_star(value: f64) -> bool {
        (0.0..=5.0).contains(&value) && (value * 2.0).fract() == 0.0
    }

    #[test]
    fn test_bubble_classes() {
        assert_eq!(decode_rating(r#"<span class="ui_bubble_rating bubble_50"></span>"#, Site::TripAdvisor), 5.0);
        assert_eq!(decode_rating(r#"<span class="ui_bubble_rating bubble_5"></span>"#, Site::TripAdvisor), 0.5);
        assert_eq!(decode_rating("bubble_35", Site::TripAdvisor), 3.5);
    }

    #[test]
    fn test_bubble_prefix_does_not_match_longer_class() {
        // * bubble_5 must not be read out of bubble_50 or bubble_55
        assert_eq!(decode_rating("bubble_55", Site::TripAdvisor), 0.0);
        assert_eq!(decode_rating("bubble_7", Site::TripAdvisor), 0.0);
    }

    #[test]
    fn test_star_labels() {
        assert_eq!(decode_rating(r#"<div title="4.0 star rating">"#, Site::Yelp), 4.0);
        assert_eq!(decode_rating(r#"<div title="0.5 star rating">"#, Site::Yelp), 0.5);
        assert_eq!(decode_rating("5.0 star rating", Site::Yelp), 5.0);
        assert_eq!(decode_rating("3.3 star rating", Site::Yelp), 0.0);
    }

    #[test]
    fn test_markers_are_site_specific() {
        assert_eq!(decode_rating("bubble_40", Site::Yelp), 0.0);
        assert_eq!(decode_rating("4.0 star rating", Site::TripAdvisor), 0.0);
    }

    #[test]
    fn test_total_over_arbitrary_input() {
        let inputs = [
            "",
            "no marker here",
            "bubble_",
            "bubble_100",
            "9.9 star",
            "<<<>>>",
            "bubble_45 bubble_10",
            "ünïcödé 2.5 star",
        ];
        for input in inputs {
            for site in [Site::TripAdvisor, Site::Yelp] {
                assert!(is_half_star(decode_rating(input, site)), "{input:?} on {site:?}");
            }
        }
    }
}
