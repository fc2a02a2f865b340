//! Fuzzy (artist, title) matching between catalog and enrichment results.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// "(Remastered 2011)", "[Live]", " - From the Motion Picture ..."
    static ref DECORATION_RE: Regex =
        Regex::new(r"(?i)\s*(\([^)]*\)|\[[^\]]*\]|\s-\s.*$)").expect("valid decoration regex");
}

const TITLE_WEIGHT: f64 = 0.6;
const ARTIST_WEIGHT: f64 = 0.4;

/// Lowercase, strip version decorations and punctuation.
pub fn normalize_for_match(value: &str) -> String {
    let stripped = DECORATION_RE.replace_all(value, "");
    let base = if stripped.trim().is_empty() {
        value
    } else {
        stripped.as_ref()
    };
    base.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Weighted Jaro-Winkler similarity of (title, artist) pairs, in 0..=1.
pub fn match_similarity(
    wanted_artist: &str,
    wanted_title: &str,
    found_artist: &str,
    found_title: &str,
) -> f64 {
    let title = strsim::jaro_winkler(
        &normalize_for_match(wanted_title),
        &normalize_for_match(found_title),
    );
    let artist = strsim::jaro_winkler(
        &normalize_for_match(wanted_artist),
        &normalize_for_match(found_artist),
    );
    TITLE_WEIGHT * title + ARTIST_WEIGHT * artist
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_decorations() {
        assert_eq!(normalize_for_match("Time (Remastered 2011)"), "time");
        assert_eq!(
            normalize_for_match("Cornfield Chase - From \"Interstellar\""),
            "cornfield chase"
        );
        assert_eq!(normalize_for_match("Mr. Brightside [Live]"), "mr brightside");
        // never normalize to nothing
        assert_eq!(normalize_for_match("(Intro)"), "intro");
    }

    #[test]
    fn exact_match_is_one() {
        let score = match_similarity("Hans Zimmer", "Time", "hans zimmer", "Time");
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn decorated_match_stays_high() {
        let score = match_similarity(
            "Hans Zimmer",
            "Time (Remastered)",
            "Hans Zimmer",
            "Time",
        );
        assert!(score > 0.95);
    }

    #[test]
    fn unrelated_track_is_low() {
        let score = match_similarity("Hans Zimmer", "Time", "Taylor Swift", "Shake It Off");
        assert!(score < 0.75, "score was {}", score);
    }
}
