//! Title canonicalization.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use tracing::debug;

// Jackett appends tracker annotations to some titles,
// e.g. "Movie.Name.720p.x264 [Golden Popcorn / 720p / x264]".
static ANNOTATED_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?)( \[.*/.*\])?$").unwrap());

/// Strip a trailing `" [... / ...]"` tracker annotation from a result title.
///
/// Titles without such a suffix are returned unchanged.
pub fn canonicalize_title(title: &str) -> String {
    match ANNOTATED_TITLE_RE.captures(title).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().to_string(),
        None => {
            debug!(title = %title, "Title could not be trimmed down");
            title.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_annotation() {
        assert_eq!(
            canonicalize_title("Movie.Name.720p [Golden Popcorn / 720p]"),
            "Movie.Name.720p"
        );
        assert_eq!(
            canonicalize_title("Movie.Name.720p.x264 [Golden Popcorn / 720p / x264]"),
            "Movie.Name.720p.x264"
        );
    }

    #[test]
    fn test_plain_title_unchanged() {
        assert_eq!(canonicalize_title("Movie.Name.720p"), "Movie.Name.720p");
    }

    #[test]
    fn test_bracket_without_slash_kept() {
        assert_eq!(
            canonicalize_title("Movie.Name.720p [Internal]"),
            "Movie.Name.720p [Internal]"
        );
    }

    #[test]
    fn test_bracket_not_at_end_kept() {
        assert_eq!(
            canonicalize_title("[A/B] Movie.Name.720p"),
            "[A/B] Movie.Name.720p"
        );
    }

    #[test]
    fn test_empty_title() {
        assert_eq!(canonicalize_title(""), "");
    }
}
