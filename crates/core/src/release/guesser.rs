//! Release-name metadata guessing.
//!
//! Scene-style names carry the title, year and episode markers inline
//! (`Show.Name.S01E02.720p.HDTV.x264-GRP`). The heuristic here cuts the title
//! at the last year before any episode marker. Without a year it cuts at the
//! first episode or quality token. Anything with an episode or season marker
//! is classified as an episode.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::{GuessedMetadata, ReleaseCategory};

/// Extracts metadata from a file or directory name.
pub trait MetadataGuesser: Send + Sync {
    fn guess(&self, name: &str) -> GuessedMetadata;
}

const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "ts", "m2ts", "wmv", "mov", "iso", "mpg", "mpeg", "webm",
];

static EPISODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bs(\d{1,2}) ?e(\d{1,3})").unwrap());
static CROSS_EPISODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})x(\d{2,3})\b").unwrap());
static SEASON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:s|season )(\d{1,2})\b").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").unwrap());
static QUALITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(2160p|1080p|1080i|720p|576p|480p|4k|uhd|bluray|blu-ray|bdrip|brrip|web-dl|webdl|webrip|web|hdtv|dvdrip|dvd|remux|hdr|x264|x265|h 264|h 265|hevc|avc|xvid|complete|proper|repack|multi)\b",
    )
    .unwrap()
});
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Heuristic guesser for scene and p2p release names.
#[derive(Debug, Clone, Default)]
pub struct HeuristicGuesser;

impl HeuristicGuesser {
    pub fn new() -> Self {
        Self
    }

    fn strip_extension(name: &str) -> &str {
        match name.rsplit_once('.') {
            Some((stem, ext)) if VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()) => stem,
            _ => name,
        }
    }

    fn clean_title(raw: &str) -> Option<String> {
        let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || "-([{".contains(c));
        let collapsed = SPACES_RE.replace_all(trimmed, " ").to_string();
        if collapsed.is_empty() {
            None
        } else {
            Some(collapsed)
        }
    }
}

impl MetadataGuesser for HeuristicGuesser {
    fn guess(&self, name: &str) -> GuessedMetadata {
        let normalized = Self::strip_extension(name).replace(['.', '_'], " ");
        let end = normalized.len();

        let mut season = None;
        let mut episode = None;
        let mut episode_pos = end;

        if let Some(caps) = EPISODE_RE
            .captures(&normalized)
            .or_else(|| CROSS_EPISODE_RE.captures(&normalized))
        {
            episode_pos = caps.get(0).map(|m| m.start()).unwrap_or(end);
            season = caps.get(1).and_then(|m| m.as_str().parse().ok());
            episode = caps.get(2).and_then(|m| m.as_str().parse().ok());
        } else if let Some(caps) = SEASON_RE.captures(&normalized) {
            episode_pos = caps.get(0).map(|m| m.start()).unwrap_or(end);
            season = caps.get(1).and_then(|m| m.as_str().parse().ok());
        }

        // A leading year is part of the title ("2012", "1917").
        let year_match = YEAR_RE
            .find_iter(&normalized)
            .filter(|m| m.start() > 0 && m.start() < episode_pos)
            .last();

        // Quality words before the year belong to the title ("The.Web.2010").
        let title_end = match year_match {
            Some(m) => m.start(),
            None => {
                let quality_pos = QUALITY_RE
                    .find(&normalized)
                    .map(|m| m.start())
                    .unwrap_or(end);
                episode_pos.min(quality_pos)
            }
        };
        let title = Self::clean_title(&normalized[..title_end]);
        let year = year_match.and_then(|m| m.as_str().parse().ok());

        let category = if season.is_some() {
            ReleaseCategory::Episode
        } else {
            ReleaseCategory::Movie
        };

        GuessedMetadata {
            title,
            year,
            season,
            episode,
            category: Some(category),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guess(name: &str) -> GuessedMetadata {
        HeuristicGuesser::new().guess(name)
    }

    #[test]
    fn test_scene_movie() {
        let g = guess("Movie.Name.2010.1080p.BluRay.x264-GRP.mkv");
        assert_eq!(g.title.as_deref(), Some("Movie Name"));
        assert_eq!(g.year, Some(2010));
        assert_eq!(g.season, None);
        assert_eq!(g.category, Some(ReleaseCategory::Movie));
    }

    #[test]
    fn test_movie_with_parenthesized_year() {
        let g = guess("Movie Name (1999)");
        assert_eq!(g.title.as_deref(), Some("Movie Name"));
        assert_eq!(g.year, Some(1999));
    }

    #[test]
    fn test_quality_word_inside_title() {
        let g = guess("The.Web.2010.1080p");
        assert_eq!(g.title.as_deref(), Some("The Web"));
        assert_eq!(g.year, Some(2010));

        let g = guess("Proper.Dvd.Club.1999.720p.DVDRip");
        assert_eq!(g.title.as_deref(), Some("Proper Dvd Club"));
        assert_eq!(g.year, Some(1999));
    }

    #[test]
    fn test_quality_cut_without_year() {
        let g = guess("Movie.Name.1080p.WEB-DL.x264-GRP");
        assert_eq!(g.title.as_deref(), Some("Movie Name"));
        assert_eq!(g.year, None);
    }

    #[test]
    fn test_numeric_title_keeps_leading_year() {
        let g = guess("2012.2009.720p.BluRay.x264-GRP");
        assert_eq!(g.title.as_deref(), Some("2012"));
        assert_eq!(g.year, Some(2009));
    }

    #[test]
    fn test_year_inside_title_uses_last_year() {
        let g = guess("Blade.Runner.2049.2017.2160p.UHD.BluRay");
        assert_eq!(g.title.as_deref(), Some("Blade Runner 2049"));
        assert_eq!(g.year, Some(2017));
    }

    #[test]
    fn test_episode() {
        let g = guess("Show.Name.S01E02.720p.HDTV.x264-GRP.mkv");
        assert_eq!(g.title.as_deref(), Some("Show Name"));
        assert_eq!(g.season, Some(1));
        assert_eq!(g.episode, Some(2));
        assert_eq!(g.year, None);
        assert_eq!(g.category, Some(ReleaseCategory::Episode));
    }

    #[test]
    fn test_cross_style_episode() {
        let g = guess("Show Name - 3x07 - Episode Title.avi");
        assert_eq!(g.title.as_deref(), Some("Show Name"));
        assert_eq!(g.season, Some(3));
        assert_eq!(g.episode, Some(7));
    }

    #[test]
    fn test_season_pack() {
        let g = guess("Show.Name.S02.1080p.WEB-DL.DDP5.1.H.264-GRP");
        assert_eq!(g.title.as_deref(), Some("Show Name"));
        assert_eq!(g.season, Some(2));
        assert_eq!(g.episode, None);
        assert_eq!(g.category, Some(ReleaseCategory::Episode));
    }

    #[test]
    fn test_resolution_is_not_an_episode() {
        let g = guess("Movie.Name.1920x1080.mkv");
        assert_eq!(g.season, None);
        assert_eq!(g.category, Some(ReleaseCategory::Movie));
    }

    #[test]
    fn test_no_title() {
        let g = guess("1080p.BluRay.x264.mkv");
        assert_eq!(g.title, None);
    }

    #[test]
    fn test_unknown_extension_kept() {
        let g = guess("Some.Album.Name.flac");
        assert_eq!(g.title.as_deref(), Some("Some Album Name flac"));
    }
}
