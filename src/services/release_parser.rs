//! Release-name parser for scene-style file titles
//!
//! Parses names like:
//! - "The.Matrix.1999.1080p.BluRay.x264-GRP"
//! - "Breaking Bad S01E01 720p WEB-DL"
//! - "Blade.Runner.2049.2017.2160p.UHD.HEVC"
//!
//! The title is everything before the first season/episode marker or quality
//! token, minus the release year. Tags that double as title words (`web`,
//! `complete`, `proper`, ...) only end the title once a year has been seen. The release year is the last year-looking
//! token in that span, so titles that contain a year keep it.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::text_utils::is_year_token;

static TOKEN_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.\s_\[\]()]+").expect("token split regex"));
static SXXEXX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^s(\d{1,2})e(\d{1,3})").expect("sxxexx regex"));
static NXNN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})x(\d{2,3})$").expect("nxnn regex"));
static QUALITY_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(2160p|1080p|1080i|720p|576p|480p|4k|uhd|bluray|blu-ray|bdrip|brrip|bdremux|remux|web-?dl|webrip|hdtv|hdrip|dvdrip|hdr10|x264|x265|h264|h265|hevc|avc|xvid)(-.*)?$",
    )
    .expect("quality token regex")
});
// Tags that are also ordinary title words ("Charlotte's Web", "A Complete Unknown")
static RELEASE_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(web|dvd|hdr|dv|proper|repack|extended|unrated|multi|dual|complete)(-.*)?$")
        .expect("release tag regex")
});
static RESOLUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(2160p|1080p|720p|480p|4k|uhd)\b").expect("resolution regex"));

const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "m4v", "mov", "wmv", "ts", "webm"];

/// Information parsed out of a release name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRelease {
    /// Title words in their original case, joined by single spaces
    pub title: String,
    pub year: Option<u32>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub resolution: Option<String>,
    pub source: Option<String>,
    pub codec: Option<String>,
}

/// Quality information extracted from a release name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuality {
    pub resolution: Option<String>,
    pub source: Option<String>,
    pub codec: Option<String>,
}

/// Parse a release name into title, year, episode and quality hints
pub fn parse_release(name: &str) -> ParsedRelease {
    let mut tokens: Vec<&str> = TOKEN_SPLIT_RE
        .split(name)
        .filter(|t| !t.is_empty() && *t != "-")
        .collect();

    if let Some(last) = tokens.last()
        && VIDEO_EXTENSIONS.contains(&last.to_lowercase().as_str())
    {
        tokens.pop();
    }

    let mut season = None;
    let mut episode = None;
    let mut stop = tokens.len();
    let mut seen_year = false;

    for (idx, token) in tokens.iter().enumerate() {
        if let Some(caps) = SXXEXX_RE.captures(token) {
            season = caps.get(1).and_then(|m| m.as_str().parse().ok());
            episode = caps.get(2).and_then(|m| m.as_str().parse().ok());
            stop = idx;
            break;
        }
        if let Some(caps) = NXNN_RE.captures(token) {
            season = caps.get(1).and_then(|m| m.as_str().parse().ok());
            episode = caps.get(2).and_then(|m| m.as_str().parse().ok());
            stop = idx;
            break;
        }
        if QUALITY_TOKEN_RE.is_match(token) || (seen_year && RELEASE_TAG_RE.is_match(token)) {
            stop = idx;
            break;
        }
        seen_year |= idx > 0 && is_year_token(token);
    }

    let head = &tokens[..stop];
    // A year at position 0 is the whole title ("1917"), never the release year.
    let year_idx = head
        .iter()
        .rposition(|t| is_year_token(t))
        .filter(|&idx| idx > 0);

    let (title_tokens, year) = match year_idx {
        Some(idx) => (&head[..idx], head[idx].parse().ok()),
        None => (head, None),
    };

    let quality = parse_quality(name);
    let parsed = ParsedRelease {
        title: title_tokens.join(" "),
        year,
        season,
        episode,
        resolution: quality.resolution,
        source: quality.source,
        codec: quality.codec,
    };

    trace!(
        name = name,
        title = %parsed.title,
        year = ?parsed.year,
        season = ?parsed.season,
        episode = ?parsed.episode,
        "Parsed release name"
    );

    parsed
}

/// Parse quality information from a release name
pub fn parse_quality(name: &str) -> ParsedQuality {
    let upper = name.to_uppercase();
    let mut quality = ParsedQuality::default();

    if let Some(caps) = RESOLUTION_RE.captures(name) {
        let res = caps[1].to_uppercase();
        quality.resolution = Some(match res.as_str() {
            "4K" | "UHD" | "2160P" => "2160p".to_string(),
            other => other.to_lowercase(),
        });
    }

    if upper.contains("REMUX") {
        quality.source = Some("REMUX".to_string());
    } else if upper.contains("BLURAY") || upper.contains("BDRIP") || upper.contains("BLU-RAY") || upper.contains("BRRIP") {
        quality.source = Some("BluRay".to_string());
    } else if upper.contains("WEB-DL") || upper.contains("WEBDL") {
        quality.source = Some("WEB-DL".to_string());
    } else if upper.contains("WEBRIP") || upper.contains("WEB-RIP") {
        quality.source = Some("WEBRip".to_string());
    } else if upper.contains("HDTV") {
        quality.source = Some("HDTV".to_string());
    } else if upper.contains("DVDRIP") || upper.contains("DVD") {
        quality.source = Some("DVDRip".to_string());
    }

    if upper.contains("X265") || upper.contains("H265") || upper.contains("H.265") || upper.contains("HEVC") {
        quality.codec = Some("HEVC".to_string());
    } else if upper.contains("X264") || upper.contains("H264") || upper.contains("H.264") {
        quality.codec = Some("H.264".to_string());
    } else if upper.contains("AV1") {
        quality.codec = Some("AV1".to_string());
    } else if upper.contains("XVID") {
        quality.codec = Some("XviD".to_string());
    }

    quality
}
