//! Quality and size helpers shared by the stream mapper, ranking and filters
//!
//! Quality labels are short human strings ("4K/2160p", "1080p", "BluRay") that end
//! up on the second line of a stream's display name. Everything downstream
//! (scores, allow-list tiers, per-quality buckets) is derived from that label.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::release_parser::parse_quality;

static FOURK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(4k|uhd)\b").expect("4k regex"));
static DIMENSIONS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{3,4})\s*[x×]\s*(\d{3,4})").expect("dimensions regex"));
static HEIGHT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d{3,4})p\b").expect("height regex"));
static SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(\d+(?:[.,]\d+)?)\s*(ti?b|gi?b|mi?b|ki?b|b)\b").expect("size regex"));

/// Integer quality rank of a label: 4K → 4, 1080p → 3, 720p → 2, 480p/SD → 1, else 0
pub fn quality_score(label: &str) -> u8 {
    let lower = label.to_lowercase();
    if lower.contains("4k") || lower.contains("2160p") || lower.contains("uhd") || lower.contains("ultra hd") {
        4
    } else if lower.contains("1080p") {
        3
    } else if lower.contains("720p") {
        2
    } else if lower.contains("480p") || lower.contains("sd") {
        1
    } else {
        0
    }
}

/// Resolve the quality label shown for a file.
///
/// Explicit resolution tokens in the title win, then the upstream resolution
/// hint ("1920 x 1080"), then source hints such as "BluRay" or "WEB-DL".
pub fn quality_label(title: &str, resolution_hint: Option<&str>) -> Option<String> {
    let lower = title.to_lowercase();
    if lower.contains("2160p") {
        return Some("4K/2160p".to_string());
    }
    if FOURK_RE.is_match(title) {
        return Some("4K/UHD".to_string());
    }
    for res in ["1080p", "720p", "480p"] {
        if lower.contains(res) {
            return Some(res.to_string());
        }
    }

    if let Some(label) = resolution_hint.and_then(label_from_resolution_hint) {
        return Some(label.to_string());
    }

    parse_quality(title).source
}

fn label_from_resolution_hint(hint: &str) -> Option<&'static str> {
    if let Some(caps) = DIMENSIONS_RE.captures(hint) {
        let width: u32 = caps[1].parse().ok()?;
        let height: u32 = caps[2].parse().ok()?;
        return if width >= 3800 || height >= 2000 {
            Some("4K/2160p")
        } else if width >= 1900 || height >= 1000 {
            Some("1080p")
        } else if width >= 1260 || height >= 700 {
            Some("720p")
        } else if width >= 640 || height >= 400 {
            Some("480p")
        } else {
            None
        };
    }

    let height: u32 = HEIGHT_RE.captures(hint)?[1].parse().ok()?;
    match height {
        h if h >= 2000 => Some("4K/2160p"),
        h if h >= 1000 => Some("1080p"),
        h if h >= 700 => Some("720p"),
        h if h >= 400 => Some("480p"),
        _ => None,
    }
}

/// A selectable quality tier in the user's allow-list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QualityTier {
    #[serde(rename = "4k")]
    FourK,
    #[serde(rename = "1080p")]
    FullHd,
    #[serde(rename = "720p")]
    Hd,
    #[serde(rename = "480p")]
    Sd,
}

impl QualityTier {
    pub const ALL: [QualityTier; 4] = [
        QualityTier::FourK,
        QualityTier::FullHd,
        QualityTier::Hd,
        QualityTier::Sd,
    ];

    /// Lowercase label fragments that identify this tier
    pub fn label_variants(self) -> &'static [&'static str] {
        match self {
            QualityTier::FourK => &["4k", "uhd", "2160p"],
            QualityTier::FullHd => &["1080p"],
            QualityTier::Hd => &["720p"],
            QualityTier::Sd => &["480p", "sd"],
        }
    }

    /// Whether a quality label belongs to this tier
    pub fn accepts(self, label: &str) -> bool {
        let lower = label.to_lowercase();
        self.label_variants().iter().any(|v| lower.contains(v))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::FourK => "4k",
            QualityTier::FullHd => "1080p",
            QualityTier::Hd => "720p",
            QualityTier::Sd => "480p",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "4k" | "2160p" | "uhd" => Ok(QualityTier::FourK),
            "1080p" => Ok(QualityTier::FullHd),
            "720p" => Ok(QualityTier::Hd),
            "480p" | "sd" => Ok(QualityTier::Sd),
            _ => Err(anyhow::anyhow!("Unknown quality tier: {}", s)),
        }
    }
}

/// Bucket used by the per-quality result cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityCategory {
    FourK,
    FullHd,
    Hd,
    Sd,
    Other,
}

impl QualityCategory {
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(quality_score).unwrap_or(0) {
            4 => QualityCategory::FourK,
            3 => QualityCategory::FullHd,
            2 => QualityCategory::Hd,
            1 => QualityCategory::Sd,
            _ => QualityCategory::Other,
        }
    }
}

/// A size label parsed into its leading number and unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedSize {
    pub value: f64,
    /// 0 = B, 1 = KB, 2 = MB, 3 = GB, 4 = TB
    pub unit_rank: u8,
}

impl ParsedSize {
    /// Parse labels like "1.2 GB", "800 MiB" or "750KB"
    pub fn parse(label: &str) -> Option<Self> {
        let caps = SIZE_RE.captures(label)?;
        let value: f64 = caps[1].replace(',', ".").parse().ok()?;
        let unit_rank = match caps[2].to_lowercase().as_str() {
            "b" => 0,
            "kb" | "kib" => 1,
            "mb" | "mib" => 2,
            "gb" | "gib" => 3,
            _ => 4,
        };
        Some(Self { value, unit_rank })
    }

    pub fn as_gigabytes(&self) -> f64 {
        self.value * 1024f64.powi(i32::from(self.unit_rank) - 3)
    }

    /// Unit first (GB beats MB), then the number within the same unit
    pub fn compare(&self, other: &Self) -> Ordering {
        self.unit_rank
            .cmp(&other.unit_rank)
            .then_with(|| self.value.partial_cmp(&other.value).unwrap_or(Ordering::Equal))
    }
}

/// Order two optional sizes ascending; unparseable sizes sort below everything
pub fn compare_sizes(a: Option<&ParsedSize>, b: Option<&ParsedSize>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.compare(b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}
