//! Multi-criteria ranking of mapped streams
//!
//! Every policy is a stable sort, so streams that compare equal keep the order
//! the search service returned them in and re-ranking a ranked list is a no-op.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::content_search::SearchSort;
use super::quality::{ParsedSize, compare_sizes, quality_score};
use super::stream_mapper::RankedStream;

/// User-selected ordering of the result list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortPolicy {
    #[default]
    QualityFirst,
    SizeFirst,
    DateFirst,
    LanguageFirst,
    RelevanceFirst,
}

impl SortPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortPolicy::QualityFirst => "quality_first",
            SortPolicy::SizeFirst => "size_first",
            SortPolicy::DateFirst => "date_first",
            SortPolicy::LanguageFirst => "language_first",
            SortPolicy::RelevanceFirst => "relevance_first",
        }
    }

    /// Ordering hint to pass upstream for this policy
    pub fn search_sort(self) -> SearchSort {
        match self {
            SortPolicy::DateFirst => SearchSort::Newest,
            SortPolicy::SizeFirst => SearchSort::Largest,
            _ => SearchSort::Relevance,
        }
    }
}

impl fmt::Display for SortPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quality_first" => Ok(SortPolicy::QualityFirst),
            "size_first" => Ok(SortPolicy::SizeFirst),
            "date_first" => Ok(SortPolicy::DateFirst),
            "language_first" => Ok(SortPolicy::LanguageFirst),
            "relevance_first" => Ok(SortPolicy::RelevanceFirst),
            _ => Err(anyhow::anyhow!("Unknown sort policy: {}", s)),
        }
    }
}

/// Sort inputs read once per stream from its source record
#[derive(Debug, Clone, Copy)]
struct SortKey {
    quality: u8,
    has_language: bool,
    size: Option<ParsedSize>,
    uploaded_at: Option<DateTime<Utc>>,
}

impl SortKey {
    fn by_quality(&self, other: &Self) -> Ordering {
        other.quality.cmp(&self.quality)
    }

    fn by_language(&self, other: &Self) -> Ordering {
        other.has_language.cmp(&self.has_language)
    }

    fn by_size(&self, other: &Self) -> Ordering {
        compare_sizes(other.size.as_ref(), self.size.as_ref())
    }

    fn by_date(&self, other: &Self) -> Ordering {
        other.uploaded_at.cmp(&self.uploaded_at)
    }
}

/// Orders streams according to a [`SortPolicy`]
#[derive(Debug, Clone)]
pub struct RankingEngine {
    policy: SortPolicy,
    preferred_language: Option<String>,
}

impl RankingEngine {
    pub fn new(policy: SortPolicy, preferred_language: Option<String>) -> Self {
        Self {
            policy,
            preferred_language,
        }
    }

    fn key(&self, stream: &RankedStream) -> SortKey {
        SortKey {
            quality: stream.quality.as_deref().map(quality_score).unwrap_or(0),
            has_language: self
                .preferred_language
                .as_deref()
                .is_some_and(|lang| stream.source.has_language(lang)),
            size: stream.size(),
            uploaded_at: stream.source.uploaded_at,
        }
    }

    pub fn rank(&self, streams: Vec<RankedStream>) -> Vec<RankedStream> {
        let mut keyed: Vec<(SortKey, RankedStream)> =
            streams.into_iter().map(|s| (self.key(&s), s)).collect();

        match self.policy {
            SortPolicy::QualityFirst => keyed.sort_by(|(a, _), (b, _)| {
                a.by_quality(b)
                    .then_with(|| a.by_language(b))
                    .then_with(|| a.by_size(b))
            }),
            SortPolicy::SizeFirst => keyed.sort_by(|(a, _), (b, _)| {
                a.by_size(b)
                    .then_with(|| a.by_quality(b))
                    .then_with(|| a.by_language(b))
            }),
            SortPolicy::DateFirst => keyed.sort_by(|(a, _), (b, _)| {
                a.by_date(b)
                    .then_with(|| a.by_quality(b))
                    .then_with(|| a.by_language(b))
                    .then_with(|| a.by_size(b))
            }),
            SortPolicy::LanguageFirst => {
                let (mut preferred, mut other): (Vec<_>, Vec<_>) =
                    keyed.into_iter().partition(|(k, _)| k.has_language);
                let group_order =
                    |(a, _): &(SortKey, RankedStream), (b, _): &(SortKey, RankedStream)| {
                        a.by_quality(b).then_with(|| a.by_size(b))
                    };
                preferred.sort_by(group_order);
                other.sort_by(group_order);
                preferred.append(&mut other);
                keyed = preferred;
            }
            SortPolicy::RelevanceFirst => keyed.sort_by(|(a, _), (b, _)| {
                a.by_quality(b).then_with(|| a.by_language(b))
            }),
        }

        debug!(policy = %self.policy, streams = keyed.len(), "Ranked streams");
        keyed.into_iter().map(|(_, stream)| stream).collect()
    }
}
