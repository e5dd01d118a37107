//! Post-ranking filters: quality allow-list, max file size, per-quality cap
//!
//! Stages run in that order. A stage that would remove every stream is skipped
//! on its own; the other stages still apply.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use super::quality::{QualityCategory, QualityTier};
use super::stream_mapper::RankedStream;

/// User filter settings for one request
#[derive(Debug, Clone, PartialEq)]
pub struct StreamFilter {
    qualities: BTreeSet<QualityTier>,
    max_file_size_gb: f64,
    max_results_per_quality: usize,
}

impl StreamFilter {
    pub fn new(qualities: &[QualityTier], max_file_size_gb: f64, max_results_per_quality: usize) -> Self {
        Self {
            qualities: qualities.iter().copied().collect(),
            max_file_size_gb,
            max_results_per_quality,
        }
    }

    pub fn apply(&self, streams: Vec<RankedStream>) -> Vec<RankedStream> {
        let streams = self.filter_qualities(streams);
        let streams = self.filter_max_size(streams);
        self.cap_per_quality(streams)
    }

    /// Keep streams whose quality label belongs to an allowed tier. Inactive
    /// when every tier (or none) is selected.
    pub fn filter_qualities(&self, streams: Vec<RankedStream>) -> Vec<RankedStream> {
        if self.qualities.is_empty() || self.qualities.len() == QualityTier::ALL.len() {
            return streams;
        }

        let allowed = &self.qualities;
        keep_unless_empty("quality", streams, |stream| {
            stream
                .quality
                .as_deref()
                .is_some_and(|label| allowed.iter().any(|tier| tier.accepts(label)))
        })
    }

    /// Drop streams larger than the ceiling; unparseable sizes are kept
    pub fn filter_max_size(&self, streams: Vec<RankedStream>) -> Vec<RankedStream> {
        if self.max_file_size_gb <= 0.0 {
            return streams;
        }

        let ceiling = self.max_file_size_gb;
        keep_unless_empty("max_size", streams, |stream| {
            stream.size().is_none_or(|size| size.as_gigabytes() <= ceiling)
        })
    }

    /// Keep at most `max_results_per_quality` streams per quality bucket,
    /// preserving ranked order
    pub fn cap_per_quality(&self, streams: Vec<RankedStream>) -> Vec<RankedStream> {
        let cap = self.max_results_per_quality;
        if cap == 0 {
            return streams;
        }

        let mut counts: HashMap<QualityCategory, usize> = HashMap::new();
        keep_unless_empty("per_quality_cap", streams, |stream| {
            let count = counts
                .entry(QualityCategory::from_label(stream.quality.as_deref()))
                .or_default();
            *count += 1;
            *count <= cap
        })
    }
}

/// Apply `keep` to the list, or return it untouched if nothing would survive
fn keep_unless_empty<F>(stage: &str, streams: Vec<RankedStream>, mut keep: F) -> Vec<RankedStream>
where
    F: FnMut(&RankedStream) -> bool,
{
    if streams.is_empty() {
        return streams;
    }

    let mask: Vec<bool> = streams.iter().map(&mut keep).collect();
    let kept = mask.iter().filter(|k| **k).count();

    if kept == 0 {
        warn!(stage, streams = streams.len(), "Filter would remove every stream, skipping it");
        return streams;
    }

    debug!(stage, before = streams.len(), after = kept, "Applied stream filter");
    streams
        .into_iter()
        .zip(mask)
        .filter_map(|(stream, keep)| keep.then_some(stream))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::content_search::RawCandidate;
    use crate::services::stream_mapper::StreamMapper;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn stream(hash: &str, title: &str, size: &str) -> RankedStream {
        let mut candidate = RawCandidate::new(hash, title);
        candidate.size_label = size.to_string();
        StreamMapper::new("StreamHunt", "https://play.example.com", None).map(candidate, Utc::now())
    }

    fn hashes(streams: &[RankedStream]) -> Vec<&str> {
        streams.iter().map(|s| s.content_hash()).collect()
    }

    fn sample() -> Vec<RankedStream> {
        vec![
            stream("uhd1", "Movie 2160p", "40 GB"),
            stream("uhd2", "Movie UHD", "25 GB"),
            stream("fhd1", "Movie 1080p", "8 GB"),
            stream("fhd2", "Movie 1080p", "4 GB"),
            stream("fhd3", "Movie 1080p", "2 GB"),
            stream("hd1", "Movie 720p", "900 MB"),
            stream("raw", "Movie", "1.1 GB"),
        ]
    }

    #[test]
    fn test_quality_allow_list() {
        let filter = StreamFilter::new(&[QualityTier::FourK, QualityTier::Hd], 0.0, 0);
        assert_eq!(hashes(&filter.apply(sample())), vec!["uhd1", "uhd2", "hd1"]);
    }

    #[test]
    fn test_full_quality_set_is_inactive() {
        let filter = StreamFilter::new(&QualityTier::ALL, 0.0, 0);
        assert_eq!(filter.apply(sample()).len(), 7);
    }

    #[test]
    fn test_max_size() {
        let filter = StreamFilter::new(&QualityTier::ALL, 5.0, 0);
        assert_eq!(
            hashes(&filter.apply(sample())),
            vec!["fhd2", "fhd3", "hd1", "raw"]
        );
    }

    #[test]
    fn test_per_quality_cap_keeps_ranked_order() {
        let filter = StreamFilter::new(&QualityTier::ALL, 0.0, 1);
        assert_eq!(
            hashes(&filter.apply(sample())),
            vec!["uhd1", "fhd1", "hd1", "raw"]
        );
    }

    #[test]
    fn test_stages_fall_back_independently() {
        // Only 480p allowed: nothing matches, so the allow-list is skipped,
        // but the size ceiling still applies.
        let filter = StreamFilter::new(&[QualityTier::Sd], 3.0, 0);
        assert_eq!(hashes(&filter.apply(sample())), vec!["fhd3", "hd1", "raw"]);
    }

    #[test]
    fn test_max_size_fallback() {
        let filter = StreamFilter::new(&QualityTier::ALL, 0.5, 0);
        assert_eq!(filter.apply(sample()).len(), 7);
    }

    #[test]
    fn test_filters_never_empty_a_non_empty_list() {
        let configs = [
            StreamFilter::new(&[QualityTier::Sd], 0.0, 0),
            StreamFilter::new(&[QualityTier::FourK], 0.0, 0),
            StreamFilter::new(&QualityTier::ALL, 0.001, 0),
            StreamFilter::new(&QualityTier::ALL, 0.0, 1),
            StreamFilter::new(&[QualityTier::Sd, QualityTier::Hd], 0.1, 1),
        ];
        let inputs = [
            sample(),
            vec![stream("one", "Movie 480p", "700 MB")],
            vec![stream("x", "Clip", "unknown")],
        ];

        for filter in &configs {
            for input in &inputs {
                let input = input.clone();
                assert!(!filter.filter_qualities(input.clone()).is_empty());
                assert!(!filter.filter_max_size(input.clone()).is_empty());
                assert!(!filter.cap_per_quality(input.clone()).is_empty());
                assert!(!filter.apply(input).is_empty());
            }
        }
    }

    #[test]
    fn test_empty_input_stays_empty() {
        let filter = StreamFilter::new(&[QualityTier::Sd], 1.0, 1);
        assert!(filter.apply(Vec::new()).is_empty());
    }
}
