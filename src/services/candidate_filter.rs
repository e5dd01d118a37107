//! Playability gate and content-hash deduplication for raw search records

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::content_search::{MediaType, RawCandidate};

/// "45s", "12 sec": clips measured in seconds
static SECONDS_DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+\s*s").expect("seconds duration regex"));

/// "0m", "3m 20s": anything under six minutes
static SHORT_DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[0-5]\s*m").expect("short duration regex"));

/// Why a candidate was dropped before matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    Duplicate,
    TooShort,
    PasswordProtected,
    Malicious,
    NotVideo,
    TooSmall,
}

/// Counters for one filter run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub accepted: usize,
    pub duplicates: usize,
    pub too_short: usize,
    pub password_protected: usize,
    pub malicious: usize,
    pub not_video: usize,
    pub too_small: usize,
}

impl FilterStats {
    fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::Duplicate => self.duplicates += 1,
            Rejection::TooShort => self.too_short += 1,
            Rejection::PasswordProtected => self.password_protected += 1,
            Rejection::Malicious => self.malicious += 1,
            Rejection::NotVideo => self.not_video += 1,
            Rejection::TooSmall => self.too_small += 1,
        }
    }

    pub fn rejected(&self) -> usize {
        self.duplicates
            + self.too_short
            + self.password_protected
            + self.malicious
            + self.not_video
            + self.too_small
    }
}

/// Rejects unplayable records and drops duplicate content hashes
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    min_size_bytes: u64,
}

impl CandidateFilter {
    pub fn new(min_size_bytes: u64) -> Self {
        Self { min_size_bytes }
    }

    /// Playability checks for a single record, ignoring duplicates
    pub fn check(&self, candidate: &RawCandidate) -> Result<(), Rejection> {
        if is_short_duration(&candidate.duration_label) {
            return Err(Rejection::TooShort);
        }
        if candidate.flags.password_protected {
            return Err(Rejection::PasswordProtected);
        }
        if candidate.flags.flagged_malicious {
            return Err(Rejection::Malicious);
        }
        if candidate.flags.media_type != MediaType::Video {
            return Err(Rejection::NotVideo);
        }
        if candidate.raw_size_bytes < self.min_size_bytes {
            return Err(Rejection::TooSmall);
        }
        Ok(())
    }

    /// Keep the first occurrence of each content hash, then apply the
    /// playability checks. Input order is preserved.
    pub fn apply(&self, candidates: Vec<RawCandidate>) -> (Vec<RawCandidate>, FilterStats) {
        let mut seen = HashSet::new();
        let mut stats = FilterStats::default();
        let mut accepted = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            if !seen.insert(candidate.content_hash.clone()) {
                stats.record(Rejection::Duplicate);
                continue;
            }
            match self.check(&candidate) {
                Ok(()) => accepted.push(candidate),
                Err(rejection) => stats.record(rejection),
            }
        }

        stats.accepted = accepted.len();
        debug!(
            accepted = stats.accepted,
            duplicates = stats.duplicates,
            too_short = stats.too_short,
            password_protected = stats.password_protected,
            malicious = stats.malicious,
            not_video = stats.not_video,
            too_small = stats.too_small,
            "Filtered raw candidates"
        );

        (accepted, stats)
    }
}

fn is_short_duration(label: &str) -> bool {
    SECONDS_DURATION.is_match(label) || SHORT_DURATION.is_match(label)
}
