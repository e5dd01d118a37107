//! Content search collaborator
//!
//! The upstream full-text search service is consumed through [`ContentSearch`].
//! Implementations return raw file records; the pipeline never talks HTTP itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Media type reported by the search service for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Video,
    Audio,
    Image,
    Archive,
    #[serde(other)]
    Other,
}

/// Flags attached to a file record by the search service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFlags {
    pub password_protected: bool,
    pub flagged_malicious: bool,
    pub media_type: MediaType,
}

/// One file record returned by the content search service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCandidate {
    /// Stable dedup key for the file content
    pub content_hash: String,
    pub display_title: String,
    /// Extension including the dot, e.g. ".mkv"
    pub file_extension: String,
    /// Upstream duration label, e.g. "1h 32m" or "45s"
    pub duration_label: String,
    /// Upstream size label, e.g. "1.4 GB"
    pub size_label: String,
    pub raw_size_bytes: u64,
    /// Upstream resolution hint, e.g. "1920 x 1080"
    pub full_resolution_label: Option<String>,
    /// Audio language codes in upstream order
    pub audio_languages: Vec<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub flags: CandidateFlags,
}

impl RawCandidate {
    /// A playable-looking video record with the given hash and title
    pub fn new(content_hash: impl Into<String>, display_title: impl Into<String>) -> Self {
        Self {
            content_hash: content_hash.into(),
            display_title: display_title.into(),
            file_extension: ".mkv".to_string(),
            duration_label: "1h 30m".to_string(),
            size_label: "1.4 GB".to_string(),
            raw_size_bytes: 1_500_000_000,
            ..Default::default()
        }
    }

    /// Whether the file carries the given audio language (case-insensitive)
    pub fn has_language(&self, language: &str) -> bool {
        self.audio_languages
            .iter()
            .any(|lang| lang.eq_ignore_ascii_case(language))
    }
}

/// Ordering hint passed to the search service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSort {
    #[default]
    Relevance,
    Largest,
    Newest,
}

/// A single free-text search call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub sort: SearchSort,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, sort: SearchSort) -> Self {
        Self {
            query: query.into(),
            sort,
        }
    }
}

/// Client for the upstream content search service
#[async_trait]
pub trait ContentSearch: Send + Sync {
    /// Run one search. An empty result is `Ok(vec![])`, never an error.
    /// Credential problems must be reported as [`SearchError::Authentication`].
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawCandidate>, SearchError>;
}

#[async_trait]
impl<T: ContentSearch + ?Sized> ContentSearch for std::sync::Arc<T> {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawCandidate>, SearchError> {
        (**self).search(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_language_ignores_case() {
        let mut candidate = RawCandidate::new("abc", "Movie");
        candidate.audio_languages = vec!["ENG".to_string(), "ger".to_string()];
        assert!(candidate.has_language("eng"));
        assert!(candidate.has_language("GER"));
        assert!(!candidate.has_language("fre"));
    }

    #[test]
    fn test_media_type_deserializes_unknown_as_other() {
        let flags: CandidateFlags = serde_json::from_str(
            r#"{"password_protected":false,"flagged_malicious":false,"media_type":"subtitle"}"#,
        )
        .unwrap();
        assert_eq!(flags.media_type, MediaType::Other);
    }
}
