//! Metadata provider collaborator and the resolved media query
//!
//! A content id is resolved to a canonical title (plus year, season/episode and
//! alternate names) before any search is issued. Resolution failures abort the
//! pipeline.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What kind of content is being looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Movie,
    Series,
    Other,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Movie => write!(f, "movie"),
            ContentKind::Series => write!(f, "series"),
            ContentKind::Other => write!(f, "other"),
        }
    }
}

/// What a metadata provider returns for a content id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMetadata {
    pub canonical_title: String,
    pub release_year: Option<u32>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub alternate_names: Vec<String>,
}

/// Normalized query the pipeline searches and matches against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaQuery {
    pub canonical_title: String,
    pub year: Option<u32>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub kind: ContentKind,
}

impl MediaQuery {
    pub fn from_metadata(metadata: &ResolvedMetadata, kind: ContentKind) -> Self {
        Self {
            canonical_title: metadata.canonical_title.trim().to_string(),
            year: metadata.release_year,
            season: metadata.season,
            episode: metadata.episode,
            kind,
        }
    }

    /// "S01E02" when both season and episode are known
    pub fn episode_tag(&self) -> Option<String> {
        match (self.season, self.episode) {
            (Some(season), Some(episode)) => Some(format!("S{:02}E{:02}", season, episode)),
            _ => None,
        }
    }

    pub fn is_series(&self) -> bool {
        self.kind == ContentKind::Series
    }
}

/// Resolves content ids to titles (TMDB, Cinemeta, ...)
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn resolve(&self, content_id: &str, kind: ContentKind) -> anyhow::Result<ResolvedMetadata>;
}
