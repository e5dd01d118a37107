//! Converts accepted raw records into output streams

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::content_search::RawCandidate;
use super::quality::{ParsedSize, quality_label};

/// Playback URL of the sentinel authentication-error stream
pub const AUTH_ERROR_URL: &str = "about:blank";

/// One playable stream as returned to the transport layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedStream {
    /// Product label, plus the quality label on a second line when known
    pub name: String,
    /// Four lines: file name, duration, size (+ age), languages
    pub description: String,
    pub url: String,
    /// Record this stream was built from, read by ranking and filters
    #[serde(skip)]
    pub source: Arc<RawCandidate>,
    #[serde(skip)]
    pub quality: Option<String>,
}

impl RankedStream {
    /// Single stream telling the user the search credentials were rejected
    pub fn auth_error(product_label: &str) -> Self {
        Self {
            name: format!("{}\n⚠️ Auth error", product_label),
            description: "The content search service rejected the configured credentials.\n\
                          Check the account settings and try again."
                .to_string(),
            url: AUTH_ERROR_URL.to_string(),
            source: Arc::new(RawCandidate::default()),
            quality: None,
        }
    }

    pub fn is_auth_error(&self) -> bool {
        self.url == AUTH_ERROR_URL
    }

    pub fn content_hash(&self) -> &str {
        &self.source.content_hash
    }

    pub fn size(&self) -> Option<ParsedSize> {
        ParsedSize::parse(&self.source.size_label)
    }
}

/// Builds display name, description and playback URL for a record
#[derive(Debug, Clone)]
pub struct StreamMapper {
    product_label: String,
    base_url: String,
    preferred_language: Option<String>,
}

impl StreamMapper {
    pub fn new(
        product_label: impl Into<String>,
        base_url: impl Into<String>,
        preferred_language: Option<String>,
    ) -> Self {
        Self {
            product_label: product_label.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            preferred_language,
        }
    }

    pub fn map(&self, candidate: RawCandidate, now: DateTime<Utc>) -> RankedStream {
        let quality = quality_label(
            &candidate.display_title,
            candidate.full_resolution_label.as_deref(),
        );

        let name = match &quality {
            Some(label) => format!("{}\n{}", self.product_label, label),
            None => self.product_label.clone(),
        };

        let description = [
            format!("{}{}", candidate.display_title, candidate.file_extension),
            format!("🕛 {}", candidate.duration_label),
            self.size_line(&candidate, now),
            self.language_line(&candidate),
        ]
        .join("\n");

        RankedStream {
            name,
            description,
            url: self.playback_url(&candidate),
            source: Arc::new(candidate),
            quality,
        }
    }

    fn size_line(&self, candidate: &RawCandidate, now: DateTime<Utc>) -> String {
        match candidate.uploaded_at {
            Some(uploaded) => {
                let days = (now - uploaded).num_days().max(0);
                format!("📦 {} | 📅 {}d", candidate.size_label, days)
            }
            None => format!("📦 {}", candidate.size_label),
        }
    }

    fn language_line(&self, candidate: &RawCandidate) -> String {
        let languages = if candidate.audio_languages.is_empty() {
            "Unknown".to_string()
        } else {
            candidate.audio_languages.join(", ")
        };

        match &self.preferred_language {
            Some(lang) if candidate.has_language(lang) => format!("🌐 {} ⭐", languages),
            _ => format!("🌐 {}", languages),
        }
    }

    fn playback_url(&self, candidate: &RawCandidate) -> String {
        format!(
            "{}/{}{}/{}{}",
            self.base_url,
            candidate.content_hash,
            candidate.file_extension,
            urlencoding::encode(&candidate.display_title),
            candidate.file_extension
        )
    }
}
