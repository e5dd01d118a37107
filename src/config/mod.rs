//! Application configuration management
//!
//! [`Config`] is process-level and loaded once from environment variables.
//! [`SearchSettings`] are the per-request user tunables that shape filtering and
//! ranking; the transport layer deserializes them from its own request format.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::services::hunt::HuntConfig;
use crate::services::quality::QualityTier;
use crate::services::rate_limiter::RateLimitConfig;
use crate::services::text_utils::Transliteration;

pub use crate::services::ranking::SortPolicy;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// How long a computed response stays cached
    pub cache_ttl_secs: u64,

    /// Global cap on unique search results per request
    pub max_results: usize,

    /// Files below this size are treated as samples (MiB)
    pub min_file_size_mb: u64,

    /// Variant searches in flight at once (1 = sequential)
    pub max_concurrent_searches: usize,

    /// Upstream search quota
    pub requests_per_second: u32,
    pub request_burst: u32,

    /// Custom title dictionary JSON file
    pub title_dictionary_path: Option<PathBuf>,

    /// Label shown as the first line of every stream name
    pub product_label: String,

    /// Base of generated playback URLs
    pub stream_base_url: String,

    /// Prefix of every cache key; bump to invalidate old entries
    pub cache_version: String,

    /// Expand German umlauts (ä → ae) when comparing titles
    pub transliterate_umlauts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 3600,
            max_results: 250,
            min_file_size_mb: 20,
            max_concurrent_searches: 2,
            requests_per_second: 2,
            request_burst: 5,
            title_dictionary_path: None,
            product_label: "StreamHunt".to_string(),
            stream_base_url: String::new(),
            cache_version: "v1".to_string(),
            transliterate_umlauts: false,
        }
    }
}

impl Config {
    /// Load `.env` if present, then read the environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key/value source; unset keys take their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            cache_ttl_secs: parse_or(&lookup, "STREAMHUNT_CACHE_TTL_SECS", defaults.cache_ttl_secs)?,

            max_results: parse_or(&lookup, "STREAMHUNT_MAX_RESULTS", defaults.max_results)?,

            min_file_size_mb: parse_or(&lookup, "STREAMHUNT_MIN_FILE_SIZE_MB", defaults.min_file_size_mb)?,

            max_concurrent_searches: parse_or(
                &lookup,
                "STREAMHUNT_MAX_CONCURRENT_SEARCHES",
                defaults.max_concurrent_searches,
            )?,

            requests_per_second: parse_or(
                &lookup,
                "STREAMHUNT_REQUESTS_PER_SECOND",
                defaults.requests_per_second,
            )?,

            request_burst: parse_or(&lookup, "STREAMHUNT_REQUEST_BURST", defaults.request_burst)?,

            title_dictionary_path: lookup("STREAMHUNT_TITLE_DICTIONARY")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),

            product_label: lookup("STREAMHUNT_PRODUCT_LABEL").unwrap_or(defaults.product_label),

            stream_base_url: lookup("STREAMHUNT_STREAM_BASE_URL").unwrap_or(defaults.stream_base_url),

            cache_version: lookup("STREAMHUNT_CACHE_VERSION").unwrap_or(defaults.cache_version),

            transliterate_umlauts: lookup("STREAMHUNT_TRANSLITERATE_UMLAUTS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.transliterate_umlauts),
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn min_file_size_bytes(&self) -> u64 {
        self.min_file_size_mb * 1024 * 1024
    }

    pub fn hunt_config(&self) -> HuntConfig {
        HuntConfig {
            max_results: self.max_results,
            max_concurrent_searches: self.max_concurrent_searches,
        }
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            requests_per_second: self.requests_per_second,
            burst_size: self.request_burst,
        }
    }

    pub fn transliteration(&self) -> Transliteration {
        if self.transliterate_umlauts {
            Transliteration::GermanUmlauts
        } else {
            Transliteration::None
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

/// Per-request settings that affect which streams are returned and in what order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Reject titles that merely contain the query
    pub strict_title_matching: bool,
    /// Audio language code to favour, e.g. "ger"
    pub preferred_language: Option<String>,
    pub sort_policy: SortPolicy,
    /// Allowed quality tiers
    pub qualities: Vec<QualityTier>,
    /// 0 = unlimited
    pub max_results_per_quality: usize,
    /// 0 = unlimited
    pub max_file_size_gb: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            strict_title_matching: false,
            preferred_language: None,
            sort_policy: SortPolicy::default(),
            qualities: QualityTier::ALL.to_vec(),
            max_results_per_quality: 0,
            max_file_size_gb: 0.0,
        }
    }
}
