//! In-memory response cache with TTL support
//!
//! Memoizes the full pipeline output per request configuration. Expired entries
//! are dropped lazily on lookup, never swept in the background.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use super::stream_mapper::RankedStream;
use crate::config::SearchSettings;

/// Shared, immutable pipeline output
pub type StreamList = Arc<Vec<RankedStream>>;

/// Cache key covering every setting that changes the response
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(version: &str, content_id: &str, settings: &SearchSettings) -> Self {
        let qualities: BTreeSet<_> = settings.qualities.iter().copied().collect();
        let qualities: Vec<&str> = qualities.iter().map(|q| q.as_str()).collect();

        Self(format!(
            "{}:{}:strict={}:lang={}:sort={}:q={}:cap={}:max={}",
            version,
            content_id,
            u8::from(settings.strict_title_matching),
            settings
                .preferred_language
                .as_deref()
                .map(str::to_lowercase)
                .unwrap_or_default(),
            settings.sort_policy,
            qualities.join(","),
            settings.max_results_per_quality,
            settings.max_file_size_gb,
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone)]
struct CacheEntry {
    payload: StreamList,
    created_at: Instant,
}

/// TTL cache of ranked stream lists
pub struct ResponseCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Get a cached payload if it exists and hasn't expired.
    /// An expired entry is removed.
    pub fn get(&self, key: &CacheKey) -> Option<StreamList> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.created_at.elapsed() < self.ttl => {
                    debug!(key = %key, "Response cache hit");
                    return Some(Arc::clone(&entry.payload));
                }
                Some(_) => {}
                None => {
                    debug!(key = %key, "Response cache miss");
                    return None;
                }
            }
        }

        let mut entries = self.entries.write();
        if entries
            .get(key)
            .is_some_and(|entry| entry.created_at.elapsed() >= self.ttl)
        {
            entries.remove(key);
            debug!(key = %key, "Evicted expired response");
        }
        None
    }

    pub fn set(&self, key: CacheKey, payload: StreamList) {
        debug!(key = %key, streams = payload.len(), "Caching response");
        self.entries.write().insert(
            key,
            CacheEntry {
                payload,
                created_at: Instant::now(),
            },
        );
    }

    /// Remove an entry. Returns whether one was present.
    pub fn evict(&self, key: &CacheKey) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Entries currently held, expired ones included until looked up
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::quality::QualityTier;
    use crate::services::ranking::SortPolicy;
    use std::thread::sleep;

    fn payload(product: &str) -> StreamList {
        Arc::new(vec![RankedStream::auth_error(product)])
    }

    #[test]
    fn test_cache_set_and_get() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let key = CacheKey::new("v1", "tt0133093", &SearchSettings::default());
        let value = payload("A");

        cache.set(key.clone(), Arc::clone(&value));
        let hit = cache.get(&key).unwrap();
        assert!(Arc::ptr_eq(&hit, &value));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_expiration_evicts_lazily() {
        let cache = ResponseCache::new(Duration::from_millis(50));
        let key = CacheKey::new("v1", "tt0133093", &SearchSettings::default());
        cache.set(key.clone(), payload("A"));
        assert!(cache.get(&key).is_some());

        sleep(Duration::from_millis(60));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_evict() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let key = CacheKey::new("v1", "tt1", &SearchSettings::default());
        cache.set(key.clone(), payload("A"));
        assert!(cache.evict(&key));
        assert!(!cache.evict(&key));
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_key_format() {
        let key = CacheKey::new("v1", "tt0133093", &SearchSettings::default());
        assert_eq!(
            key.as_str(),
            "v1:tt0133093:strict=0:lang=:sort=quality_first:q=4k,1080p,720p,480p:cap=0:max=0"
        );
    }

    #[test]
    fn test_keys_differ_per_setting() {
        let base = SearchSettings::default();
        let variations = [
            SearchSettings {
                strict_title_matching: true,
                ..base.clone()
            },
            SearchSettings {
                preferred_language: Some("ger".to_string()),
                ..base.clone()
            },
            SearchSettings {
                sort_policy: SortPolicy::SizeFirst,
                ..base.clone()
            },
            SearchSettings {
                qualities: vec![QualityTier::FullHd],
                ..base.clone()
            },
            SearchSettings {
                max_results_per_quality: 3,
                ..base.clone()
            },
            SearchSettings {
                max_file_size_gb: 4.5,
                ..base.clone()
            },
        ];

        let base_key = CacheKey::new("v1", "tt1", &base);
        let mut keys = vec![base_key.clone()];
        for settings in &variations {
            let key = CacheKey::new("v1", "tt1", settings);
            assert!(!keys.contains(&key), "collision for {}", key);
            keys.push(key);
        }
        assert_ne!(base_key, CacheKey::new("v2", "tt1", &base));
        assert_ne!(base_key, CacheKey::new("v1", "tt2", &base));
    }

    #[test]
    fn test_quality_order_does_not_change_key() {
        let a = SearchSettings {
            qualities: vec![QualityTier::Hd, QualityTier::FourK],
            ..SearchSettings::default()
        };
        let b = SearchSettings {
            qualities: vec![QualityTier::FourK, QualityTier::Hd],
            ..SearchSettings::default()
        };
        assert_eq!(CacheKey::new("v1", "tt1", &a), CacheKey::new("v1", "tt1", &b));
    }
}
