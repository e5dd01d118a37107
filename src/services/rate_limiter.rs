//! Rate limiting for upstream content search calls
//!
//! Wraps any [`ContentSearch`] so that variant searches, however many run
//! concurrently, never exceed the upstream service's request quota.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use tracing::trace;

use super::content_search::{ContentSearch, RawCandidate, SearchRequest};
use crate::error::SearchError;

/// Configuration for rate limiting
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per second
    pub requests_per_second: u32,
    /// Burst capacity (allows short bursts above the rate)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 2,
            burst_size: 5,
        }
    }
}

/// A rate-limited content search client
pub struct RateLimitedSearch<S> {
    inner: S,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    name: String,
}

impl<S: ContentSearch> RateLimitedSearch<S> {
    pub fn new(name: &str, inner: S, config: RateLimitConfig) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN),
        )
        .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN));

        Self {
            inner,
            limiter: Arc::new(RateLimiter::direct(quota)),
            name: name.to_string(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: ContentSearch> ContentSearch for RateLimitedSearch<S> {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<RawCandidate>, SearchError> {
        self.limiter.until_ready().await;
        trace!(client = %self.name, query = %request.query, "Rate limit permit acquired");
        self.inner.search(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::content_search::SearchSort;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSearch {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentSearch for CountingSearch {
        async fn search(&self, request: &SearchRequest) -> Result<Vec<RawCandidate>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.query == "fail" {
                return Err(SearchError::Authentication);
            }
            Ok(vec![RawCandidate::new("abc", request.query.clone())])
        }
    }

    #[tokio::test]
    async fn test_passes_calls_through() {
        let search = RateLimitedSearch::new(
            "test",
            CountingSearch::default(),
            RateLimitConfig {
                requests_per_second: 100,
                burst_size: 10,
            },
        );

        for _ in 0..3 {
            let results = search
                .search(&SearchRequest::new("Dune", SearchSort::Relevance))
                .await
                .unwrap();
            assert_eq!(results.len(), 1);
        }
        assert_eq!(search.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_propagates_errors() {
        let search = RateLimitedSearch::new("test", CountingSearch::default(), RateLimitConfig::default());
        let err = search
            .search(&SearchRequest::new("fail", SearchSort::Relevance))
            .await
            .unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_zero_quota_is_clamped() {
        // Must not panic on a zero quota
        let _ = RateLimitedSearch::new(
            "test",
            CountingSearch::default(),
            RateLimitConfig {
                requests_per_second: 0,
                burst_size: 0,
            },
        );
    }
}
