//! Hunt Service
//!
//! Fans one content search out per title variant and accumulates the results.
//! This service:
//! - Searches every non-blank variant without the release year first
//! - Repeats the variant loop with the year appended when results are thin
//! - Stops issuing searches once the global unique-result cap is reached
//! - Skips failed variant searches, except authentication failures which abort

use std::pin::pin;
use std::time::Instant;

use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::accumulator::CandidateAccumulator;
use super::content_search::{ContentSearch, RawCandidate, SearchRequest, SearchSort};
use super::metadata::MediaQuery;
use crate::error::{HuntError, SearchError};

/// Configuration for hunt behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuntConfig {
    /// Global cap on unique content hashes (0 = unbounded)
    pub max_results: usize,
    /// Variant searches allowed in flight at once (1 = sequential)
    pub max_concurrent_searches: usize,
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            max_results: 250,
            max_concurrent_searches: 2,
        }
    }
}

/// Result of a hunt across all title variants
#[derive(Debug, Clone)]
pub struct HuntOutcome {
    /// Raw records in arrival order, duplicates included
    pub candidates: Vec<RawCandidate>,
    /// Number of search calls that were actually issued
    pub searches_run: usize,
    /// Number of search calls that failed and were skipped
    pub searches_failed: usize,
    /// Unique content hashes seen
    pub unique_results: usize,
    /// Whether we stopped before running every planned search
    pub stopped_early: bool,
    /// Total time taken for all searches
    pub elapsed_ms: u64,
}

#[derive(Debug, Default)]
struct PassStats {
    searches_run: usize,
    searches_failed: usize,
    stopped_early: bool,
}

/// Variant search orchestrator
pub struct HuntService<S> {
    search: S,
    config: HuntConfig,
}

impl<S: ContentSearch> HuntService<S> {
    pub fn new(search: S, config: HuntConfig) -> Self {
        Self { search, config }
    }

    pub fn search_client(&self) -> &S {
        &self.search
    }

    /// Search every variant of `query` and collect the raw results
    ///
    /// # Arguments
    /// * `query` - Resolved media query (year and episode shape the search strings)
    /// * `variants` - Ordered title variants, canonical title first
    /// * `sort` - Ordering hint passed through to the search service
    pub async fn hunt(
        &self,
        query: &MediaQuery,
        variants: &[String],
        sort: SearchSort,
    ) -> Result<HuntOutcome, HuntError> {
        let start = Instant::now();
        let accumulator = CandidateAccumulator::new(self.config.max_results);
        let mut stats = PassStats::default();

        let episode_suffix = query
            .episode_tag()
            .filter(|_| query.is_series())
            .map(|tag| format!(" {}", tag))
            .unwrap_or_default();

        let base_queries: Vec<String> = variants
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(|v| format!("{}{}", v, episode_suffix))
            .collect();

        debug!(
            title = %query.canonical_title,
            kind = %query.kind,
            queries = base_queries.len(),
            max_results = self.config.max_results,
            "Starting variant hunt"
        );

        self.run_pass(&base_queries, sort, &accumulator, &mut stats)
            .await?;

        if let Some(year) = query.year
            && !accumulator.is_full()
        {
            debug!(
                year,
                unique = accumulator.unique_count(),
                "Repeating variant searches with release year"
            );
            let year_queries: Vec<String> = base_queries
                .iter()
                .map(|q| format!("{} {}", q, year))
                .collect();
            self.run_pass(&year_queries, sort, &accumulator, &mut stats)
                .await?;
        }

        let unique_results = accumulator.unique_count();
        let candidates = accumulator.into_candidates();
        let elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            title = %query.canonical_title,
            searches = stats.searches_run,
            failed = stats.searches_failed,
            results = candidates.len(),
            unique = unique_results,
            stopped_early = stats.stopped_early,
            elapsed_ms,
            "Variant hunt complete"
        );

        Ok(HuntOutcome {
            candidates,
            searches_run: stats.searches_run,
            searches_failed: stats.searches_failed,
            unique_results,
            stopped_early: stats.stopped_early,
            elapsed_ms,
        })
    }

    /// One loop over the queries. Results are consumed in query order; a
    /// search that starts after the cap is reached is never issued.
    async fn run_pass(
        &self,
        queries: &[String],
        sort: SearchSort,
        accumulator: &CandidateAccumulator,
        stats: &mut PassStats,
    ) -> Result<(), HuntError> {
        if accumulator.is_full() {
            stats.stopped_early = true;
            return Ok(());
        }

        let concurrency = self.config.max_concurrent_searches.max(1);
        let search = &self.search;

        let mut results = pin!(
            stream::iter(queries)
                .map(move |query| async move {
                    if accumulator.is_full() {
                        return None;
                    }
                    let request = SearchRequest::new(query.as_str(), sort);
                    debug!(query = %request.query, sort = ?sort, "Searching variant");
                    Some((query, search.search(&request).await))
                })
                .buffered(concurrency)
        );

        while let Some(item) = results.next().await {
            let Some((query, result)) = item else {
                continue;
            };
            stats.searches_run += 1;

            match result {
                Ok(batch) if batch.is_empty() => {
                    debug!(query = %query, "Variant search returned no results");
                }
                Ok(batch) => {
                    let count = batch.len();
                    let unique = accumulator.add_batch(batch);
                    debug!(query = %query, results = count, unique, "Variant search returned results");
                }
                Err(SearchError::Authentication) => {
                    warn!(query = %query, "Content search authentication failed, aborting hunt");
                    return Err(HuntError::Authentication);
                }
                Err(e) => {
                    stats.searches_failed += 1;
                    warn!(query = %query, error = %e, "Variant search failed, skipping");
                }
            }

            if accumulator.is_full() {
                info!(
                    unique = accumulator.unique_count(),
                    cap = self.config.max_results,
                    "Result cap reached, stopping early"
                );
                stats.stopped_early = true;
                break;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::metadata::ContentKind;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    /// Fake search keyed by exact query string; records every query it sees
    #[derive(Default)]
    struct ScriptedSearch {
        responses: HashMap<String, Result<Vec<RawCandidate>, SearchError>>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedSearch {
        fn with(mut self, query: &str, hashes: &[&str]) -> Self {
            let batch = hashes
                .iter()
                .map(|h| RawCandidate::new(*h, format!("{} {}", query, h)))
                .collect();
            self.responses.insert(query.to_string(), Ok(batch));
            self
        }

        fn failing(mut self, query: &str, err: SearchError) -> Self {
            self.responses.insert(query.to_string(), Err(err));
            self
        }

        fn queries(&self) -> Vec<String> {
            self.seen.lock().clone()
        }
    }

    #[async_trait]
    impl ContentSearch for ScriptedSearch {
        async fn search(&self, request: &SearchRequest) -> Result<Vec<RawCandidate>, SearchError> {
            self.seen.lock().push(request.query.clone());
            self.responses
                .get(&request.query)
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn movie(title: &str, year: Option<u32>) -> MediaQuery {
        MediaQuery {
            canonical_title: title.to_string(),
            year,
            season: None,
            episode: None,
            kind: ContentKind::Movie,
        }
    }

    fn variants(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn sequential(max_results: usize) -> HuntConfig {
        HuntConfig {
            max_results,
            max_concurrent_searches: 1,
        }
    }

    #[tokio::test]
    async fn test_searches_variants_then_year_pass() {
        let search = ScriptedSearch::default().with("Dune", &["a"]);
        let service = HuntService::new(search, sequential(10));

        let outcome = service
            .hunt(&movie("Dune", Some(2021)), &variants(&["Dune", "  ", "Duna"]), SearchSort::Relevance)
            .await
            .unwrap();

        assert_eq!(
            service.search_client().queries(),
            vec!["Dune", "Duna", "Dune 2021", "Duna 2021"]
        );
        assert_eq!(outcome.searches_run, 4);
        assert_eq!(outcome.unique_results, 1);
        assert!(!outcome.stopped_early);
    }

    #[tokio::test]
    async fn test_no_year_pass_without_year() {
        let search = ScriptedSearch::default();
        let service = HuntService::new(search, sequential(10));

        let outcome = service
            .hunt(&movie("Dune", None), &variants(&["Dune"]), SearchSort::Relevance)
            .await
            .unwrap();

        assert_eq!(service.search_client().queries(), vec!["Dune"]);
        assert!(outcome.candidates.is_empty());
    }

    #[tokio::test]
    async fn test_stops_at_global_cap() {
        let search = ScriptedSearch::default()
            .with("Dune", &["a", "b"])
            .with("Duna", &["b", "c"])
            .with("Dyuna", &["d"]);
        let service = HuntService::new(search, sequential(3));

        let outcome = service
            .hunt(
                &movie("Dune", Some(2021)),
                &variants(&["Dune", "Duna", "Dyuna"]),
                SearchSort::Relevance,
            )
            .await
            .unwrap();

        // Cap reached after the second variant: no third variant, no year pass
        assert_eq!(service.search_client().queries(), vec!["Dune", "Duna"]);
        assert_eq!(outcome.unique_results, 3);
        assert_eq!(outcome.candidates.len(), 4);
        assert!(outcome.stopped_early);
    }

    #[tokio::test]
    async fn test_concurrent_hunt_respects_cap() {
        let search = ScriptedSearch::default()
            .with("A", &["1", "2"])
            .with("B", &["3"])
            .with("C", &["4"])
            .with("D", &["5"]);
        let service = HuntService::new(
            search,
            HuntConfig {
                max_results: 2,
                max_concurrent_searches: 2,
            },
        );

        let outcome = service
            .hunt(&movie("A", None), &variants(&["A", "B", "C", "D"]), SearchSort::Relevance)
            .await
            .unwrap();

        assert!(outcome.stopped_early);
        assert_eq!(outcome.unique_results, 2);
        assert!(service.search_client().queries().len() < 4);
    }

    #[tokio::test]
    async fn test_failed_variant_is_skipped() {
        let search = ScriptedSearch::default()
            .failing("Dune", SearchError::request("timeout"))
            .with("Duna", &["a"]);
        let service = HuntService::new(search, sequential(10));

        let outcome = service
            .hunt(&movie("Dune", None), &variants(&["Dune", "Duna"]), SearchSort::Relevance)
            .await
            .unwrap();

        assert_eq!(outcome.searches_failed, 1);
        assert_eq!(outcome.candidates.len(), 1);
    }

    #[tokio::test]
    async fn test_authentication_failure_aborts() {
        let search = ScriptedSearch::default()
            .failing("Dune", SearchError::Authentication)
            .with("Duna", &["a"]);
        let service = HuntService::new(search, sequential(10));

        let result = service
            .hunt(&movie("Dune", Some(2021)), &variants(&["Dune", "Duna"]), SearchSort::Relevance)
            .await;

        assert_matches!(result, Err(HuntError::Authentication));
        assert_eq!(service.search_client().queries(), vec!["Dune"]);
    }

    #[tokio::test]
    async fn test_series_queries_carry_episode_tag() {
        let search = ScriptedSearch::default();
        let service = HuntService::new(search, sequential(10));
        let query = MediaQuery {
            canonical_title: "Breaking Bad".to_string(),
            year: Some(2008),
            season: Some(1),
            episode: Some(1),
            kind: ContentKind::Series,
        };

        service
            .hunt(&query, &variants(&["Breaking Bad"]), SearchSort::Newest)
            .await
            .unwrap();

        assert_eq!(
            service.search_client().queries(),
            vec!["Breaking Bad S01E01", "Breaking Bad S01E01 2008"]
        );
    }
}
