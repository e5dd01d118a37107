//! Stream pipeline
//!
//! Ties the stages together for one request:
//! cache lookup → metadata → title variants → hunt → filter/dedup → title match
//! → map → rank → post-filters → cache write.
//!
//! [`StreamPipeline::streams_for`] never fails. Metadata failures produce an
//! empty list and authentication failures a single sentinel stream. Neither
//! is cached; every other result is, empty or not.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::aliases::{AliasSource, ProviderAliases, TitleDictionary, TitleVariantGenerator};
use super::cache::{CacheKey, ResponseCache, StreamList};
use super::candidate_filter::CandidateFilter;
use super::content_search::ContentSearch;
use super::hunt::HuntService;
use super::metadata::{ContentKind, MediaQuery, MetadataProvider};
use super::ranking::RankingEngine;
use super::rate_limiter::RateLimitedSearch;
use super::stream_filter::StreamFilter;
use super::stream_mapper::{RankedStream, StreamMapper};
use super::title_matcher::{MatchQuery, TitleMatcher};
use crate::config::{Config, SearchSettings};
use crate::error::PipelineError;

/// Search, match, rank and filter playable streams for a content id
pub struct StreamPipeline {
    config: Config,
    metadata: Arc<dyn MetadataProvider>,
    hunt: HuntService<Arc<dyn ContentSearch>>,
    dictionary: TitleDictionary,
    cache: Arc<ResponseCache>,
    candidate_filter: CandidateFilter,
    matcher: TitleMatcher,
}

impl StreamPipeline {
    /// Assemble a pipeline from already-built collaborators
    pub fn new(
        config: Config,
        metadata: Arc<dyn MetadataProvider>,
        search: Arc<dyn ContentSearch>,
        dictionary: TitleDictionary,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            hunt: HuntService::new(search, config.hunt_config()),
            candidate_filter: CandidateFilter::new(config.min_file_size_bytes()),
            matcher: TitleMatcher::new(config.transliteration()),
            metadata,
            dictionary,
            cache,
            config,
        }
    }

    /// Production wiring: loads the title dictionary from the configured path,
    /// rate-limits the search client and creates a fresh response cache
    pub fn from_config<S>(config: Config, metadata: Arc<dyn MetadataProvider>, search: S) -> Result<Self>
    where
        S: ContentSearch + 'static,
    {
        let dictionary = TitleDictionary::load(config.title_dictionary_path.as_deref())?;
        let search: Arc<dyn ContentSearch> = Arc::new(RateLimitedSearch::new(
            "content_search",
            search,
            config.rate_limit_config(),
        ));
        let cache = Arc::new(ResponseCache::new(config.cache_ttl()));

        info!(
            max_results = config.max_results,
            max_concurrent_searches = config.max_concurrent_searches,
            cache_ttl_secs = config.cache_ttl_secs,
            dictionary_entries = dictionary.len(),
            "Stream pipeline ready"
        );

        Ok(Self::new(config, metadata, search, dictionary, cache))
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// Ranked streams for a content id under the given user settings
    pub async fn streams_for(
        &self,
        content_id: &str,
        kind: ContentKind,
        settings: &SearchSettings,
    ) -> StreamList {
        let key = CacheKey::new(&self.config.cache_version, content_id, settings);
        if let Some(cached) = self.cache.get(&key) {
            return cached;
        }

        match self.run(content_id, kind, settings).await {
            Ok(streams) => {
                let streams = Arc::new(streams);
                if streams.is_empty() {
                    debug!(content_id, "No streams found, caching empty result");
                }
                self.cache.set(key, Arc::clone(&streams));
                streams
            }
            Err(PipelineError::Authentication) => {
                warn!(content_id, "Returning authentication error stream");
                Arc::new(vec![RankedStream::auth_error(&self.config.product_label)])
            }
            Err(e) => {
                error!(content_id, error = %e, "Stream pipeline failed");
                Arc::new(Vec::new())
            }
        }
    }

    async fn run(
        &self,
        content_id: &str,
        kind: ContentKind,
        settings: &SearchSettings,
    ) -> Result<Vec<RankedStream>, PipelineError> {
        let resolution_error = |message: String| PipelineError::MetadataResolution {
            content_id: content_id.to_string(),
            message,
        };

        let metadata = self
            .metadata
            .resolve(content_id, kind)
            .await
            .map_err(|e| resolution_error(format!("{:#}", e)))?;

        let query = MediaQuery::from_metadata(&metadata, kind);
        if query.canonical_title.is_empty() {
            return Err(resolution_error("provider returned an empty title".to_string()));
        }

        let provider_aliases = ProviderAliases::new(metadata.alternate_names.clone());
        let sources: Vec<&dyn AliasSource> = vec![&self.dictionary, &provider_aliases];
        let variants = TitleVariantGenerator::new(sources).generate(&query.canonical_title);

        let outcome = self
            .hunt
            .hunt(&query, &variants, settings.sort_policy.search_sort())
            .await?;

        let (candidates, _) = self.candidate_filter.apply(outcome.candidates);

        let match_queries: Vec<MatchQuery> = variants
            .iter()
            .map(|variant| MatchQuery::for_variant(variant, &query))
            .collect();
        let strict = settings.strict_title_matching;
        let before_match = candidates.len();
        let matched: Vec<_> = candidates
            .into_iter()
            .filter(|c| self.matcher.matches_any(&c.display_title, &match_queries, strict))
            .collect();
        debug!(
            candidates = before_match,
            matched = matched.len(),
            strict,
            "Matched candidate titles"
        );

        let mapper = StreamMapper::new(
            self.config.product_label.as_str(),
            self.config.stream_base_url.as_str(),
            settings.preferred_language.clone(),
        );
        let now = Utc::now();
        let streams = matched.into_iter().map(|c| mapper.map(c, now)).collect();

        let ranked = RankingEngine::new(settings.sort_policy, settings.preferred_language.clone())
            .rank(streams);

        let filtered = StreamFilter::new(
            &settings.qualities,
            settings.max_file_size_gb,
            settings.max_results_per_quality,
        )
        .apply(ranked);

        info!(
            content_id,
            title = %query.canonical_title,
            variants = variants.len(),
            searches = outcome.searches_run,
            streams = filtered.len(),
            "Stream pipeline complete"
        );

        Ok(filtered)
    }
}
