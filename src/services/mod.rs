//! Search pipeline services

pub mod accumulator;
pub mod aliases;
pub mod cache;
pub mod candidate_filter;
pub mod content_search;
pub mod hunt;
pub mod logging;
pub mod metadata;
pub mod pipeline;
pub mod quality;
pub mod ranking;
pub mod rate_limiter;
pub mod release_parser;
pub mod stream_filter;
pub mod stream_mapper;
pub mod text_utils;
pub mod title_matcher;

pub use aliases::{AliasSource, ProviderAliases, TitleDictionary, TitleVariantGenerator};
pub use cache::{CacheKey, ResponseCache, StreamList};
pub use candidate_filter::{CandidateFilter, FilterStats};
pub use content_search::{
    CandidateFlags, ContentSearch, MediaType, RawCandidate, SearchRequest, SearchSort,
};
pub use hunt::{HuntConfig, HuntOutcome, HuntService};
pub use logging::{LoggingConfig, init_tracing};
pub use metadata::{ContentKind, MediaQuery, MetadataProvider, ResolvedMetadata};
pub use pipeline::StreamPipeline;
pub use quality::{QualityCategory, QualityTier};
pub use ranking::{RankingEngine, SortPolicy};
pub use rate_limiter::{RateLimitConfig, RateLimitedSearch};
pub use stream_filter::StreamFilter;
pub use stream_mapper::{RankedStream, StreamMapper};
pub use title_matcher::{MatchQuery, TitleMatcher};
