//! StreamHunt
//!
//! Finds playable media files for a movie or episode: expands the title into
//! search variants, fans the searches out to a content search service, then
//! filters, matches, ranks and caches the resulting streams.

pub mod config;
pub mod error;
pub mod services;

pub use config::{Config, SearchSettings};
pub use error::{HuntError, PipelineError, SearchError};
pub use services::{
    ContentKind, ContentSearch, MetadataProvider, RankedStream, RawCandidate, ResolvedMetadata,
    SearchRequest, SortPolicy, StreamPipeline,
};
