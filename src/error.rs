//! Error taxonomy for the stream search pipeline
//!
//! Only metadata resolution and upstream authentication failures are allowed to
//! stop a pipeline run. Per-variant search failures are logged and skipped by the
//! hunt service, and filters that would empty the result set are skipped rather
//! than reported, so neither has an error type here.

use thiserror::Error;

/// Failure of a single content search call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    /// Upstream rejected our credentials. Aborts the whole hunt.
    #[error("content search rejected the configured credentials")]
    Authentication,
    /// Any other failure (network, timeout, bad payload). Recoverable.
    #[error("content search request failed: {message}")]
    Request { message: String },
}

impl SearchError {
    /// Build a recoverable request failure from any displayable error
    pub fn request(err: impl std::fmt::Display) -> Self {
        SearchError::Request {
            message: err.to_string(),
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, SearchError::Authentication)
    }
}

/// Failure that stops the hunt across all title variants
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HuntError {
    #[error("content search authentication failed")]
    Authentication,
}

/// Failure that stops a whole pipeline run
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("metadata resolution failed for {content_id}: {message}")]
    MetadataResolution { content_id: String, message: String },
    #[error("content search authentication failed")]
    Authentication,
}

impl From<HuntError> for PipelineError {
    fn from(err: HuntError) -> Self {
        match err {
            HuntError::Authentication => PipelineError::Authentication,
        }
    }
}
