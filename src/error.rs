use http::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::trailer::MediaType;

/// Failure of the single outbound call to the metadata provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    /// Carries the message only; the request URL (and its API key) is stripped.
    #[error("upstream request failed: {0}")]
    Transport(String),

    #[error("upstream responded with status {status}")]
    Status { status: u16, body: String },

    #[error("malformed upstream payload: {0}")]
    Malformed(String),
}

impl UpstreamError {
    /// What a client is told about the failure.
    pub fn details(&self) -> String {
        match self {
            UpstreamError::Status { body, .. } if !body.is_empty() => body.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache entry encoding failed: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no videos found for {media_type} {id}")]
    NotFound { media_type: MediaType, id: u64 },

    #[error("fetching videos for {media_type} {id} failed: {source}")]
    Upstream {
        media_type: MediaType,
        id: u64,
        #[source]
        source: UpstreamError,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Upstream { .. } | Error::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
