//! Error types for the three layers that can fail.
//!
//! - [`AdapterError`]: a single provider call went wrong. Never crosses the
//!   adapter boundary; adapters log it and contribute an empty page instead.
//! - [`StoreError`]: the local key-value store could not be read or written,
//!   or held data that does not parse.
//! - [`FeedError`]: the aggregated fetch itself failed, or a store operation
//!   the feed depends on did.

use thiserror::Error;

/// Failure of one provider request.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("no API key configured for {0}")]
    MissingApiKey(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} answered with status {status}")]
    Status {
        provider: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("malformed {provider} payload: {source}")]
    Malformed {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider} rejected the request: {message}")]
    Rejected {
        provider: &'static str,
        message: String,
    },
}

/// Failure of the persisted key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed data under key `{key}`: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not serialize value for key `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure surfaced to the feed's error state.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("error loading articles: {0}")]
    Aggregation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<tokio::task::JoinError> for FeedError {
    fn from(e: tokio::task::JoinError) -> Self {
        FeedError::Aggregation(e.to_string())
    }
}
