//! Error taxonomy for the cache core.
//!
//! Per-resource failures are local: the crawler logs them and moves on to the
//! next candidate, so most of these variants never cross the library boundary.

use oxigraph::store::StorageError;
use std::fmt;

#[derive(Debug)]
pub enum CacheError {
    /// Invalid or missing configuration; fatal at startup.
    Config(String),
    /// A triple store transaction failed and was rolled back.
    Repository(String),
    /// An HTTP request failed or the final response had a non-success status.
    Fetch { url: String, reason: String },
    /// More redirect hops than the fetcher is willing to follow.
    RedirectLoop(String),
    /// The response body could not be parsed as RDF.
    Parse { url: String, reason: String },
    /// No RDF parser is registered for the response content type.
    UnsupportedMediaType { url: String, media_type: String },
    /// A lock could not be acquired.
    Concurrency(String),
}

impl CacheError {
    /// Terminal errors are not retried; fetching the same URL again would
    /// yield the same unparseable body.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CacheError::Parse { .. } | CacheError::UnsupportedMediaType { .. }
        )
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CacheError::Config(msg) => write!(f, "configuration error: {msg}"),
            CacheError::Repository(msg) => write!(f, "repository error: {msg}"),
            CacheError::Fetch { url, reason } => write!(f, "failed to fetch {url}: {reason}"),
            CacheError::RedirectLoop(url) => {
                write!(f, "more than 10 redirects while fetching {url}, aborting")
            }
            CacheError::Parse { url, reason } => {
                write!(f, "unable to parse RDF from {url}: {reason}")
            }
            CacheError::UnsupportedMediaType { url, media_type } => {
                write!(f, "no RDF parser for media type {media_type} (from {url})")
            }
            CacheError::Concurrency(msg) => write!(f, "concurrency error: {msg}"),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<StorageError> for CacheError {
    fn from(e: StorageError) -> Self {
        CacheError::Repository(e.to_string())
    }
}
