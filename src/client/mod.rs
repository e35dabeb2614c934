//! Status page client
//!
//! The remote side of the pipeline sits behind [`IncidentFetcher`] so the
//! cache layer can wrap any transport, and tests can swap in a mock.

use async_trait::async_trait;

use crate::cache::cache_key;
use crate::error::FetchError;

pub mod feed;
#[cfg(test)]
pub mod mock;
pub mod statuspage;

pub use feed::{IncidentFeed, RawIncident};
#[cfg(test)]
pub use mock::MockFetcher;
pub use statuspage::{DEFAULT_API_URL, StatusPageClient};

/// Remote fetch collaborator trait
#[async_trait]
pub trait IncidentFetcher: Send + Sync {
    /// Fetch the raw response body for `request`
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, FetchError>;
}

/// A fetch target: the URL plus anything that affects the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Endpoint URL
    pub url: String,

    /// Query parameters (part of the cache identity)
    pub params: Vec<(String, String)>,

    /// Extra request headers (not part of the cache identity)
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    /// Create a request for `url` with no parameters or headers
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// Add a query parameter
    #[cfg(test)]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Add a request header
    #[cfg(test)]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Cache key identifying this request's result
    pub fn cache_key(&self) -> String {
        let params: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        cache_key(&self.url, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_key_ignores_param_order() {
        let a = FetchRequest::new(DEFAULT_API_URL)
            .with_param("page", "1")
            .with_param("per_page", "100");
        let b = FetchRequest::new(DEFAULT_API_URL)
            .with_param("per_page", "100")
            .with_param("page", "1");

        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_request_key_ignores_headers() {
        let plain = FetchRequest::new(DEFAULT_API_URL);
        let with_header = FetchRequest::new(DEFAULT_API_URL).with_header("Accept", "application/json");

        assert_eq!(plain.cache_key(), with_header.cache_key());
    }

    #[test]
    fn test_request_key_tracks_params() {
        let plain = FetchRequest::new(DEFAULT_API_URL);
        let paged = FetchRequest::new(DEFAULT_API_URL).with_param("page", "2");

        assert_ne!(plain.cache_key(), paged.cache_key());
    }
}
