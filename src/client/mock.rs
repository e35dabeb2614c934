//! Mock incident fetcher for testing
//!
//! Provides a scripted implementation of [`IncidentFetcher`] so cache and
//! pipeline tests never touch the network.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::{FetchRequest, IncidentFetcher};
use crate::error::FetchError;

/// Mock fetcher for testing.
///
/// Configure responses via builder methods, then use in tests.
///
/// # Example
/// ```ignore
/// let mock = MockFetcher::new().with_payload(br#"{"incidents": []}"#);
///
/// let body = mock.fetch(&FetchRequest::new("http://status")).await?;
/// assert_eq!(mock.call_count().await, 1);
/// ```
#[derive(Clone, Default)]
pub struct MockFetcher {
    /// Body returned on success
    payload: Arc<Mutex<Vec<u8>>>,
    /// Error to return (if any) - consumed on first use
    error: Arc<Mutex<Option<FetchError>>>,
    /// Fail every call instead of just the next one
    always_fail: Arc<Mutex<bool>>,
    /// Simulated network latency
    delay: Arc<Mutex<Option<Duration>>>,
    /// Number of fetch calls made
    calls: Arc<Mutex<usize>>,
    /// Requests seen, for assertions
    captured: Arc<Mutex<Vec<FetchRequest>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond with `payload` on success
    pub fn with_payload(self, payload: &[u8]) -> Self {
        *self.payload.try_lock().expect("mock not shared yet") = payload.to_vec();
        self
    }

    /// Fail the next call with `error`
    pub fn with_error(self, error: FetchError) -> Self {
        *self.error.try_lock().expect("mock not shared yet") = Some(error);
        self
    }

    /// Fail every call with a network error
    pub fn failing(self) -> Self {
        *self.always_fail.try_lock().expect("mock not shared yet") = true;
        self
    }

    /// Sleep for `delay` before answering
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.try_lock().expect("mock not shared yet") = Some(delay);
        self
    }

    /// Replace the success payload after construction
    pub async fn set_payload(&self, payload: &[u8]) {
        *self.payload.lock().await = payload.to_vec();
    }

    /// Number of fetch calls made so far
    pub async fn call_count(&self) -> usize {
        *self.calls.lock().await
    }

    /// Requests received so far
    pub async fn captured_requests(&self) -> Vec<FetchRequest> {
        self.captured.lock().await.clone()
    }
}

#[async_trait]
impl IncidentFetcher for MockFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, FetchError> {
        *self.calls.lock().await += 1;
        self.captured.lock().await.push(request.clone());

        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.error.lock().await.take() {
            return Err(err);
        }
        if *self.always_fail.lock().await {
            return Err(FetchError::Network("connection refused".to_string()));
        }

        Ok(self.payload.lock().await.clone())
    }
}
