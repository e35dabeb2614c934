//! Statuspage v2 HTTP client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::header::ACCEPT;

use super::{FetchRequest, IncidentFetcher};
use crate::error::FetchError;

/// GitHub's public status page incident feed
pub const DEFAULT_API_URL: &str = "https://www.githubstatus.com/api/v2/incidents.json";

/// Longest error body kept in a [`FetchError::Status`]
const MAX_ERROR_BODY: usize = 512;

/// HTTP fetcher for Statuspage-style incident feeds
pub struct StatusPageClient {
    http: HttpClient,
    timeout: Duration,
}

impl StatusPageClient {
    /// Create a client whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(concat!("incidentmap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { http, timeout })
    }
}

#[async_trait]
impl IncidentFetcher for StatusPageClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, FetchError> {
        log::info!("Fetching incidents from {}", request.url);

        let mut builder = self
            .http
            .get(&request.url)
            .header(ACCEPT, "application/json");
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|&i| body.is_char_boundary(i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;
        log::info!("Fetched {} bytes from {}", bytes.len(), request.url);
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = StatusPageClient::new(Duration::from_secs(30));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v2/incidents.json")
            .with_status(200)
            .with_body(r#"{"incidents": []}"#)
            .create_async()
            .await;

        let client = StatusPageClient::new(Duration::from_secs(5)).unwrap();
        let request = FetchRequest::new(format!("{}/api/v2/incidents.json", server.url()));
        let body = client.fetch(&request).await.unwrap();

        assert_eq!(body, br#"{"incidents": []}"#.to_vec());
    }

    #[tokio::test]
    async fn test_fetch_sends_params_and_headers() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("GET", "/incidents.json")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "2".into()))
            .match_header("x-trace", "abc")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = StatusPageClient::new(Duration::from_secs(5)).unwrap();
        let request = FetchRequest::new(format!("{}/incidents.json", server.url()))
            .with_param("page", "2")
            .with_header("x-trace", "abc");
        client.fetch(&request).await.unwrap();

        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_maps_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/incidents.json")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let client = StatusPageClient::new(Duration::from_secs(5)).unwrap();
        let request = FetchRequest::new(format!("{}/incidents.json", server.url()));

        match client.fetch(&request).await {
            Err(FetchError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("Expected FetchError::Status, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_stalled_server_is_timeout() {
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stalled = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let timeout = Duration::from_millis(200);
        let client = StatusPageClient::new(timeout).unwrap();
        let request = FetchRequest::new(format!("http://{}/incidents.json", addr));

        match client.fetch(&request).await {
            Err(FetchError::Timeout(after)) => assert_eq!(after, timeout),
            other => panic!("Expected FetchError::Timeout, got {:?}", other),
        }
        stalled.abort();
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_network_error() {
        let client = StatusPageClient::new(Duration::from_secs(2)).unwrap();
        let request = FetchRequest::new("http://127.0.0.1:9/incidents.json");

        match client.fetch(&request).await {
            Err(FetchError::Network(_)) => (),
            other => panic!("Expected FetchError::Network, got {:?}", other),
        }
    }
}
