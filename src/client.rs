//! HTTP client used by virtual users, with request timing

use crate::{
    error::{AppError, Result},
    models::RequestSample,
    types::Endpoint,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// HTTP client trait for abstraction and testing
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute a GET request and read the whole body
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// Response data the load tester cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body_size: usize,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }
}

/// reqwest-backed client sharing one connection pool across all VUs
pub struct BooksClient {
    client: Client,
    request_timeout: Duration,
}

impl BooksClient {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, request_timeout })
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

#[async_trait]
impl HttpClient for BooksClient {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self.client.get(url).send().await.map_err(map_request_error)?;
        let status_code = response.status().as_u16();

        let body = response.bytes().await.map_err(map_request_error)?;

        Ok(HttpResponse {
            status_code,
            body_size: body.len(),
        })
    }
}

fn map_request_error(error: reqwest::Error) -> AppError {
    if error.is_timeout() {
        AppError::timeout(format!("HTTP request timed out: {}", error))
    } else {
        AppError::http_request(error.to_string())
    }
}

/// Issue one GET against `endpoint` and turn the outcome into a sample.
///
/// Transport errors and timeouts never propagate; they become samples
/// with status 0. The measured duration spans the whole exchange, so the
/// first request on a new pooled connection includes DNS and connect time.
pub async fn issue_request(
    client: &dyn HttpClient,
    base_url: &str,
    scenario: &str,
    endpoint: Endpoint,
    request_timeout: Duration,
) -> RequestSample {
    let url = endpoint.url(base_url);
    let start = Instant::now();

    match timeout(request_timeout, client.get(&url)).await {
        Ok(Ok(response)) => RequestSample::completed(scenario, endpoint, response.status_code, start.elapsed()),
        Ok(Err(AppError::Timeout(_))) | Err(_) => RequestSample::timeout(scenario, endpoint, request_timeout),
        Ok(Err(e)) => RequestSample::failed(scenario, endpoint, start.elapsed(), e.to_string()),
    }
}
