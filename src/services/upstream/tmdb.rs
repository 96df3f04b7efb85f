//! TMDB HTTP transport
//!
//! Talks to the TMDB v3 API with a bearer token. Connections are pooled and
//! reused; concurrent in-flight requests are capped so sustained traffic
//! cannot exhaust sockets toward the single upstream host.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client as HttpClient};
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::{
    error::{AppError, AppResult, UpstreamError},
    models::UpstreamRequest,
    services::upstream::Transport,
};

/// Per-attempt timeout, covering the wait for a connection slot
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum concurrent connections to the upstream host
pub const MAX_CONNECTIONS: usize = 50;
/// Idle pooled connections are closed after this long
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30);
/// Keepalive probe interval; dead peers are dropped after this much silence
pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest upstream error body kept for logging
const MAX_LOGGED_BODY: usize = 512;

#[derive(Clone)]
pub struct TmdbTransport {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
    connections: Arc<Semaphore>,
}

impl TmdbTransport {
    /// Creates a transport with the tuned connection pool
    pub fn new(api_key: String, base_url: String) -> AppResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let http_client = HttpClient::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(MAX_CONNECTIONS)
            .pool_idle_timeout(IDLE_TIMEOUT)
            .tcp_keepalive(INACTIVITY_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            connections: Arc::new(Semaphore::new(MAX_CONNECTIONS)),
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn attempt(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        let _permit = self
            .connections
            .acquire()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let url = self.url_for(&request.path);
        tracing::debug!(url = %url, params = ?request.params, "Fetching from TMDB");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&request.query_pairs())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let mut body = response.text().await.unwrap_or_default();
            let cut = body
                .char_indices()
                .nth(MAX_LOGGED_BODY)
                .map_or(body.len(), |(i, _)| i);
            body.truncate(cut);
            tracing::warn!(
                path = %request.path,
                status = status,
                body = %body,
                "TMDB API returned error status"
            );
            return Err(UpstreamError::Status { status, body });
        }

        let payload: Value = response.json().await?;
        Ok(payload)
    }
}

#[async_trait::async_trait]
impl Transport for TmdbTransport {
    async fn get(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        tokio::time::timeout(REQUEST_TIMEOUT, self.attempt(request))
            .await
            .map_err(|_| UpstreamError::Timeout)?
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
