//! Upstream movie-metadata client
//!
//! A [`Transport`] performs exactly one HTTP GET against the upstream API.
//! [`UpstreamClient`] wraps a transport with the retry policy, so swapping the
//! transport (e.g. for a mock in tests) keeps the retry behavior intact.

use std::sync::Arc;

use serde_json::Value;

use crate::{error::UpstreamError, models::UpstreamRequest};

pub mod retry;
pub mod tmdb;

pub use retry::{with_retry, RetryPolicy, Sleeper, TokioSleeper};
pub use tmdb::TmdbTransport;

/// A single attempt at an upstream call
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Performs one GET and returns the parsed JSON body on a 2xx response
    async fn get(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError>;

    /// Transport name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Retrying upstream client shared by all requests
#[derive(Clone)]
pub struct UpstreamClient {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl UpstreamClient {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            transport,
            policy,
            sleeper,
        }
    }

    /// Client with the default retry policy sleeping on the tokio timer
    pub fn with_defaults(transport: Arc<dyn Transport>) -> Self {
        Self::new(transport, RetryPolicy::default(), Arc::new(TokioSleeper))
    }

    /// Fetches `request`, retrying transient failures per the policy
    pub async fn fetch(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        with_retry(&self.policy, self.sleeper.as_ref(), &request.path, || {
            self.transport.get(request)
        })
        .await
    }

    /// Single attempt without retries, used for health probes
    pub async fn probe(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        self.transport.get(request).await
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }
}
