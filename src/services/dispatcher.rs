use std::sync::Arc;

use serde_json::Value;
use tracing::instrument;

use crate::{
    cache::{Fingerprint, ResponseCache},
    cached,
    error::AppResult,
    models::{InboundParams, UpstreamRequest},
    services::{
        failure,
        routing::Route,
        upstream::UpstreamClient,
    },
};

/// Per-request orchestration: normalize, look up the cache, fetch on a miss
///
/// Concurrent misses for the same fingerprint each go upstream; the last
/// successful write wins.
#[derive(Clone)]
pub struct Dispatcher {
    cache: Arc<ResponseCache>,
    upstream: UpstreamClient,
}

impl Dispatcher {
    pub fn new(cache: Arc<ResponseCache>, upstream: UpstreamClient) -> Self {
        Self { cache, upstream }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }

    /// Resolves `route` against `params` without touching cache or upstream
    pub fn resolve(&self, route: &Route, params: &InboundParams) -> AppResult<(UpstreamRequest, Fingerprint)> {
        let request = route.resolve(params).inspect_err(|e| failure::log_rejected(e, route.family()))?;
        let fingerprint = Fingerprint::new(&request.path, &request.params);
        Ok((request, fingerprint))
    }

    /// Handles one proxied request, returning the upstream JSON body verbatim
    #[instrument(skip(self, route, params), fields(route = %route.family()))]
    pub async fn handle(&self, route: &Route, params: &InboundParams) -> AppResult<Value> {
        let (request, fingerprint) = self.resolve(route, params)?;
        let family = route.family();

        let payload: Value = cached!(self.cache, fingerprint, async {
            tracing::info!(fingerprint = %fingerprint, "Fetching from upstream");
            self.upstream
                .fetch(&request)
                .await
                .map_err(|e| failure::translate_upstream(e, family, &fingerprint))
        })?;

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::{AppError, UpstreamError};
    use crate::services::upstream::{MockTransport, RetryPolicy, Sleeper};
    use crate::services::upstream::Transport;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Barrier;

    struct NoSleep;

    #[async_trait::async_trait]
    impl Sleeper for NoSleep {
        async fn sleep(&self, _duration: Duration) {}
    }

    fn dispatcher(transport: MockTransport) -> (Dispatcher, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = Arc::new(ResponseCache::new(clock.clone()));
        let upstream = UpstreamClient::new(Arc::new(transport), RetryPolicy::default(), Arc::new(NoSleep));
        (Dispatcher::new(cache, upstream), clock)
    }

    fn inbound(pairs: &[(&str, &str)]) -> InboundParams {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[tokio::test]
    async fn test_cache_hit_avoids_upstream_call() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .times(1)
            .returning(|_| Ok(json!({"page": 1, "results": []})));
        let (dispatcher, clock) = dispatcher(transport);

        let first = dispatcher.handle(&Route::Movies, &InboundParams::new()).await.unwrap();
        clock.advance(chrono::Duration::minutes(4));
        let second = dispatcher.handle(&Route::Movies, &InboundParams::new()).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_expired_entry_triggers_fresh_fetch() {
        let mut transport = MockTransport::new();
        let mut seq = mockall::Sequence::new();
        transport
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(json!({"v": 1})));
        transport
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(json!({"v": 2})));
        let (dispatcher, clock) = dispatcher(transport);
        let route = Route::Movie { id: "550".into() };

        assert_eq!(dispatcher.handle(&route, &InboundParams::new()).await.unwrap(), json!({"v": 1}));
        clock.advance(chrono::Duration::minutes(5) + chrono::Duration::seconds(1));
        assert_eq!(dispatcher.handle(&route, &InboundParams::new()).await.unwrap(), json!({"v": 2}));
    }

    #[tokio::test]
    async fn test_parameter_order_shares_cache_entry() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .times(1)
            .returning(|_| Ok(json!({"results": []})));
        let (dispatcher, _clock) = dispatcher(transport);
        let route = Route::Discover(crate::services::routing::MediaKind::Movie);

        dispatcher
            .handle(&route, &inbound(&[("with_genres", "28"), ("page", "2")]))
            .await
            .unwrap();
        dispatcher
            .handle(&route, &inbound(&[("page", "2"), ("with_genres", "28")]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_retry_exhaustion_surfaces_failure() {
        let mut transport = MockTransport::new();
        transport.expect_get().times(4).returning(|_| {
            Err(UpstreamError::Status {
                status: 503,
                body: String::new(),
            })
        });
        let (dispatcher, _clock) = dispatcher(transport);

        let err = dispatcher
            .handle(&Route::TvPopular, &InboundParams::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::Upstream(UpstreamError::Status { status: 503, .. })
        ));
        assert!(dispatcher.cache().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mut transport = MockTransport::new();
        transport.expect_get().times(1).returning(|_| {
            Err(UpstreamError::Status {
                status: 404,
                body: String::new(),
            })
        });
        let (dispatcher, _clock) = dispatcher(transport);

        let err = dispatcher
            .handle(&Route::Person { id: "999999999".into() }, &InboundParams::new())
            .await
            .unwrap_err();

        assert_eq!(err.status_and_code().0.as_u16(), 404);
    }

    #[tokio::test]
    async fn test_missing_query_never_calls_upstream() {
        let mut transport = MockTransport::new();
        transport.expect_get().never();
        let (dispatcher, _clock) = dispatcher(transport);

        let err = dispatcher
            .handle(&Route::SearchMovie, &InboundParams::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MissingParameter("query")));
    }

    #[tokio::test]
    async fn test_failure_does_not_poison_cache() {
        let mut transport = MockTransport::new();
        let mut seq = mockall::Sequence::new();
        transport
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(UpstreamError::Decode("truncated".into())));
        transport
            .expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(json!({"genres": []})));
        let (dispatcher, _clock) = dispatcher(transport);
        let route = Route::Genres(crate::services::routing::MediaKind::Movie);

        assert!(dispatcher.handle(&route, &InboundParams::new()).await.is_err());
        assert_eq!(
            dispatcher.handle(&route, &InboundParams::new()).await.unwrap(),
            json!({"genres": []})
        );
    }

    /// Transport whose calls only complete once `parties` of them are in flight
    struct BarrierTransport {
        barrier: Barrier,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Transport for BarrierTransport {
        async fn get(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
            self.calls.lock().unwrap().push(request.path.clone());
            self.barrier.wait().await;
            Ok(json!({"path": request.path}))
        }

        fn name(&self) -> &'static str {
            "barrier"
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_distinct_fingerprints_dispatch_in_parallel() {
        const ROUTES: usize = 8;
        let transport = Arc::new(BarrierTransport {
            barrier: Barrier::new(ROUTES),
            calls: Mutex::new(Vec::new()),
        });
        let cache = Arc::new(ResponseCache::new(Arc::new(ManualClock::default())));
        let upstream = UpstreamClient::new(transport.clone(), RetryPolicy::default(), Arc::new(NoSleep));
        let dispatcher = Dispatcher::new(cache, upstream);

        let tasks: Vec<_> = (1..=ROUTES)
            .map(|id| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    let route = Route::Movie { id: id.to_string() };
                    dispatcher.handle(&route, &InboundParams::new()).await
                })
            })
            .collect();

        // every call waits on the others, so serialized dispatch would never finish
        let results = tokio::time::timeout(Duration::from_secs(5), async {
            let mut results = Vec::new();
            for task in tasks {
                results.push(task.await.unwrap());
            }
            results
        })
        .await
        .expect("dispatch was serialized");

        for (id, result) in (1..=ROUTES).zip(results) {
            assert_eq!(result.unwrap(), json!({"path": format!("/movie/{}", id)}));
        }

        let mut calls = transport.calls.lock().unwrap().clone();
        calls.sort();
        let mut expected: Vec<String> = (1..=ROUTES).map(|id| format!("/movie/{}", id)).collect();
        expected.sort();
        assert_eq!(calls, expected);
        assert_eq!(dispatcher.cache().len(), ROUTES);
    }
}
