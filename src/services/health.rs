use crate::{
    models::{HealthResponse, HealthStatus, UpstreamRequest},
    services::dispatcher::Dispatcher,
};

/// Upstream endpoint used as a liveness probe
pub const PROBE_PATH: &str = "/configuration";

/// Probes upstream once, bypassing cache and retries
pub async fn check(dispatcher: &Dispatcher) -> HealthResponse {
    let cache_entries = dispatcher.cache().len();

    match dispatcher.upstream().probe(&UpstreamRequest::new(PROBE_PATH)).await {
        Ok(_) => HealthResponse {
            status: HealthStatus::Ok,
            message: "Server and TMDB connection are healthy".to_string(),
            cache_entries,
        },
        Err(e) => {
            tracing::warn!(
                error = %e,
                transport = dispatcher.upstream().transport_name(),
                "Health probe failed"
            );
            HealthResponse {
                status: HealthStatus::Degraded,
                message: "TMDB connection failed".to_string(),
                cache_entries,
            }
        }
    }
}
