use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::{
    models::{HealthResponse, HealthStatus},
    services::health,
};

use super::AppState;

/// Reports `ok` when TMDB answers a probe, `degraded` with 503 otherwise
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let report = health::check(&state.dispatcher).await;
    let status = match report.status {
        HealthStatus::Ok => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(report))
}
