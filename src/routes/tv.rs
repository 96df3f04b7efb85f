use axum::{
    extract::State,
    Extension, Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    error::AppResult, middleware::request_id::RequestId, models::InboundParams,
    services::routing::Route,
};

use super::{
    extract::{ApiPath, ApiQuery},
    proxy, AppState,
};

pub async fn popular(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiQuery(params): ApiQuery<InboundParams>,
) -> AppResult<Json<Value>> {
    proxy(&state, &request_id, Route::TvPopular, &params).await
}

/// TV show details with videos, credits, similar and recommendations
pub async fn details(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiPath(id): ApiPath<String>,
    ApiQuery(params): ApiQuery<InboundParams>,
) -> AppResult<Json<Value>> {
    proxy(&state, &request_id, Route::Tv { id }, &params).await
}
