use axum::{
    extract::State,
    Extension, Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::InboundParams,
    services::routing::{MediaKind, Route},
};

use super::{extract::ApiQuery, proxy, AppState};

/// Discover movies with optional genre, year, rating and provider filters
pub async fn movies(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiQuery(params): ApiQuery<InboundParams>,
) -> AppResult<Json<Value>> {
    proxy(&state, &request_id, Route::Discover(MediaKind::Movie), &params).await
}

/// Discover TV shows with optional genre, first-air year and rating filters
pub async fn tv(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiQuery(params): ApiQuery<InboundParams>,
) -> AppResult<Json<Value>> {
    proxy(&state, &request_id, Route::Discover(MediaKind::Tv), &params).await
}

pub async fn movie_genres(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<Value>> {
    proxy(&state, &request_id, Route::Genres(MediaKind::Movie), &InboundParams::new()).await
}

pub async fn tv_genres(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<Value>> {
    proxy(&state, &request_id, Route::Genres(MediaKind::Tv), &InboundParams::new()).await
}
