use axum::{
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    error::AppResult, middleware::request_id::RequestId, models::InboundParams,
    services::routing::Route,
};

use super::{extract::ApiQuery, proxy, AppState};

/// Movies, TV shows and people matching `query`
pub async fn multi(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiQuery(params): ApiQuery<InboundParams>,
) -> AppResult<Json<Value>> {
    proxy(&state, &request_id, Route::SearchMulti, &params).await
}

/// Movies matching `query`, optionally narrowed by release year
pub async fn movie(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiQuery(params): ApiQuery<InboundParams>,
) -> AppResult<Json<Value>> {
    proxy(&state, &request_id, Route::SearchMovie, &params).await
}

/// Older clients call `/search/movies`; send them to `/search/movie` with a 302
pub async fn legacy_movies(RawQuery(query): RawQuery) -> impl IntoResponse {
    let location = match query {
        Some(query) if !query.is_empty() => format!("/api/search/movie?{}", query),
        _ => "/api/search/movie".to_string(),
    };
    (StatusCode::FOUND, [(header::LOCATION, location)])
}
