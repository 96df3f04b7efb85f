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
    services::routing::{MovieList, MovieSubresource, Route},
};

use super::{
    extract::{ApiPath, ApiQuery},
    proxy, AppState,
};

/// Search when `query` is non-empty, popular movies otherwise
pub async fn list(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiQuery(params): ApiQuery<InboundParams>,
) -> AppResult<Json<Value>> {
    tracing::info!(
        request_id = %request_id,
        query = params.get("query").unwrap_or_default(),
        "Movies request"
    );
    proxy(&state, &request_id, Route::Movies, &params).await
}

pub async fn popular(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiQuery(params): ApiQuery<InboundParams>,
) -> AppResult<Json<Value>> {
    proxy(&state, &request_id, Route::MovieList(MovieList::Popular), &params).await
}

pub async fn top_rated(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiQuery(params): ApiQuery<InboundParams>,
) -> AppResult<Json<Value>> {
    proxy(&state, &request_id, Route::MovieList(MovieList::TopRated), &params).await
}

pub async fn upcoming(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiQuery(params): ApiQuery<InboundParams>,
) -> AppResult<Json<Value>> {
    proxy(&state, &request_id, Route::MovieList(MovieList::Upcoming), &params).await
}

pub async fn now_playing(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiQuery(params): ApiQuery<InboundParams>,
) -> AppResult<Json<Value>> {
    proxy(&state, &request_id, Route::MovieList(MovieList::NowPlaying), &params).await
}

/// Movie details with videos, credits, similar and recommendations
pub async fn details(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiPath(id): ApiPath<String>,
    ApiQuery(params): ApiQuery<InboundParams>,
) -> AppResult<Json<Value>> {
    proxy(&state, &request_id, Route::Movie { id }, &params).await
}

async fn subresource(
    state: &AppState,
    request_id: &RequestId,
    id: String,
    sub: MovieSubresource,
    params: &InboundParams,
) -> AppResult<Json<Value>> {
    proxy(state, request_id, Route::MovieSub { id, sub }, params).await
}

pub async fn credits(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiPath(id): ApiPath<String>,
    ApiQuery(params): ApiQuery<InboundParams>,
) -> AppResult<Json<Value>> {
    subresource(&state, &request_id, id, MovieSubresource::Credits, &params).await
}

pub async fn videos(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiPath(id): ApiPath<String>,
    ApiQuery(params): ApiQuery<InboundParams>,
) -> AppResult<Json<Value>> {
    subresource(&state, &request_id, id, MovieSubresource::Videos, &params).await
}

pub async fn similar(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiPath(id): ApiPath<String>,
    ApiQuery(params): ApiQuery<InboundParams>,
) -> AppResult<Json<Value>> {
    subresource(&state, &request_id, id, MovieSubresource::Similar, &params).await
}

pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    ApiPath(id): ApiPath<String>,
    ApiQuery(params): ApiQuery<InboundParams>,
) -> AppResult<Json<Value>> {
    subresource(&state, &request_id, id, MovieSubresource::Recommendations, &params).await
}
