use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    cache::ResponseCache,
    clock::SystemClock,
    config::Config,
    error::AppResult,
    middleware::request_id::{make_span_with_request_id, request_id_middleware, RequestId},
    models::InboundParams,
    services::{Dispatcher, Route, TmdbTransport, UpstreamClient},
};

pub mod discover;
pub mod extract;
pub mod health;
pub mod movies;
pub mod people;
pub mod search;
pub mod tv;

/// Shared application state
pub struct AppState {
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Builds the production state: system clock, TMDB transport, default retry policy
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let transport = TmdbTransport::new(config.tmdb_api_key.clone(), config.tmdb_base_url.clone())?;
        let cache = Arc::new(ResponseCache::new(Arc::new(SystemClock)));
        let upstream = UpstreamClient::with_defaults(Arc::new(transport));
        Ok(Self::new(Dispatcher::new(cache, upstream)))
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
}

/// Proxy routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        // Movies
        .route("/movies", get(movies::list))
        .route("/movies/popular", get(movies::popular))
        .route("/movies/top_rated", get(movies::top_rated))
        .route("/movies/upcoming", get(movies::upcoming))
        .route("/movies/now_playing", get(movies::now_playing))
        .route("/movies/:id", get(movies::details))
        .route("/movies/:id/credits", get(movies::credits))
        .route("/movies/:id/videos", get(movies::videos))
        .route("/movies/:id/similar", get(movies::similar))
        .route("/movies/:id/recommendations", get(movies::recommendations))
        // TV
        .route("/tv/popular", get(tv::popular))
        .route("/tv/:id", get(tv::details))
        // People and genres
        .route("/person/:id", get(people::details))
        .route("/genres/movie", get(discover::movie_genres))
        .route("/genres/tv", get(discover::tv_genres))
        // Discover
        .route("/discover/movie", get(discover::movies))
        .route("/discover/tv", get(discover::tv))
        // Search
        .route("/search/multi", get(search::multi))
        .route("/search/movie", get(search::movie))
        .route("/search/movies", get(search::legacy_movies))
}

/// CORS policy for the configured frontend origin
pub fn cors_layer(config: &Config) -> AppResult<CorsLayer> {
    let allow_origin = if config.allows_any_origin() {
        AllowOrigin::from(Any)
    } else {
        let origin = config.cors_origin.trim();
        let value = HeaderValue::from_str(origin).map_err(|e| {
            crate::error::AppError::InvalidInput(format!("Invalid CORS origin '{}': {}", origin, e))
        })?;
        AllowOrigin::exact(value)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any))
}

async fn root() -> &'static str {
    "TMDB Proxy API is running"
}

/// Runs `route` through the dispatcher and returns the upstream body
async fn proxy(
    state: &AppState,
    request_id: &RequestId,
    route: Route,
    params: &InboundParams,
) -> AppResult<Json<serde_json::Value>> {
    tracing::debug!(request_id = %request_id, route = ?route, "Dispatching proxy request");
    let payload = state.dispatcher.handle(&route, params).await?;
    Ok(Json(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    fn config(cors_origin: &str) -> Config {
        Config::from_iter([
            ("TMDB_API_KEY".to_string(), "key".to_string()),
            ("CORS_ORIGIN".to_string(), cors_origin.to_string()),
        ])
        .unwrap()
    }

    #[test]
    fn test_cors_any() {
        assert!(cors_layer(&config("*")).is_ok());
        assert!(cors_layer(&config(" * ")).is_ok());
    }

    #[test]
    fn test_cors_exact_origin() {
        assert!(cors_layer(&config("https://movies.example")).is_ok());
        assert!(cors_layer(&config("bad\norigin")).is_err());
    }

    #[tokio::test]
    async fn test_root_banner() {
        assert_eq!(root().await.into_response().status(), axum::http::StatusCode::OK);
    }
}
