use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{providers::CatalogProvider, Recommender},
};

pub mod movies;
pub mod recommendations;

/// Shared application state
pub struct AppState {
    pub catalog: Arc<dyn CatalogProvider>,
    pub recommender: Recommender,
}

impl AppState {
    pub fn new(catalog: Arc<dyn CatalogProvider>, recommender: Recommender) -> Self {
        Self {
            catalog,
            recommender,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/recommend", post(recommendations::recommend))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies/popular", get(movies::popular))
        .route("/movies/search", get(movies::search))
        .route("/movies/discover", get(movies::discover))
        .route("/movies/mood", get(movies::mood))
        .route("/movies/:id", get(movies::details))
        .route("/recommendations/predict", post(recommendations::predict))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
