use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{MovieId, Recommendation},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub movie: Option<MovieId>,
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    pub movie_id: MovieId,
    #[serde(default)]
    pub count: Option<usize>,
}

async fn run(
    state: &AppState,
    request_id: &RequestId,
    movie: MovieId,
    count: Option<usize>,
) -> Vec<Recommendation> {
    let count = count.unwrap_or_else(|| state.recommender.default_count());

    tracing::info!(
        request_id = %request_id,
        movie_id = %movie,
        count = count,
        "Processing recommendation request"
    );

    let recommendations = state
        .recommender
        .recommend_from_catalog(state.catalog.as_ref(), &movie, count)
        .await;

    tracing::info!(
        request_id = %request_id,
        results = recommendations.len(),
        "Recommendation request completed"
    );

    recommendations
}

/// `POST /recommend` with `{"movie": id}`
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendRequest>,
) -> AppResult<Json<RecommendResponse>> {
    let movie = request
        .movie
        .ok_or_else(|| AppError::InvalidInput("Movie id is required".to_string()))?;

    let recommendations = run(&state, &request_id, movie, request.count).await;
    Ok(Json(RecommendResponse { recommendations }))
}

/// `POST /api/v1/recommendations/predict` with `{"movieId": id}`
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<PredictRequest>,
) -> Json<Vec<Recommendation>> {
    Json(run(&state, &request_id, request.movie_id, request.count).await)
}
