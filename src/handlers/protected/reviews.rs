use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde_json::Value;

use crate::error::ApiError;
use crate::factory;
use crate::middleware::{ApiResponse, CurrentUser};
use crate::resources::REVIEWS;
use crate::state::AppState;

pub async fn create_review(
    State(state): State<AppState>,
    Extension(CurrentUser(principal)): Extension<CurrentUser>,
    Json(body): Json<Value>,
) -> Result<ApiResponse, ApiError> {
    factory::create_one(&REVIEWS, &state, Some(&principal), body).await
}

pub async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<ApiResponse, ApiError> {
    factory::update_one(&REVIEWS, &state, &id, body).await
}

pub async fn delete_review(
    State(state): State<AppState>,
    Extension(CurrentUser(principal)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<ApiResponse, ApiError> {
    factory::delete_one(&REVIEWS, &state, Some(&principal), &id).await
}
