use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;

use crate::error::ApiError;
use crate::factory;
use crate::middleware::ApiResponse;
use crate::resources::TOURS;
use crate::state::AppState;

pub async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse, ApiError> {
    factory::get_one(&TOURS, &state, &id).await
}

pub async fn create_tour(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<ApiResponse, ApiError> {
    factory::create_one(&TOURS, &state, None, body).await
}
