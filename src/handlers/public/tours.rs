use std::collections::HashMap;

use axum::extract::{Query, State};

use crate::error::ApiError;
use crate::factory;
use crate::middleware::ApiResponse;
use crate::resources::TOURS;
use crate::state::AppState;

pub async fn list_tours(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ApiResponse, ApiError> {
    factory::list_all(&TOURS, &state, &params).await
}

/// Alias preset over the same query surface: the five best-rated tours.
/// Client-supplied sort/limit/page are overridden, filters still apply.
pub async fn top_tours(
    State(state): State<AppState>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Result<ApiResponse, ApiError> {
    params.insert(
        "sort".to_string(),
        "-ratings_average,-ratings_quantity".to_string(),
    );
    params.insert("limit".to_string(), "5".to_string());
    params.insert("page".to_string(), "1".to_string());
    factory::list_all(&TOURS, &state, &params).await
}
