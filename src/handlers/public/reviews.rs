use std::collections::HashMap;

use axum::extract::{Query, State};

use crate::error::ApiError;
use crate::factory;
use crate::middleware::ApiResponse;
use crate::resources::REVIEWS;
use crate::state::AppState;

pub async fn list_reviews(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ApiResponse, ApiError> {
    factory::list_all(&REVIEWS, &state, &params).await
}
