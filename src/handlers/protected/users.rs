use std::collections::HashMap;

use axum::extract::{Query, State};

use crate::error::ApiError;
use crate::factory;
use crate::middleware::ApiResponse;
use crate::resources::USERS;
use crate::state::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<ApiResponse, ApiError> {
    factory::list_all(&USERS, &state, &params).await
}
