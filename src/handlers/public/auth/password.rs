use axum::extract::{Path, State};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use super::issue_session;
use crate::auth::reset;
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub password: String,
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<ApiResponse, ApiError> {
    if body.email.is_empty() {
        return Err(ApiError::bad_request("Please provide your email address"));
    }
    reset::issue(state.store.as_ref(), state.mailer.as_ref(), &body.email).await?;
    Ok(ApiResponse::ok().message("Reset token sent to email"))
}

/// Redeeming a valid token also logs the caller in.
pub async fn reset_password(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(token): Path<String>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<(CookieJar, ApiResponse), ApiError> {
    if body.password.is_empty() {
        return Err(ApiError::bad_request("Please provide a new password"));
    }
    let principal = reset::redeem(state.store.as_ref(), &token, &body.password).await?;
    issue_session(jar, &principal, false)
}
