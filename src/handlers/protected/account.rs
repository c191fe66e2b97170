use axum::extract::State;
use axum::{Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::auth::{hash_password, reset, verify_password};
use crate::error::ApiError;
use crate::handlers::public::auth::issue_session;
use crate::mail::MailMessage;
use crate::middleware::{ApiResponse, CurrentUser};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Password change for a logged-in account. Re-authenticates with the current
/// password, stamps the change so outstanding tokens go stale, and issues a
/// fresh session.
pub async fn update_password(
    State(state): State<AppState>,
    Extension(CurrentUser(principal)): Extension<CurrentUser>,
    jar: CookieJar,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<(CookieJar, ApiResponse), ApiError> {
    if body.current_password.is_empty() || body.new_password.is_empty() {
        return Err(ApiError::bad_request(
            "Please provide your current and new passwords",
        ));
    }
    if !verify_password(&body.current_password, &principal.password_hash) {
        return Err(ApiError::forbidden("Your current password is incorrect"));
    }

    let mut principal = principal;
    principal.password_hash = hash_password(&body.new_password)?;
    principal.pass_changed_at = Some(reset::stamp_password_change());
    reset::save_principal(state.store.as_ref(), &principal).await?;

    state
        .mailer
        .send(MailMessage {
            to: principal.email.clone(),
            subject: "Your password was changed".to_string(),
            text: "Your password was just changed. If this wasn't you, \
                   reset your password immediately."
                .to_string(),
            html: None,
        })
        .await?;

    issue_session(jar, &principal, false)
}
