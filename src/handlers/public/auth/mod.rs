pub mod password;
pub mod session;

use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::json;

use crate::auth::issue_token;
use crate::config::config;
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::models::Principal;

/// Sign a token, set the `jwt` session cookie, and build the session body.
/// Shared by register, login, reset, and password update.
pub fn issue_session(
    jar: CookieJar,
    principal: &Principal,
    created: bool,
) -> Result<(CookieJar, ApiResponse), ApiError> {
    let token = issue_token(principal.id)?;

    let cookie = Cookie::build(("jwt", token.clone()))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::minutes(config().security.cookie_ttl_minutes))
        .build();

    let response = if created {
        ApiResponse::created()
    } else {
        ApiResponse::ok()
    };
    let response = response.data(json!({
        "token": token,
        "user": principal.public_json(),
    }));
    Ok((jar.add(cookie), response))
}
