use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use serde_json::{json, Value};

use super::issue_session;
use crate::auth::{hash_password, verify_password};
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::models::Principal;
use crate::query::Condition;
use crate::state::AppState;
use crate::store::StoreError;

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<RegisterRequest>,
) -> Result<(CookieJar, ApiResponse), ApiError> {
    if body.name.is_empty() || body.email.is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request(
            "Please provide name, email and password",
        ));
    }

    let doc = match json!({
        "name": body.name,
        "email": body.email,
        "password": hash_password(&body.password)?,
        "photo": "defaultpic.webp",
        "role": "user",
        "active": true,
    }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };

    let created = state.store.insert("users", doc).await.map_err(|err| {
        if matches!(err, StoreError::UniqueViolation { .. }) {
            ApiError::conflict("There is already an account using this email")
        } else {
            err.into()
        }
    })?;
    let principal = Principal::from_document(created).map_err(StoreError::Serialization)?;

    issue_session(jar, &principal, true)
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, ApiResponse), ApiError> {
    if body.email.is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("Please provide email and password"));
    }

    let doc = state
        .store
        .find_one(
            "users",
            &[Condition::eq("email", Value::String(body.email.clone()))],
        )
        .await?;

    // Unknown email and wrong password answer identically
    let Some(doc) = doc else {
        return Err(ApiError::unauthenticated("Incorrect email or password"));
    };
    let principal = Principal::from_document(doc).map_err(StoreError::Serialization)?;
    if !verify_password(&body.password, &principal.password_hash) {
        return Err(ApiError::unauthenticated("Incorrect email or password"));
    }
    if !principal.active {
        return Err(ApiError::account_suspended(
            "This account has been deactivated",
        ));
    }

    issue_session(jar, &principal, false)
}

pub async fn logout(jar: CookieJar) -> (CookieJar, ApiResponse) {
    let cookie = Cookie::build(("jwt", "logged-out"))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(10))
        .build();
    (jar.add(cookie), ApiResponse::ok().message("Logged out"))
}
