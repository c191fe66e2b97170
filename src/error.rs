// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Identity and token errors stay deliberately vague so responses cannot be
/// used as an oracle; validation errors carry enough detail to fix the request.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    TokenInvalid(String),
    Conflict(String),

    // 401 Unauthorized
    Unauthenticated(String),
    AccountSuspended(String),

    // 403 Forbidden
    Forbidden(String),
    TokenExpired(String),
    StalePassword(String),
    ResetTokenInvalid(String),

    // 404 Not Found
    NotFound(String),
    PrincipalNotFound(String),

    // 500 Internal Server Error
    Internal(String),
}

impl ApiError {
    /// Get HTTP status code.
    ///
    /// The expired-token 403 vs malformed-token 400 asymmetry is part of the
    /// preserved wire contract, as is Conflict surfacing under 400.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::TokenInvalid(_) => 400,
            ApiError::Conflict(_) => 400,
            ApiError::Unauthenticated(_) => 401,
            ApiError::AccountSuspended(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::TokenExpired(_) => 403,
            ApiError::StalePassword(_) => 403,
            ApiError::ResetTokenInvalid(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::PrincipalNotFound(_) => 404,
            ApiError::Internal(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::TokenInvalid(msg)
            | ApiError::Conflict(msg)
            | ApiError::Unauthenticated(msg)
            | ApiError::AccountSuspended(msg)
            | ApiError::Forbidden(msg)
            | ApiError::TokenExpired(msg)
            | ApiError::StalePassword(msg)
            | ApiError::ResetTokenInvalid(msg)
            | ApiError::NotFound(msg)
            | ApiError::PrincipalNotFound(msg)
            | ApiError::Internal(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::TokenInvalid(_) => "TOKEN_INVALID",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::AccountSuspended(_) => "ACCOUNT_SUSPENDED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::TokenExpired(_) => "TOKEN_EXPIRED",
            ApiError::StalePassword(_) => "STALE_PASSWORD",
            ApiError::ResetTokenInvalid(_) => "RESET_TOKEN_INVALID",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::PrincipalNotFound(_) => "PRINCIPAL_NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "message": self.message(),
            "error": self.error_code(),
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn token_invalid(message: impl Into<String>) -> Self {
        ApiError::TokenInvalid(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn account_suspended(message: impl Into<String>) -> Self {
        ApiError::AccountSuspended(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn token_expired(message: impl Into<String>) -> Self {
        ApiError::TokenExpired(message.into())
    }

    pub fn stale_password(message: impl Into<String>) -> Self {
        ApiError::StalePassword(message.into())
    }

    pub fn reset_token_invalid(message: impl Into<String>) -> Self {
        ApiError::ResetTokenInvalid(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn principal_not_found(message: impl Into<String>) -> Self {
        ApiError::PrincipalNotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

// Convert other error types to ApiError
impl From<crate::store::StoreError> for ApiError {
    fn from(err: crate::store::StoreError) -> Self {
        match err {
            crate::store::StoreError::UniqueViolation { collection, .. } => {
                ApiError::conflict(format!(
                    "A record with these values already exists in {}",
                    collection
                ))
            }
            crate::store::StoreError::Serialization(msg) => {
                tracing::error!("Record serialization error: {}", msg);
                ApiError::internal("An error occurred while processing your request")
            }
            crate::store::StoreError::Backend(msg) => {
                // Don't expose internal storage errors to clients
                tracing::error!("Store backend error: {}", msg);
                ApiError::internal("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::query::QueryError> for ApiError {
    fn from(err: crate::query::QueryError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<crate::auth::token::TokenError> for ApiError {
    fn from(err: crate::auth::token::TokenError) -> Self {
        match err {
            crate::auth::token::TokenError::Expired => {
                ApiError::token_expired("Your session has expired, please log in again")
            }
            crate::auth::token::TokenError::Malformed => {
                ApiError::token_invalid("The token sent is not valid, please log in again")
            }
            crate::auth::token::TokenError::MissingSecret
            | crate::auth::token::TokenError::Signing(_) => {
                tracing::error!("JWT configuration error: {}", err);
                ApiError::internal("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::mail::MailError> for ApiError {
    fn from(err: crate::mail::MailError) -> Self {
        tracing::error!("Mail delivery error: {}", err);
        ApiError::internal("Failed to deliver email, please try again later")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
