use std::future::Future;
use std::pin::Pin;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use crate::auth::verify_token;
use crate::error::ApiError;
use crate::models::{Principal, Role};
use crate::state::AppState;

/// The authenticated account, inserted as a request extension by
/// [`require_auth`] and read by handlers and [`restrict_to`].
#[derive(Clone)]
pub struct CurrentUser(pub Principal);

fn extract_token(jar: &CookieJar, request: &Request) -> Option<String> {
    // Session cookie wins over the Authorization header
    if let Some(cookie) = jar.get("jwt") {
        return Some(cookie.value().to_string());
    }
    request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Authentication gate for protected routes.
///
/// Order matters: token presence, signature/expiry, account existence,
/// account standing, then password freshness against the token's issue time.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_token(&jar, &request) else {
        return Err(ApiError::unauthenticated(
            "You are not logged in, please log in to get access",
        ));
    };

    let token_data = verify_token(&token)?;

    let doc = state
        .store
        .find_by_id("users", token_data.principal_id)
        .await?;
    let Some(doc) = doc else {
        return Err(ApiError::principal_not_found(
            "The account belonging to this token no longer exists",
        ));
    };
    let principal =
        Principal::from_document(doc).map_err(crate::store::StoreError::Serialization)?;

    if !principal.active {
        return Err(ApiError::account_suspended(
            "This account has been deactivated",
        ));
    }

    // Second granularity matches the token's iat claim
    if let Some(changed_at) = principal.pass_changed_at {
        if changed_at.timestamp() > token_data.issued_at.timestamp() {
            return Err(ApiError::stale_password(
                "Password was changed after this token was issued, please log in again",
            ));
        }
    }

    request.extensions_mut().insert(CurrentUser(principal));
    Ok(next.run(request).await)
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, ApiError>> + Send>>;

/// Role gate, layered after [`require_auth`] so the extension is present.
pub fn restrict_to(
    roles: &'static [Role],
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone + Send + Sync + 'static {
    move |request: Request, next: Next| {
        Box::pin(async move {
            let user = request.extensions().get::<CurrentUser>().ok_or_else(|| {
                ApiError::unauthenticated("You are not logged in, please log in to get access")
            })?;
            if !roles.contains(&user.0.role) {
                return Err(ApiError::forbidden(
                    "You do not have permission to perform this action",
                ));
            }
            Ok(next.run(request).await)
        })
    }
}
