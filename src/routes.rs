use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::protected::{account, reviews, tours, users};
use crate::handlers::public;
use crate::middleware::{require_auth, restrict_to, ApiResponse};
use crate::models::Role;
use crate::state::AppState;

async fn health() -> ApiResponse {
    ApiResponse::ok().data(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "healthy",
    }))
}

fn user_routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/api/users/register", post(public::auth::session::register))
        .route("/api/users/login", post(public::auth::session::login))
        .route("/api/users/logout", post(public::auth::session::logout))
        .route(
            "/api/users/forgot-password",
            post(public::auth::password::forgot_password),
        )
        .route(
            "/api/users/reset-password/:token",
            patch(public::auth::password::reset_password),
        );

    let protected = Router::new()
        .route("/api/users", get(users::list_users))
        .route(
            "/api/users/update-password",
            patch(account::update_password),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    public.merge(protected)
}

fn tour_routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/api/tours", get(public::tours::list_tours))
        .route("/api/tours/top-tours", get(public::tours::top_tours));

    let authed = Router::new()
        .route("/api/tours/:id", get(tours::get_tour))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    // restrict_to runs after require_auth has inserted the extension
    let admin = Router::new()
        .route("/api/tours", post(tours::create_tour))
        .route_layer(from_fn(restrict_to(&[Role::Admin])))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    public.merge(authed).merge(admin)
}

fn review_routes(state: &AppState) -> Router<AppState> {
    let public = Router::new().route("/api/reviews", get(public::reviews::list_reviews));

    let authed = Router::new()
        .route("/api/reviews", post(reviews::create_review))
        .route("/api/reviews/:id", patch(reviews::update_review))
        .route("/api/reviews/:id", delete(reviews::delete_review))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    public.merge(authed)
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .merge(user_routes(&state))
        .merge(tour_routes(&state))
        .merge(review_routes(&state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
