use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::auth::middleware::{require_auth, require_roles, RequiredRoles};
use crate::auth::models::ADMIN_ROLE;
use crate::auth::{api as auth_api, TokenConfig, UserRepository};
use crate::middleware::logging::request_logging;

use super::users;

/// Roles accepted by the admin route group
const ADMIN_ROLES: &[&str] = &[ADMIN_ROLE];

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserRepository>,
    pub tokens: TokenConfig,
}

/// Create the API router
///
/// Three route groups: public (registration, login, refresh, listing,
/// lookup), authenticated (current user), and admin (deletion, role
/// administration). The auth middleware is layered per group.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/users/register", post(auth_api::register))
        .route("/api/users/login", post(auth_api::login))
        .route("/api/users/refresh", post(auth_api::refresh))
        .route("/api/users", get(users::get_all))
        .route("/api/users/:id", get(users::get_by_id))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/users/current", get(users::get_current))
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            require_auth,
        ))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/api/users/:id", delete(users::delete_user))
        .route(
            "/api/users/:id/roles/:role",
            patch(users::assign_role).delete(users::remove_role),
        )
        .route_layer(middleware::from_fn_with_state(
            (state.tokens.clone(), RequiredRoles(ADMIN_ROLES)),
            require_roles,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}
