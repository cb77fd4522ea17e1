//! User API Endpoints
//! Mission: Profile lookup, listing, deletion, and role administration

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use tracing::info;

use crate::api::routes::AppState;
use crate::auth::middleware::AuthContext;
use crate::auth::models::{PageQuery, UserResponse};

/// List users - GET /api/users
///
/// Paged; the store clamps size to [1, 100] and defaults page to 1.
pub async fn get_all(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<UserResponse>>, UserApiError> {
    let users = state.store.find_all(&query).map_err(internal)?;

    Ok(Json(users.iter().map(UserResponse::from_user).collect()))
}

/// Get user by id - GET /api/users/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, UserApiError> {
    let user = state
        .store
        .find_by_id(&id)
        .map_err(internal)?
        .ok_or(UserApiError::NotFound)?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Get the authenticated user - GET /api/users/current
pub async fn get_current(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<UserResponse>, UserApiError> {
    let user = state
        .store
        .find_by_id(&ctx.user_id)
        .map_err(internal)?
        .ok_or(UserApiError::NotFound)?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Delete user - DELETE /api/users/:id (admin)
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, UserApiError> {
    let deleted = state.store.delete(&id).map_err(internal)?;
    if !deleted {
        return Err(UserApiError::NotFound);
    }

    Ok(StatusCode::OK)
}

/// Assign a role - PATCH /api/users/:id/roles/:role (admin)
pub async fn assign_role(
    State(state): State<AppState>,
    Path((id, role)): Path<(String, String)>,
) -> Result<StatusCode, UserApiError> {
    let mut user = state
        .store
        .find_by_id(&id)
        .map_err(internal)?
        .ok_or(UserApiError::NotFound)?;

    user.assign_role(&role);
    state.store.update(&user).map_err(internal)?;

    info!("Assigned role {} to user {}", role, id);
    Ok(StatusCode::OK)
}

/// Remove a role - DELETE /api/users/:id/roles/:role (admin)
pub async fn remove_role(
    State(state): State<AppState>,
    Path((id, role)): Path<(String, String)>,
) -> Result<StatusCode, UserApiError> {
    let mut user = state
        .store
        .find_by_id(&id)
        .map_err(internal)?
        .ok_or(UserApiError::NotFound)?;

    user.remove_role(&role);
    state.store.update(&user).map_err(internal)?;

    info!("Removed role {} from user {}", role, id);
    Ok(StatusCode::OK)
}

fn internal(err: anyhow::Error) -> UserApiError {
    tracing::error!("user store error: {}", err);
    UserApiError::Internal
}

/// User API errors
#[derive(Debug)]
pub enum UserApiError {
    NotFound,
    Internal,
}

impl IntoResponse for UserApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            UserApiError::NotFound => (StatusCode::NOT_FOUND, "user not found"),
            UserApiError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        (status, Json(json!({"error": message}))).into_response()
    }
}
