//! Authentication API Endpoints
//! Mission: Provide registration, login, and token refresh

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::routes::AppState;
use crate::auth::jwt;
use crate::auth::models::{
    LoginRequest, RefreshRequest, RegisterRequest, TokenPairResponse, User,
};

/// Register a new account - POST /api/users/register
///
/// An empty password is replaced with a random one, for signups that
/// authenticate externally and never present a usable password.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenPairResponse>), AuthApiError> {
    validate_registration(&payload)?;

    let existing = state
        .store
        .find_by_email(&payload.email)
        .map_err(internal)?;
    if existing.is_some() {
        return Err(AuthApiError::EmailTaken);
    }

    let password = if payload.password.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        payload.password
    };

    let password_hash = hash(&password, DEFAULT_COST).map_err(internal)?;
    let user = User::new(&payload.email, &payload.name, password_hash);

    state.store.create(&user).map_err(internal)?;

    let pair =
        jwt::issue_token_pair(&user.id, &user.roles, &state.tokens).map_err(internal)?;

    info!("🔐 Registered user: {}", user.email);

    Ok((StatusCode::CREATED, Json(pair)))
}

/// Login - POST /api/users/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenPairResponse>, AuthApiError> {
    let user = state
        .store
        .find_by_email(&payload.email)
        .map_err(internal)?
        .ok_or(AuthApiError::InvalidCredentials)?;

    let valid = verify(&payload.password, &user.password_hash).map_err(internal)?;
    if !valid {
        warn!("❌ Failed login attempt: {}", payload.email);
        return Err(AuthApiError::InvalidCredentials);
    }

    let pair =
        jwt::issue_token_pair(&user.id, &user.roles, &state.tokens).map_err(internal)?;

    info!("🔐 Login successful: {}", user.email);

    Ok(Json(pair))
}

/// Refresh - POST /api/users/refresh
///
/// The refresh token proves identity only. Roles are re-read from storage so
/// the new pair carries the account's current privileges, not the ones
/// frozen into the old token.
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenPairResponse>, AuthApiError> {
    let claims = jwt::decode_claims(&payload.refresh_token, &state.tokens.refresh_secret)
        .map_err(|_| AuthApiError::InvalidRefreshToken)?;

    let user_id =
        jwt::extract_user_id(&claims).map_err(|_| AuthApiError::InvalidRefreshToken)?;

    let user = state
        .store
        .find_by_id(&user_id)
        .map_err(internal)?
        // Account deleted since issuance; the credential no longer names
        // anyone, reject like any other bad token.
        .ok_or(AuthApiError::InvalidRefreshToken)?;

    let pair =
        jwt::issue_token_pair(&user.id, &user.roles, &state.tokens).map_err(internal)?;

    Ok(Json(pair))
}

fn validate_registration(payload: &RegisterRequest) -> Result<(), AuthApiError> {
    if !payload.email.contains('@') {
        return Err(AuthApiError::InvalidPayload("invalid email"));
    }
    if payload.name.len() < 3 || payload.name.len() > 50 {
        return Err(AuthApiError::InvalidPayload(
            "name must be 3-50 characters",
        ));
    }
    Ok(())
}

fn internal<E: std::fmt::Display>(err: E) -> AuthApiError {
    warn!("auth endpoint failure: {}", err);
    AuthApiError::Internal
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    EmailTaken,
    InvalidCredentials,
    InvalidRefreshToken,
    InvalidPayload(&'static str),
    Internal,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::EmailTaken => (StatusCode::BAD_REQUEST, "user already exists"),
            AuthApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid email or password")
            }
            AuthApiError::InvalidRefreshToken => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AuthApiError::InvalidPayload(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthApiError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        (status, Json(json!({"error": message}))).into_response()
    }
}
