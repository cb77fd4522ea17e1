//! JWT Token Handler
//! Mission: Issue and validate signed access/refresh token pairs

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::models::TokenPairResponse;

/// Claim set as it comes off the wire: an untyped mapping. Validated by the
/// codec, then immediately converted to typed values by the extractors.
pub type ClaimSet = serde_json::Map<String, serde_json::Value>;

/// Token errors
#[derive(Debug)]
pub enum TokenError {
    /// The signing primitive rejected the secret or claims
    Signing(jsonwebtoken::errors::Error),
    /// Malformed encoding, signature mismatch, wrong algorithm, or expired
    InvalidToken,
    /// Claims verified but structurally invalid (user_id/roles shape)
    MalformedClaims,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Signing(err) => write!(f, "token signing failed: {}", err),
            TokenError::InvalidToken => write!(f, "invalid or expired token"),
            TokenError::MalformedClaims => write!(f, "malformed token claims"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Process-wide token settings, loaded once at startup and passed explicitly
/// into every issue/validate call.
///
/// Access and refresh tokens use distinct secrets, so a leaked access-token
/// secret cannot mint refresh tokens and vice versa.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub access_lifespan_secs: i64,
    pub refresh_secret: String,
    pub refresh_lifespan_secs: i64,
}

/// Access token payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub authorized: bool,
    pub user_id: String,
    pub roles: Vec<String>,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id; two tokens issued within the same second still differ
    pub jti: String,
}

impl AccessClaims {
    pub fn new(user_id: &str, roles: &[String], lifespan: Duration) -> Self {
        let now = Utc::now();
        Self {
            authorized: true,
            user_id: user_id.to_string(),
            roles: roles.to_vec(),
            iat: now.timestamp(),
            exp: (now + lifespan).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// Refresh token payload
///
/// Carries identity only. Roles are deliberately absent: the refresh flow
/// re-reads them from storage, so a role revoked after issuance does not
/// survive a refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub authorized: bool,
    pub user_id: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_class: String,
}

impl RefreshClaims {
    pub fn new(user_id: &str, lifespan: Duration) -> Self {
        let now = Utc::now();
        Self {
            authorized: true,
            user_id: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + lifespan).timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_class: "refresh".to_string(),
        }
    }
}

/// Sign a claim set into a token string (HS256).
pub fn encode_claims<T: Serialize>(claims: &T, secret: &str) -> Result<String, TokenError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(TokenError::Signing)
}

/// Verify a token string and return its claim set.
///
/// Accepts only the symmetric HMAC family (HS256/384/512) so that a token
/// claiming `none`, RSA, or any other algorithm is rejected before a single
/// claim is trusted. Expiry is checked with zero leeway.
pub fn decode_claims(token: &str, secret: &str) -> Result<ClaimSet, TokenError> {
    let mut validation = Validation::default();
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.leeway = 0;

    decode::<ClaimSet>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| TokenError::InvalidToken)
}

/// Issue an access token for a user identity and role set.
pub fn issue_access_token(
    user_id: &str,
    roles: &[String],
    lifespan: Duration,
    secret: &str,
) -> Result<String, TokenError> {
    let claims = AccessClaims::new(user_id, roles, lifespan);
    encode_claims(&claims, secret)
}

/// Issue an access/refresh token pair.
///
/// The refresh token uses the independently configured (longer) lifespan and
/// the refresh secret.
pub fn issue_token_pair(
    user_id: &str,
    roles: &[String],
    cfg: &TokenConfig,
) -> Result<TokenPairResponse, TokenError> {
    let token = issue_access_token(
        user_id,
        roles,
        Duration::seconds(cfg.access_lifespan_secs),
        &cfg.access_secret,
    )?;

    let refresh_claims =
        RefreshClaims::new(user_id, Duration::seconds(cfg.refresh_lifespan_secs));
    let refresh_token = encode_claims(&refresh_claims, &cfg.refresh_secret)?;

    Ok(TokenPairResponse {
        token,
        refresh_token,
    })
}

/// Extract the user identity from a validated claim set.
///
/// Shape check only: `user_id` must be present and a string. Signature and
/// expiry were already verified by `decode_claims`.
pub fn extract_user_id(claims: &ClaimSet) -> Result<String, TokenError> {
    claims
        .get("user_id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or(TokenError::MalformedClaims)
}

/// Extract identity and role list from a validated claim set.
///
/// `roles` must be a sequence; elements are coerced to their string
/// representation since the wire encoding yields generic values.
pub fn extract_user_id_and_roles(
    claims: &ClaimSet,
) -> Result<(String, Vec<String>), TokenError> {
    let user_id = extract_user_id(claims)?;

    let roles = claims
        .get("roles")
        .and_then(|v| v.as_array())
        .ok_or(TokenError::MalformedClaims)?
        .iter()
        .map(|v| match v.as_str() {
            Some(s) => s.to_string(),
            None => v.to_string(),
        })
        .collect();

    Ok((user_id, roles))
}
