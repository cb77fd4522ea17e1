//! Authorization Middleware
//! Mission: Gate protected routes behind access-token validation

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

use crate::auth::jwt::{self, TokenConfig};

/// Identity and roles extracted from a validated access token, published
/// into request extensions for downstream handlers. Lives only for the
/// duration of the request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub roles: Vec<String>,
}

/// Required-role set for a route group. Any one matching role authorizes.
#[derive(Debug, Clone, Copy)]
pub struct RequiredRoles(pub &'static [&'static str]);

/// Uniform rejection for every auth failure.
///
/// The client never learns whether the token was missing, malformed,
/// expired, forged, or short on roles.
#[derive(Debug)]
pub struct Unauthorized;

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"}))).into_response()
    }
}

/// Middleware requiring a valid access token.
///
/// On success the request continues with an `AuthContext` carrying the
/// caller's identity.
pub async fn require_auth(
    State(tokens): State<TokenConfig>,
    mut req: Request,
    next: Next,
) -> Result<Response, Unauthorized> {
    let token = candidate_token(&req);

    let claims = jwt::decode_claims(&token, &tokens.access_secret).map_err(|err| {
        debug!(path = %req.uri().path(), %err, "rejected request token");
        Unauthorized
    })?;

    let user_id = jwt::extract_user_id(&claims).map_err(|err| {
        debug!(path = %req.uri().path(), %err, "rejected request claims");
        Unauthorized
    })?;

    req.extensions_mut().insert(AuthContext {
        user_id,
        roles: Vec::new(),
    });

    Ok(next.run(req).await)
}

/// Middleware requiring a valid access token granting at least one of the
/// route's required roles.
pub async fn require_roles(
    State((tokens, required)): State<(TokenConfig, RequiredRoles)>,
    mut req: Request,
    next: Next,
) -> Result<Response, Unauthorized> {
    let token = candidate_token(&req);

    let claims = jwt::decode_claims(&token, &tokens.access_secret).map_err(|err| {
        debug!(path = %req.uri().path(), %err, "rejected request token");
        Unauthorized
    })?;

    let (user_id, roles) = jwt::extract_user_id_and_roles(&claims).map_err(|err| {
        debug!(path = %req.uri().path(), %err, "rejected request claims");
        Unauthorized
    })?;

    if !roles.iter().any(|r| required.0.contains(&r.as_str())) {
        debug!(
            path = %req.uri().path(),
            user_id = %user_id,
            required = ?required.0,
            "rejected request: missing required role"
        );
        return Err(Unauthorized);
    }

    req.extensions_mut().insert(AuthContext { user_id, roles });

    Ok(next.run(req).await)
}

/// Pull the candidate token string out of a request.
///
/// A `token` query parameter wins; otherwise the `Authorization` header in
/// the exact two-part form `Bearer <token>`. Any other shape yields an empty
/// candidate, which then fails validation like any forged token.
fn candidate_token(req: &Request) -> String {
    if let Some(query) = req.uri().query() {
        let from_query = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("token="))
            .filter(|t| !t.is_empty());
        if let Some(token) = from_query {
            return token.to_string();
        }
    }

    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => token.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;

    fn request(uri: &str, auth_header: Option<&str>) -> Request {
        let mut builder = HttpRequest::builder().uri(uri);
        if let Some(value) = auth_header {
            builder = builder.header("Authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_query_parameter_preferred_over_header() {
        let req = request("/api/users/current?token=from-query", Some("Bearer from-header"));
        assert_eq!(candidate_token(&req), "from-query");
    }

    #[test]
    fn test_bearer_header_extracted() {
        let req = request("/api/users/current", Some("Bearer abc.def.ghi"));
        assert_eq!(candidate_token(&req), "abc.def.ghi");
    }

    #[test]
    fn test_malformed_headers_yield_empty_candidate() {
        // Missing prefix
        let req = request("/x", Some("abc.def.ghi"));
        assert_eq!(candidate_token(&req), "");

        // Wrong prefix
        let req = request("/x", Some("Token abc.def.ghi"));
        assert_eq!(candidate_token(&req), "");

        // Too many parts
        let req = request("/x", Some("Bearer abc def"));
        assert_eq!(candidate_token(&req), "");

        // No header at all
        let req = request("/x", None);
        assert_eq!(candidate_token(&req), "");
    }

    #[test]
    fn test_token_from_query_among_other_params() {
        let req = request("/ws?limit=5&token=tok123&page=2", None);
        assert_eq!(candidate_token(&req), "tok123");
    }

    #[test]
    fn test_unauthorized_response_shape() {
        let response = Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
