//! End-to-end auth flow tests driven through the full router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::ServiceExt;

use userbase_backend::api::{create_router, AppState};
use userbase_backend::auth::jwt::{self, TokenConfig};
use userbase_backend::auth::models::{User, ADMIN_ROLE};
use userbase_backend::auth::{SqliteUserStore, UserRepository};

fn test_tokens() -> TokenConfig {
    TokenConfig {
        access_secret: "integration-access-secret".to_string(),
        access_lifespan_secs: 3600,
        refresh_secret: "integration-refresh-secret".to_string(),
        refresh_lifespan_secs: 7200,
    }
}

/// Router plus a handle on the store. The temp file must outlive the app.
fn test_app() -> (Router, Arc<SqliteUserStore>, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let store = Arc::new(SqliteUserStore::new(temp_file.path().to_str().unwrap()).unwrap());

    let state = AppState {
        store: store.clone(),
        tokens: test_tokens(),
    };

    (create_router(state), store, temp_file)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn register(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        json_request(
            Method::POST,
            "/api/users/register",
            json!({"email": email, "name": "Test User", "password": password}),
        ),
    )
    .await
}

#[tokio::test]
async fn test_register_returns_token_pair() {
    let (app, _store, _tmp) = test_app();

    let (status, body) = register(&app, "alice@example.com", "password123").await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].as_str().is_some());
    assert!(body["refresh_token"].as_str().is_some());
}

#[tokio::test]
async fn test_register_duplicate_email_rejected() {
    let (app, _store, _tmp) = test_app();

    register(&app, "alice@example.com", "password123").await;
    let (status, body) = register(&app, "alice@example.com", "password123").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "user already exists");
}

// Scenario A: a fresh registration gets the default `user` role, so an
// admin-gated route rejects its access token.
#[tokio::test]
async fn test_fresh_user_rejected_from_admin_route() {
    let (app, store, _tmp) = test_app();

    let (_, body) = register(&app, "alice@example.com", "password123").await;
    let token = body["token"].as_str().unwrap();

    let victim = User::new("bob@example.com", "Bob", "x".to_string());
    store.create(&victim).unwrap();

    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/users/{}", victim.id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "unauthorized"}));
}

// Scenario B: login, refresh, and authenticate with the new access token as
// the same identity.
#[tokio::test]
async fn test_login_then_refresh_preserves_identity() {
    let (app, _store, _tmp) = test_app();

    register(&app, "alice@example.com", "password123").await;

    let (status, login_body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/users/login",
            json!({"email": "alice@example.com", "password": "password123"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let old_access = login_body["token"].as_str().unwrap();
    let refresh_token = login_body["refresh_token"].as_str().unwrap();

    let (status, refresh_body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/users/refresh",
            json!({"refresh_token": refresh_token}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let new_access = refresh_body["token"].as_str().unwrap();
    assert_ne!(new_access, old_access);

    // Both tokens name the same account.
    let (_, old_me) = send(&app, get_with_bearer("/api/users/current", old_access)).await;
    let (status, new_me) = send(&app, get_with_bearer("/api/users/current", new_access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(old_me["id"], new_me["id"]);
    assert_eq!(new_me["email"], "alice@example.com");
}

#[tokio::test]
async fn test_refresh_with_access_token_rejected() {
    let (app, _store, _tmp) = test_app();

    let (_, body) = register(&app, "alice@example.com", "password123").await;
    let access = body["token"].as_str().unwrap();

    // Wrong token class: signed with the access secret.
    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/users/refresh",
            json!({"refresh_token": access}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_for_deleted_account_rejected() {
    let (app, store, _tmp) = test_app();

    let (_, body) = register(&app, "alice@example.com", "password123").await;
    let refresh_token = body["refresh_token"].as_str().unwrap();

    let alice = store.find_by_email("alice@example.com").unwrap().unwrap();
    store.delete(&alice.id).unwrap();

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/users/refresh",
            json!({"refresh_token": refresh_token}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// Refresh re-reads roles from storage: a role granted after login must show
// up in the refreshed access token.
#[tokio::test]
async fn test_refresh_picks_up_current_roles() {
    let (app, store, _tmp) = test_app();

    let (_, body) = register(&app, "alice@example.com", "password123").await;
    let refresh_token = body["refresh_token"].as_str().unwrap();

    let mut alice = store.find_by_email("alice@example.com").unwrap().unwrap();
    alice.assign_role(ADMIN_ROLE);
    store.update(&alice).unwrap();

    let (_, refreshed) = send(
        &app,
        json_request(
            Method::POST,
            "/api/users/refresh",
            json!({"refresh_token": refresh_token}),
        ),
    )
    .await;

    let tokens = test_tokens();
    let claims =
        jwt::decode_claims(refreshed["token"].as_str().unwrap(), &tokens.access_secret).unwrap();
    let (_, roles) = jwt::extract_user_id_and_roles(&claims).unwrap();
    assert!(roles.contains(&ADMIN_ROLE.to_string()));
}

// Scenario C: malformed Authorization headers are rejected with a body
// identical to the one for a fully invalid token.
#[tokio::test]
async fn test_malformed_authorization_header_uniform_rejection() {
    let (app, _store, _tmp) = test_app();

    let invalid_token = Request::builder()
        .uri("/api/users/current")
        .header(header::AUTHORIZATION, "Bearer not.a.token")
        .body(Body::empty())
        .unwrap();
    let (status, reference_body) = send(&app, invalid_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for header_value in ["not.a.token", "Token abc", "Bearer a b", "Bearer"] {
        let request = Request::builder()
            .uri("/api/users/current")
            .header(header::AUTHORIZATION, header_value)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {:?}", header_value);
        assert_eq!(body, reference_body, "header {:?}", header_value);
    }

    let no_header = Request::builder()
        .uri("/api/users/current")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, no_header).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, reference_body);
}

#[tokio::test]
async fn test_admin_can_manage_roles_and_delete() {
    let (app, store, _tmp) = test_app();

    // Admin seeded directly in storage; tokens minted with the same secret
    // the router validates against.
    let mut admin = User::new("root@example.com", "Root", "x".to_string());
    admin.assign_role(ADMIN_ROLE);
    store.create(&admin).unwrap();

    let tokens = test_tokens();
    let admin_token = jwt::issue_access_token(
        &admin.id,
        &admin.roles,
        chrono::Duration::seconds(tokens.access_lifespan_secs),
        &tokens.access_secret,
    )
    .unwrap();

    register(&app, "alice@example.com", "password123").await;
    let alice = store.find_by_email("alice@example.com").unwrap().unwrap();

    // Grant a role
    let request = Request::builder()
        .method(Method::PATCH)
        .uri(format!("/api/users/{}/roles/moderator", alice.id))
        .header(header::AUTHORIZATION, format!("Bearer {}", admin_token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let reloaded = store.find_by_id(&alice.id).unwrap().unwrap();
    assert!(reloaded.has_role("moderator"));

    // Revoke it again
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/users/{}/roles/moderator", alice.id))
        .header(header::AUTHORIZATION, format!("Bearer {}", admin_token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let reloaded = store.find_by_id(&alice.id).unwrap().unwrap();
    assert!(!reloaded.has_role("moderator"));

    // Delete the account
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/users/{}", alice.id))
        .header(header::AUTHORIZATION, format!("Bearer {}", admin_token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    assert!(store.find_by_id(&alice.id).unwrap().is_none());
}

#[tokio::test]
async fn test_token_accepted_from_query_parameter() {
    let (app, _store, _tmp) = test_app();

    let (_, body) = register(&app, "alice@example.com", "password123").await;
    let token = body["token"].as_str().unwrap();

    let request = Request::builder()
        .uri(format!("/api/users/current?token={}", token))
        .body(Body::empty())
        .unwrap();
    let (status, me) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "alice@example.com");
}

#[tokio::test]
async fn test_public_listing_and_lookup() {
    let (app, store, _tmp) = test_app();

    register(&app, "alice@example.com", "password123").await;
    register(&app, "bob@example.com", "password123").await;

    let request = Request::builder()
        .uri("/api/users?page=1&size=1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    // Sanitized view: no password material in the listing.
    assert!(body[0].get("password_hash").is_none());

    let alice = store.find_by_email("alice@example.com").unwrap().unwrap();
    let request = Request::builder()
        .uri(format!("/api/users/{}", alice.id))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");

    let request = Request::builder()
        .uri("/api/users/no-such-id")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_with_wrong_password_rejected() {
    let (app, _store, _tmp) = test_app();

    register(&app, "alice@example.com", "password123").await;

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/users/login",
            json!({"email": "alice@example.com", "password": "wrong-password"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_check_is_public() {
    let (app, _store, _tmp) = test_app();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
