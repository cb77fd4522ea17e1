//! Authentication Models
//! Mission: Define user accounts, role tags, and API payloads

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default role granted at registration
pub const USER_ROLE: &str = "user";
/// Role required for user administration endpoints
pub const ADMIN_ROLE: &str = "admin";

/// User account
///
/// Roles are an open vocabulary of string tags; `user` and `admin` are the
/// two the backend itself cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub roles: Vec<String>,
    pub created_at: String,
}

impl User {
    /// Create a new account with a fresh id and the default role set.
    pub fn new(email: &str, name: &str, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: name.to_string(),
            password_hash,
            roles: vec![USER_ROLE.to_string()],
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Add a role tag. Idempotent: assigning a role already present leaves
    /// the set unchanged.
    pub fn assign_role(&mut self, role: &str) {
        if !self.has_role(role) {
            self.roles.push(role.to_string());
        }
    }

    /// Remove the first matching role tag. No-op when absent.
    pub fn remove_role(&mut self, role: &str) {
        if let Some(pos) = self.roles.iter().position(|r| r == role) {
            self.roles.remove(pos);
        }
    }
}

/// Registration request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub password: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Refresh request body
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair returned by register/login/refresh
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub token: String,
    pub refresh_token: String,
}

/// User response (sanitized)
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
    pub created_at: String,
}

impl UserResponse {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            roles: user.roles.clone(),
            created_at: user.created_at.clone(),
        }
    }
}

/// Pagination query for user listing
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
}
