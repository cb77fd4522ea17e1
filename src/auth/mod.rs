//! Authentication Module
//! Mission: Token-based authentication and role-gated authorization

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod user_store;

pub use jwt::{TokenConfig, TokenError};
pub use middleware::{require_auth, require_roles, AuthContext, RequiredRoles};
pub use models::{User, ADMIN_ROLE, USER_ROLE};
pub use user_store::{SqliteUserStore, UserRepository};
