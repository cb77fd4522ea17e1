//! Userbase Backend Library
//!
//! User-management backend with token-based authentication: signed
//! access/refresh token pairs, role-gated authorization middleware, and
//! SQLite-backed user storage.

pub mod api;
pub mod auth;
pub mod middleware;
pub mod models;
