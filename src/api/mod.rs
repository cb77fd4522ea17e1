//! HTTP API: router assembly and user endpoints.

pub mod routes;
pub mod users;

pub use routes::{create_router, AppState};
