//! Process configuration.

use crate::auth::jwt::TokenConfig;

/// Process-wide settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub access_token_secret: String,
    pub access_token_lifespan_secs: i64,
    pub refresh_token_secret: String,
    pub refresh_token_lifespan_secs: i64,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let database_path = std::env::var("DATABASE_PATH")
            .unwrap_or_else(|_| "./userbase.db".to_string());

        let access_token_secret = std::env::var("ACCESS_TOKEN_SECRET").unwrap_or_else(|_| {
            "dev-access-secret-change-in-production-minimum-32-chars".to_string()
        });

        let access_token_lifespan_secs = std::env::var("ACCESS_TOKEN_LIFESPAN_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600);

        let refresh_token_secret = std::env::var("REFRESH_TOKEN_SECRET").unwrap_or_else(|_| {
            "dev-refresh-secret-change-in-production-minimum-32-chars".to_string()
        });

        let refresh_token_lifespan_secs = std::env::var("REFRESH_TOKEN_LIFESPAN_SECS")
            .unwrap_or_else(|_| "259200".to_string())
            .parse()
            .unwrap_or(259200);

        Self {
            port,
            database_path,
            access_token_secret,
            access_token_lifespan_secs,
            refresh_token_secret,
            refresh_token_lifespan_secs,
        }
    }

    /// The token settings handed to the auth subsystem.
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            access_secret: self.access_token_secret.clone(),
            access_lifespan_secs: self.access_token_lifespan_secs,
            refresh_secret: self.refresh_token_secret.clone(),
            refresh_lifespan_secs: self.refresh_token_lifespan_secs,
        }
    }
}
