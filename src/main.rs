//! Userbase - User-Management Backend
//! Mission: Registration, login, and role-gated user administration behind
//! signed access/refresh token pairs

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenv::dotenv;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use userbase_backend::api::{create_router, AppState};
use userbase_backend::auth::SqliteUserStore;
use userbase_backend::models::Config;

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let cfg = Config::from_env();

    let store = Arc::new(
        SqliteUserStore::new(&cfg.database_path).context("Failed to initialize user store")?,
    );

    let state = AppState {
        store,
        tokens: cfg.token_config(),
    };

    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", cfg.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server exited properly");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down server...");
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "userbase_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try the manifest directory (common when running with
    // --manifest-path from elsewhere)
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let candidate = manifest_dir.join(".env");
    if candidate.exists() {
        let _ = dotenv::from_path(&candidate);
    }
}
