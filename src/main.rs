mod access;
mod api;
mod config;
mod db;
mod error;
mod ordering;
mod services;

use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::AppState;
use config::ServerConfig;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zeroblock_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("Server failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    // Initialize database
    let db_path = config.database_path();
    let db = Arc::new(db::init_database(&db_path).await?);
    tracing::info!("Database initialized at {:?}", db_path);

    let state = Arc::new(AppState::new(db, &config));

    // Ensure the bootstrap admin exists
    state
        .auth
        .ensure_admin_user(&config.admin.username, &config.admin.password)
        .await?;

    let expired = state.auth.cleanup_expired_tokens().await?;
    if expired > 0 {
        tracing::info!("Removed {} expired access tokens", expired);
    }

    let app = api::router()
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    tracing::info!("Zero-block server starting on http://{}", config.bind_addr);
    tracing::info!("Bootstrap admin: {}", config.admin.username);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
