mod config;
mod dashboard;
mod db;
mod errors;
mod lead_history;
mod models;
mod routes;
mod session;
mod state;
mod store;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::dashboard::pipeline::Collaborators;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::session::auth_client::HttpSessionProvider;
use crate::state::AppState;
use crate::store::{PgUserDirectory, PgValuationSource};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting valuation dashboard API v{}",
        env!("CARGO_PKG_VERSION")
    );

    // User directory and valuation store share one pool
    let db = create_pool(&config.database_url, config.database_max_connections).await?;

    // Auth service client
    let sessions = HttpSessionProvider::new(
        config.auth_service_url.clone(),
        config.http_client_timeout,
    )
    .context("Failed to build auth service client")?;
    info!(
        "Session provider: {} (timeout {}ms)",
        config.auth_service_url,
        config.session_timeout.as_millis()
    );

    let collaborators = Collaborators {
        sessions: Arc::new(sessions),
        users: Arc::new(PgUserDirectory::new(db.clone())),
        valuations: Arc::new(PgValuationSource::new(db)),
        session_timeout: config.session_timeout,
    };

    let state = AppState::new(config.clone(), collaborators);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        // TODO: restrict CORS to the dashboard origin once it is configurable
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
