mod config;

use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use savor_api::auth::{AppStateInner, JwtIdentityResolver};
use savor_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "savor=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Database::open(&config.db_path)?;

    let mut identity = JwtIdentityResolver::new(&config.jwt_secret);
    if let Some(audience) = &config.jwt_audience {
        identity = identity.with_audience(audience);
    }
    if let Some(issuer) = &config.jwt_issuer {
        identity = identity.with_issuer(issuer);
    }

    let state = AppStateInner::new(db, identity);

    let app = savor_api::router(state, config.request_timeout)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Savor server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Savor server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
