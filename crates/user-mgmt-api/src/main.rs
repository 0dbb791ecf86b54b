//! User Management API Server
//!
//! Author: hephaex@gmail.com

use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use user_mgmt_api::{create_router, state::AppState};
use user_mgmt_core::{AppConfig, InMemoryUserStore, LoggingConfig, PgUserStore, UserStore};

fn init_tracing(logging: &LoggingConfig) {
    // RUST_LOG wins over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},user_mgmt_api={},audit=info,tower_http=debug",
            logging.level, logging.level
        ))
    });

    if logging.json_format {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    // Refuse to start without both signing secrets
    config
        .auth
        .validate()
        .context("Token signing secrets are not configured")?;

    let store: Arc<dyn UserStore> = match &config.database.postgres_url {
        Some(url) => {
            let store = PgUserStore::new(url, config.database.postgres_pool_size)
                .await
                .context("Failed to connect to PostgreSQL")?;
            info!("Using PostgreSQL identity store");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory identity store");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(auth = ?config.auth, "Authentication configured");

    let state = Arc::new(AppState::new(config, store));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("User Management API starting on http://{}", addr);
    info!("Swagger UI available at http://{}/swagger-ui/", addr);
    info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
