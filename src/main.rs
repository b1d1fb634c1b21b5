use anyhow::Context;
use tracing_subscriber::EnvFilter;

use textile_dashboard::{app, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up IDENTITY_URL, DATABASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!("Starting textile dashboard in {:?} mode", config.environment);
    if textile_dashboard::is_production!(config) && !config.cookies.secure {
        tracing::warn!("Credential cookies are not marked Secure in production");
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::from_config(config)?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Textile dashboard listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
