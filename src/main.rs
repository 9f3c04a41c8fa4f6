mod allowlist;
mod bot;
mod config;
mod intent;
mod platform;
mod reply;
mod server;
mod webhook;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::AppState;
use crate::config::Config;
use crate::platform::telegram::TelegramPlatform;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pastor_jeff_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Optional TOML file; the environment overrides it
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    if let Some(path) = &config_path {
        info!("Loading configuration from: {}", path.display());
    }
    let config = Config::load(config_path.as_deref())?;

    info!("Configuration loaded successfully");
    info!("  Public URL: {}", config.public_url);
    info!("  Web app: {}", config.webapp_url);
    info!("  Allowed chats: {:?}", config.allowed_chats);
    info!(
        "  Webhook secret: {}",
        if config.webhook_secret.is_some() { "set" } else { "not set" }
    );

    let platform = Arc::new(TelegramPlatform::new(&config.bot_token));
    let state = Arc::new(AppState::new(&config, platform));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Web service listening on :{}", config.port);

    // Reconcile alongside serving; a failure here must not take the server down
    let startup_state = state.clone();
    let public_url = config.public_url.clone();
    tokio::spawn(async move {
        webhook::run_startup(&startup_state, &public_url).await;
    });

    if let Err(e) = axum::serve(listener, server::router(state)).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
