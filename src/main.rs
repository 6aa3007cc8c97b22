// src/main.rs
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod auth;
mod common;
mod logging_middleware;
mod services;

#[cfg(test)]
mod test_support;

use auth::tokens::TokenSigner;
use auth::{cleanup::start_cleanup_task, AuthService};
use common::{AppConfig, AppState};
use services::{mail::mailer_from_config, GoogleService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // CONFIGURATION
    // ========================================================================

    let config = Arc::new(AppConfig::from_env()?);
    info!(
        app_env = ?config.app_env,
        app_origin = %config.app_origin,
        mail_provider = ?config.mail.provider,
        google_enabled = config.google.is_some(),
        "Configuration loaded"
    );

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    if let Some(path_part) = config.database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_options)
        .await?;

    common::migrations::run_migrations(&pool).await?;

    // ========================================================================
    // SERVICE INITIALIZATION
    // ========================================================================

    let mailer = mailer_from_config(&config.mail).await?;
    let tokens = TokenSigner::from_config(&config);

    let google_service = match &config.google {
        Some(google) => {
            info!("GoogleService initialized");
            Some(Arc::new(GoogleService::new(google.clone())))
        }
        None => {
            warn!("GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET not set, Google sign-in disabled");
            None
        }
    };

    let app_state = AppState {
        db: pool,
        config: config.clone(),
        tokens,
        mailer,
        google_service,
    };

    start_cleanup_task(
        AuthService::from_state(&app_state),
        config.cleanup_interval_secs,
    );
    info!(
        interval_secs = config.cleanup_interval_secs,
        "Expired session cleanup task started"
    );

    let shared = Arc::new(RwLock::new(app_state));
    let app = app::build_app(shared, &config.cors_origins);

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
