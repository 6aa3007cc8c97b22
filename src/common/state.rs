// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::tokens::TokenSigner;
use crate::common::config::AppConfig;
use crate::services::{GoogleService, Mailer};

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub tokens: TokenSigner,
    pub mailer: Arc<dyn Mailer>,
    pub google_service: Option<Arc<GoogleService>>,
}

/// State as handed to handlers through `Extension`
pub type SharedState = Arc<RwLock<AppState>>;
