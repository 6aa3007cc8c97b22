//! Shared fixtures for unit and router tests

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, RwLock};

use crate::auth::tokens::TokenSigner;
use crate::auth::AuthService;
use crate::common::migrations::run_migrations;
use crate::common::{AppConfig, AppState, SharedState};
use crate::services::{MailError, MailMessage, Mailer};

/// In-memory database with the real schema. A single connection that is never
/// recycled, so every query sees the same database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    run_migrations(&pool).await.expect("migrations");
    pool
}

/// File-backed database with several connections, so concurrent writers
/// contend for the SQLite write lock as they do in production
pub async fn file_pool(path: &Path, busy_timeout: Duration) -> SqlitePool {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(busy_timeout);
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .expect("file database");
    run_migrations(&pool).await.expect("migrations");
    pool
}

/// Keeps every message instead of sending it
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    pub fn messages(&self) -> Vec<MailMessage> {
        self.sent.lock().expect("mailer lock").clone()
    }

    /// `token` query parameter of the link in the latest message
    pub fn last_token(&self) -> Option<String> {
        let message = self.messages().pop()?;
        let start = message.html.find("token=")? + "token=".len();
        let rest = &message.html[start..];
        let end = rest.find('"')?;
        Some(rest[..end].to_string())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        self.sent.lock().expect("mailer lock").push(message);
        Ok(())
    }

    fn provider(&self) -> &'static str {
        "recording"
    }
}

/// Records messages like `RecordingMailer`, but only after a delay.
/// `started` is notified as soon as a send begins.
pub struct SlowMailer {
    pub inner: RecordingMailer,
    pub started: Notify,
    delay: Duration,
}

impl SlowMailer {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: RecordingMailer::default(),
            started: Notify::new(),
            delay,
        }
    }
}

#[async_trait]
impl Mailer for SlowMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        self.started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.send(message).await
    }

    fn provider(&self) -> &'static str {
        "slow"
    }
}

/// Rejects every message
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _message: MailMessage) -> Result<(), MailError> {
        Err(MailError::RequestFailed("connection refused".to_string()))
    }

    fn provider(&self) -> &'static str {
        "failing"
    }
}

pub struct TestContext {
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

impl TestContext {
    pub async fn new() -> Self {
        let mailer = Arc::new(RecordingMailer::default());
        let state = test_state(test_pool().await, mailer.clone());
        Self { state, mailer }
    }

    pub fn service(&self) -> AuthService {
        AuthService::from_state(&self.state)
    }

    pub fn shared(&self) -> SharedState {
        Arc::new(RwLock::new(self.state.clone()))
    }

    pub fn db(&self) -> &SqlitePool {
        &self.state.db
    }
}

pub fn test_state(db: SqlitePool, mailer: Arc<dyn Mailer>) -> AppState {
    let config = Arc::new(AppConfig::for_tests());
    AppState {
        db,
        tokens: TokenSigner::from_config(&config),
        config,
        mailer,
        google_service: None,
    }
}
