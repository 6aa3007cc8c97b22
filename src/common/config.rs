// src/common/config.rs
//! Environment configuration
//!
//! Every setting comes from an environment variable (optionally loaded from
//! `.env` by `dotenv`). Only the two JWT secrets are mandatory.

use chrono::Duration;
use std::env;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Environment variable {0} not set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Test,
    Production,
}

impl AppEnv {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Some(AppEnv::Development),
            "test" => Some(AppEnv::Test),
            "production" | "prod" => Some(AppEnv::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailProvider {
    /// Log messages instead of delivering them
    Log,
    Ses,
    Resend,
}

/// Lifetimes and thresholds of the session/token lifecycle
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    pub access_token_ttl: Duration,
    /// Session lifetime, also the refresh token lifetime
    pub session_ttl: Duration,
    /// Sessions expiring sooner than this are extended on refresh
    pub refresh_rotation_threshold: Duration,
    pub email_verification_ttl: Duration,
    pub password_reset_ttl: Duration,
    pub password_reset_window: Duration,
    /// Reset records allowed inside `password_reset_window`
    pub password_reset_max_requests: i64,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            access_token_ttl: Duration::minutes(15),
            session_ttl: Duration::days(14),
            refresh_rotation_threshold: Duration::days(1),
            email_verification_ttl: Duration::days(1),
            password_reset_ttl: Duration::minutes(15),
            password_reset_window: Duration::minutes(10),
            password_reset_max_requests: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub provider: MailProvider,
    pub from: String,
    pub resend_api_key: Option<String>,
    pub ses_region: String,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app_env: AppEnv,
    pub port: u16,
    pub database_url: String,
    /// Frontend origin used in mailed links, redirects and CORS
    pub app_origin: String,
    pub cors_origins: Vec<String>,
    pub jwt_access_secret: String,
    pub jwt_refresh_secret: String,
    pub tokens: TokenPolicy,
    pub mail: MailConfig,
    pub google: Option<GoogleConfig>,
    pub cleanup_interval_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let app_env = match get("APP_ENV") {
            Some(value) => AppEnv::parse(&value).ok_or(ConfigError::Invalid {
                key: "APP_ENV",
                value,
            })?,
            None => AppEnv::Development,
        };

        let port = match get("PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value })?,
            None => 8080,
        };

        let app_origin = get("APP_ORIGIN")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let cors_origins = get("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec![app_origin.clone()]);

        let provider = match get("MAIL_PROVIDER").map(|v| v.to_lowercase()) {
            None => MailProvider::Log,
            Some(p) if p == "log" => MailProvider::Log,
            Some(p) if p == "ses" => MailProvider::Ses,
            Some(p) if p == "resend" => MailProvider::Resend,
            Some(value) => {
                return Err(ConfigError::Invalid {
                    key: "MAIL_PROVIDER",
                    value,
                })
            }
        };

        let resend_api_key = get("RESEND_API_KEY");
        if provider == MailProvider::Resend && resend_api_key.is_none() {
            return Err(ConfigError::Missing("RESEND_API_KEY"));
        }

        let mail = MailConfig {
            provider,
            from: get("EMAIL_FROM").unwrap_or_else(|| "no-reply@localhost".to_string()),
            resend_api_key,
            ses_region: get("AWS_SES_REGION").unwrap_or_else(|| "us-east-1".to_string()),
        };

        let google = match (get("GOOGLE_CLIENT_ID"), get("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(GoogleConfig {
                client_id,
                client_secret,
                redirect_uri: get("GOOGLE_OAUTH_REDIRECT_URI").unwrap_or_else(|| {
                    format!("http://localhost:{}/auth/google/callback", port)
                }),
            }),
            _ => None,
        };

        let cleanup_interval_secs = match get("SESSION_CLEANUP_INTERVAL_SECS") {
            Some(value) => value.parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: "SESSION_CLEANUP_INTERVAL_SECS",
                value,
            })?,
            None => 3600,
        };

        Ok(Self {
            app_env,
            port,
            database_url: get("DATABASE_URL").unwrap_or_else(|| "sqlite://auth.db".to_string()),
            app_origin,
            cors_origins,
            jwt_access_secret: require("JWT_ACCESS_SECRET")?,
            jwt_refresh_secret: require("JWT_REFRESH_SECRET")?,
            tokens: TokenPolicy::default(),
            mail,
            google,
            cleanup_interval_secs,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env == AppEnv::Production
    }

    /// Configuration used by unit tests
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::from_source(|key| match key {
            "APP_ENV" => Some("test".to_string()),
            "JWT_ACCESS_SECRET" => Some("test-access-secret".to_string()),
            "JWT_REFRESH_SECRET" => Some("test-refresh-secret".to_string()),
            _ => None,
        })
        .expect("test configuration is complete")
    }
}
