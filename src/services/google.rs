// src/services/google.rs
use crate::common::config::GoogleConfig;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

const AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Scopes for sign-in only
const SIGN_IN_SCOPES: [&str; 3] = ["openid", "email", "profile"];

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Google account has no accessible email")]
    MissingEmail,
}

/// Only the access token is needed to read the profile
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Raw userinfo payload
#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
}

/// The parts of a Google account used for sign-in
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleProfile {
    pub subject: String,
    pub email: String,
    pub email_verified: bool,
    pub name: Option<String>,
}

fn profile_from_userinfo(info: UserInfo) -> Result<GoogleProfile, GoogleError> {
    let email = info
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or(GoogleError::MissingEmail)?;

    Ok(GoogleProfile {
        subject: info.sub,
        email,
        email_verified: info.email_verified.unwrap_or(false),
        name: info.name,
    })
}

#[derive(Debug, Clone)]
pub struct GoogleService {
    config: GoogleConfig,
    client: Client,
}

impl GoogleService {
    pub fn new(config: GoogleConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    /// Consent page URL; `state` is echoed back to the callback
    pub fn get_authorization_url(&self, state: &str) -> String {
        let scope_param = SIGN_IN_SCOPES.join(" ");

        let auth_url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            AUTHORIZATION_ENDPOINT,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&scope_param),
            urlencoding::encode(state)
        );

        debug!("Generated Google OAuth authorization URL with scopes: {}", scope_param);
        auth_url
    }

    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, GoogleError> {
        let params = [
            ("code", code),
            ("client_id", &self.config.client_id),
            ("client_secret", &self.config.client_secret),
            ("redirect_uri", &self.config.redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        debug!("Exchanging authorization code for tokens");

        let response = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&params)
            .send()
            .await
            .map_err(|e| GoogleError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Token exchange failed");
            return Err(GoogleError::OAuthFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| GoogleError::SerializationError(e.to_string()))
    }

    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, GoogleError> {
        let response = self
            .client
            .get(USERINFO_ENDPOINT)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| GoogleError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "Google userinfo request failed");
            return Err(GoogleError::OAuthFailed(format!("userinfo HTTP {}", status)));
        }

        let info = response
            .json::<UserInfo>()
            .await
            .map_err(|e| GoogleError::SerializationError(e.to_string()))?;

        profile_from_userinfo(info)
    }

    /// Code exchange followed by the userinfo lookup
    pub async fn profile_from_code(&self, code: &str) -> Result<GoogleProfile, GoogleError> {
        let tokens = self.exchange_code(code).await?;
        self.fetch_profile(&tokens.access_token).await
    }
}
