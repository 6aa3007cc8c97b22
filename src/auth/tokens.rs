//! Access and refresh JWTs
//!
//! Access tokens carry the user and session ids and live for minutes.
//! Refresh tokens carry only the session id and expire with the session row
//! they are bound to. The two kinds are signed with different secrets, and
//! both are issued for the `user` audience.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::common::AppConfig;

pub const TOKEN_AUDIENCE: &str = "user";

#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Access token claims
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AccessClaims {
    /// User id
    pub sub: String,
    /// Session id
    pub sid: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Refresh token claims
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RefreshClaims {
    pub sid: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Tokens handed back to the client; `refresh_token` is `None` when a
/// refresh did not rotate it.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Clone)]
pub struct TokenSigner {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
}

impl TokenSigner {
    pub fn new(access_secret: &str, refresh_secret: &str, access_ttl: Duration) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.jwt_access_secret,
            &config.jwt_refresh_secret,
            config.tokens.access_token_ttl,
        )
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    pub fn sign_access(&self, user_id: &str, session_id: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            sid: session_id.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        sign(&claims, &self.access_encoding)
    }

    /// `expires_at_millis` is the session's expiry
    pub fn sign_refresh(&self, session_id: &str, expires_at_millis: i64) -> Result<String, TokenError> {
        let claims = RefreshClaims {
            sid: session_id.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            iat: Utc::now().timestamp(),
            exp: expires_at_millis / 1000,
        };
        sign(&claims, &self.refresh_encoding)
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        verify(token, &self.access_decoding)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        verify(token, &self.refresh_decoding)
    }
}

fn sign<T: Serialize>(claims: &T, key: &EncodingKey) -> Result<String, TokenError> {
    encode(&Header::new(Algorithm::HS256), claims, key)
        .map_err(|e| TokenError::Encoding(e.to_string()))
}

fn verify<T: DeserializeOwned>(token: &str, key: &DecodingKey) -> Result<T, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[TOKEN_AUDIENCE]);

    decode::<T>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })
}
