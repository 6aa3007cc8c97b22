//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// `accounts.provider_id` for email + password sign-in
pub const CREDENTIAL_PROVIDER: &str = "credential";
/// `accounts.provider_id` for Google sign-in
pub const GOOGLE_PROVIDER: &str = "google";

/// User database model
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub email_verified: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Sign-in method attached to a user
#[derive(FromRow, Serialize, Debug, Clone)]
pub struct Account {
    pub id: String,
    pub user_id: String,
    pub provider_id: String,
    pub account_id: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// A logged-in device or browser
#[derive(FromRow, Serialize, Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub user_agent: Option<String>,
    /// Unix milliseconds
    pub expires_at: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Single-use token mailed to the user
#[derive(FromRow, Debug, Clone)]
pub struct Verification {
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub value: String,
    pub expires_at: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationKind {
    EmailVerification,
    PasswordReset,
}

impl VerificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationKind::EmailVerification => "email_verification",
            VerificationKind::PasswordReset => "password_reset",
        }
    }
}

// ---- Requests ----

#[derive(Deserialize, Debug)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// `?token=` on verification and reset links
#[derive(Deserialize, Debug)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

// ---- Responses ----

#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

/// Body of every endpoint that issues tokens
#[derive(Serialize, Debug)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub access_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Serialize, Debug, Clone)]
pub struct SessionInfo {
    pub id: String,
    pub user_agent: Option<String>,
    pub created_at: Option<String>,
    /// RFC 3339
    pub expires_at: String,
    pub current: bool,
}

#[derive(Serialize, Debug)]
pub struct SessionListResponse {
    pub success: bool,
    pub sessions: Vec<SessionInfo>,
}
