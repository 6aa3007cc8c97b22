//! Session and token lifecycle
//!
//! `AuthService` owns every flow that creates, rotates or destroys a session.
//! Handlers stay thin: they validate input, call one method here and turn the
//! outcome into cookies and JSON.

use chrono::{NaiveDateTime, TimeZone, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::cookies::CookieSettings;
use super::extractors::AuthedUser;
use super::models::{
    Account, Session, SessionInfo, User, Verification, VerificationKind, CREDENTIAL_PROVIDER,
    GOOGLE_PROVIDER,
};
use super::password::{hash_password_blocking, verify_password_blocking, PasswordError};
use super::tokens::{TokenError, TokenPair, TokenSigner};
use crate::common::helpers::normalize_email;
use crate::common::{
    generate_account_id, generate_opaque_token, generate_session_id, generate_user_id,
    generate_verification_id, now_millis, safe_email_log, safe_token_log, ApiError, AppConfig,
    AppState,
};
use crate::services::email::{password_reset_email, verification_email};
use crate::services::{GoogleProfile, MailError, Mailer};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_VERIFICATION: &str = "Invalid or expired token";
const INVALID_RESET: &str = "Invalid or expired token.";
const SESSION_EXPIRED: &str = "Session expired";

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        error!(error = %e, "Password hashing failed");
        ApiError::InternalServer("Failed to process password".to_string())
    }
}

impl From<MailError> for ApiError {
    fn from(e: MailError) -> Self {
        error!(error = %e, "Mail delivery failed");
        ApiError::ServiceUnavailable("Failed to send email".to_string())
    }
}

/// Signing failures only; verification errors are mapped per call site
fn signing_error(e: TokenError) -> ApiError {
    error!(error = %e, "Token signing failed");
    ApiError::InternalServer("Failed to issue tokens".to_string())
}

/// Unique-constraint violations become 409, anything else stays a database error
fn conflict_or_db(e: sqlx::Error, message: &str) -> ApiError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return ApiError::Conflict(message.to_string());
        }
    }
    ApiError::DatabaseError(e)
}

/// A session that was just created or refreshed, with the tokens bound to it
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user_id: String,
    pub session_id: String,
    pub tokens: TokenPair,
    /// Unix milliseconds
    pub session_expires_at: i64,
}

/// Rows removed by `purge_expired`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub sessions: u64,
    pub verifications: u64,
}

#[derive(Clone)]
pub struct AuthService {
    db: SqlitePool,
    config: Arc<AppConfig>,
    tokens: TokenSigner,
    mailer: Arc<dyn Mailer>,
}

impl AuthService {
    pub fn new(
        db: SqlitePool,
        config: Arc<AppConfig>,
        tokens: TokenSigner,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            db,
            config,
            tokens,
            mailer,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.db.clone(),
            state.config.clone(),
            state.tokens.clone(),
            state.mailer.clone(),
        )
    }

    pub fn cookie_settings(&self) -> CookieSettings {
        CookieSettings {
            secure: self.config.is_production(),
            access_max_age_secs: self.config.tokens.access_token_ttl.num_seconds(),
            refresh_max_age_secs: self.config.tokens.session_ttl.num_seconds(),
        }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.tokens.access_ttl_secs()
    }

    // ---- Signup and email verification ----

    /// Creates the user, its credential account and an email verification
    /// record, and mails the link. Returns the new user id.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<String, ApiError> {
        let email = normalize_email(email);

        if self.find_user_by_email(&email).await?.is_some() {
            warn!(email = %safe_email_log(&email), "Signup rejected: email already registered");
            return Err(ApiError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }

        let password_hash = hash_password_blocking(password.to_string()).await?;

        let user_id = generate_user_id();
        let token = generate_opaque_token();
        let now = now_millis();
        let expires_at = now + self.config.tokens.email_verification_ttl.num_milliseconds();

        let mut tx = self.db.begin().await.map_err(ApiError::DatabaseError)?;

        sqlx::query("INSERT INTO users (id, name, email, email_verified) VALUES (?, ?, ?, 0)")
            .bind(&user_id)
            .bind(name.trim())
            .bind(&email)
            .execute(&mut *tx)
            .await
            .map_err(|e| conflict_or_db(e, "A user with this email already exists"))?;

        sqlx::query(
            "INSERT INTO accounts (id, user_id, provider_id, account_id, password) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(generate_account_id())
        .bind(&user_id)
        .bind(CREDENTIAL_PROVIDER)
        .bind(&user_id)
        .bind(&password_hash)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::DatabaseError)?;

        insert_verification(
            &mut *tx,
            &user_id,
            VerificationKind::EmailVerification,
            &token,
            expires_at,
            now,
        )
        .await?;

        tx.commit().await.map_err(ApiError::DatabaseError)?;

        // No write lock may be held across the mail round trip
        let url = format!("{}/verify-email?token={}", self.config.app_origin, token);
        if let Err(e) = self.mailer.send(verification_email(&email, &url)).await {
            if let Err(cleanup) = self.discard_user(&user_id).await {
                error!(user_id = %user_id, error = %cleanup, "Failed to remove user after mail failure");
            }
            return Err(e.into());
        }

        info!(user_id = %user_id, email = %safe_email_log(&email), "User signed up");
        Ok(user_id)
    }

    /// Redeems an email verification token and signs the user in
    pub async fn verify_email(
        &self,
        token: &str,
        user_agent: Option<&str>,
    ) -> Result<IssuedSession, ApiError> {
        let record = self
            .find_live_verification(token, VerificationKind::EmailVerification)
            .await?
            .ok_or_else(|| ApiError::Unauthorized(INVALID_VERIFICATION.to_string()))?;

        let session_id = generate_session_id();
        let expires_at = now_millis() + self.config.tokens.session_ttl.num_milliseconds();

        let mut tx = self.db.begin().await.map_err(ApiError::DatabaseError)?;

        consume_verification(&mut *tx, &record.id, INVALID_VERIFICATION).await?;

        sqlx::query(
            "UPDATE users SET email_verified = 1, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(&record.user_id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::DatabaseError)?;

        insert_session(&mut *tx, &session_id, &record.user_id, user_agent, expires_at).await?;

        let issued = self.issue(&record.user_id, &session_id, expires_at)?;
        tx.commit().await.map_err(ApiError::DatabaseError)?;

        info!(user_id = %record.user_id, session_id = %session_id, "Email verified");
        Ok(issued)
    }

    // ---- Login ----

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        user_agent: Option<&str>,
    ) -> Result<IssuedSession, ApiError> {
        let email = normalize_email(email);

        let user = match self.find_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                warn!(email = %safe_email_log(&email), "Login failed: unknown email");
                return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        let password_hash = self
            .find_account(&user.id, CREDENTIAL_PROVIDER)
            .await?
            .and_then(|account| account.password)
            .ok_or_else(|| {
                ApiError::BadRequest("This user does not have a credential account".to_string())
            })?;

        if !verify_password_blocking(password.to_string(), password_hash).await? {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let issued = self.start_session(&user.id, user_agent).await?;
        info!(user_id = %user.id, session_id = %issued.session_id, "User logged in");
        Ok(issued)
    }

    // ---- Password reset ----

    /// Mails a password reset link
    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        let email = normalize_email(email);

        let user = self
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let policy = &self.config.tokens;
        let now = now_millis();
        let window_start = now - policy.password_reset_window.num_milliseconds();

        let recent: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM verifications WHERE user_id = ? AND kind = ? AND created_at > ?",
        )
        .bind(&user.id)
        .bind(VerificationKind::PasswordReset.as_str())
        .bind(window_start)
        .fetch_one(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        if recent >= policy.password_reset_max_requests {
            warn!(user_id = %user.id, recent, "Password reset throttled");
            return Err(ApiError::TooManyRequests(
                "Too many requests. Try again later".to_string(),
            ));
        }

        let token = generate_opaque_token();
        let expires_at = now + policy.password_reset_ttl.num_milliseconds();

        insert_verification(
            &self.db,
            &user.id,
            VerificationKind::PasswordReset,
            &token,
            expires_at,
            now,
        )
        .await?;

        let url = format!("{}/password-reset?token={}", self.config.app_origin, token);
        if let Err(e) = self.mailer.send(password_reset_email(&user.email, &url)).await {
            let discarded = sqlx::query("DELETE FROM verifications WHERE value = ? AND kind = ?")
                .bind(&token)
                .bind(VerificationKind::PasswordReset.as_str())
                .execute(&self.db)
                .await;
            if let Err(cleanup) = discarded {
                error!(user_id = %user.id, error = %cleanup, "Failed to remove reset record after mail failure");
            }
            return Err(e.into());
        }

        info!(user_id = %user.id, "Password reset requested");
        Ok(())
    }

    /// Looks up a live password reset record without consuming it
    pub async fn check_reset_token(&self, token: &str) -> Result<Verification, ApiError> {
        self.find_live_verification(token, VerificationKind::PasswordReset)
            .await?
            .ok_or_else(|| ApiError::Unauthorized(INVALID_RESET.to_string()))
    }

    /// Sets a new password and signs the user out everywhere
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<(), ApiError> {
        let record = self.check_reset_token(token).await?;
        let password_hash = hash_password_blocking(password.to_string()).await?;

        let mut tx = self.db.begin().await.map_err(ApiError::DatabaseError)?;

        consume_verification(&mut *tx, &record.id, INVALID_RESET).await?;

        let updated = sqlx::query(
            "UPDATE accounts SET password = ?, updated_at = datetime('now') WHERE user_id = ? AND provider_id = ?",
        )
        .bind(&password_hash)
        .bind(&record.user_id)
        .bind(CREDENTIAL_PROVIDER)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::DatabaseError)?;

        if updated.rows_affected() == 0 {
            // OAuth-only user choosing a password
            sqlx::query(
                "INSERT INTO accounts (id, user_id, provider_id, account_id, password) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(generate_account_id())
            .bind(&record.user_id)
            .bind(CREDENTIAL_PROVIDER)
            .bind(&record.user_id)
            .bind(&password_hash)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::DatabaseError)?;
        }

        let revoked = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(&record.user_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::DatabaseError)?;

        sqlx::query("DELETE FROM verifications WHERE user_id = ? AND kind = ?")
            .bind(&record.user_id)
            .bind(VerificationKind::PasswordReset.as_str())
            .execute(&mut *tx)
            .await
            .map_err(ApiError::DatabaseError)?;

        tx.commit().await.map_err(ApiError::DatabaseError)?;

        info!(
            user_id = %record.user_id,
            sessions_revoked = revoked.rows_affected(),
            "Password reset"
        );
        Ok(())
    }

    // ---- Refresh and logout ----

    /// Issues a new access token for a live session. Sessions close to expiry
    /// are extended and get a new refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedSession, ApiError> {
        let claims = self.tokens.verify_refresh(refresh_token).map_err(|e| {
            debug!(error = %e, token = %safe_token_log(refresh_token), "Refresh token rejected");
            ApiError::Unauthorized("Invalid refresh token".to_string())
        })?;

        let session: Session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = ?")
            .bind(&claims.sid)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?
            .ok_or_else(|| ApiError::Unauthorized(SESSION_EXPIRED.to_string()))?;

        let now = now_millis();
        if session.expires_at <= now {
            return Err(ApiError::Unauthorized(SESSION_EXPIRED.to_string()));
        }

        let policy = &self.config.tokens;
        let mut expires_at = session.expires_at;
        let mut rotated_refresh = None;

        if session.expires_at - now <= policy.refresh_rotation_threshold.num_milliseconds() {
            expires_at = now + policy.session_ttl.num_milliseconds();

            sqlx::query(
                "UPDATE sessions SET expires_at = ?, updated_at = datetime('now') WHERE id = ?",
            )
            .bind(expires_at)
            .bind(&session.id)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

            rotated_refresh = Some(
                self.tokens
                    .sign_refresh(&session.id, expires_at)
                    .map_err(signing_error)?,
            );
            info!(session_id = %session.id, "Session extended, refresh token rotated");
        }

        let access_token = self
            .tokens
            .sign_access(&session.user_id, &session.id)
            .map_err(signing_error)?;

        Ok(IssuedSession {
            user_id: session.user_id,
            session_id: session.id,
            tokens: TokenPair {
                access_token,
                refresh_token: rotated_refresh,
            },
            session_expires_at: expires_at,
        })
    }

    pub async fn logout(&self, session_id: &str) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        info!(session_id = %session_id, removed = result.rows_affected(), "Logged out");
        Ok(())
    }

    /// Logs out the session an access token names. Only the token itself is
    /// checked, so a session that is already gone still logs out cleanly.
    pub async fn logout_with_token(&self, access_token: &str) -> Result<(), ApiError> {
        let claims = self.tokens.verify_access(access_token).map_err(|e| {
            debug!(error = %e, "Logout with an unusable access token");
            ApiError::Unauthorized("Invalid access token".to_string())
        })?;

        self.logout(&claims.sid).await
    }

    // ---- Google ----

    /// Signs in with a Google profile, linking or creating the user as needed
    pub async fn google_sign_in(
        &self,
        profile: &GoogleProfile,
        user_agent: Option<&str>,
    ) -> Result<IssuedSession, ApiError> {
        let linked: Option<Account> = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE provider_id = ? AND account_id = ?",
        )
        .bind(GOOGLE_PROVIDER)
        .bind(&profile.subject)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        let user_id = match linked {
            Some(account) => account.user_id,
            None => self.link_or_create_google_user(profile).await?,
        };

        let issued = self.start_session(&user_id, user_agent).await?;
        info!(user_id = %user_id, session_id = %issued.session_id, "Signed in with Google");
        Ok(issued)
    }

    async fn link_or_create_google_user(&self, profile: &GoogleProfile) -> Result<String, ApiError> {
        let email = normalize_email(&profile.email);
        let existing = self.find_user_by_email(&email).await?;

        // Linking to an existing user trusts Google's claim on the address
        if existing.is_some() && !profile.email_verified {
            warn!(email = %safe_email_log(&email), "Google sign-in refused: unverified email");
            return Err(ApiError::Unauthorized(
                "Google account email is not verified".to_string(),
            ));
        }

        let mut tx = self.db.begin().await.map_err(ApiError::DatabaseError)?;

        let user_id = match existing {
            Some(user) => {
                sqlx::query(
                    "UPDATE users SET email_verified = 1, updated_at = datetime('now') WHERE id = ?",
                )
                .bind(&user.id)
                .execute(&mut *tx)
                .await
                .map_err(ApiError::DatabaseError)?;
                info!(user_id = %user.id, "Linking Google account to existing user");
                user.id
            }
            None => {
                let user_id = generate_user_id();
                sqlx::query(
                    "INSERT INTO users (id, name, email, email_verified) VALUES (?, ?, ?, 1)",
                )
                .bind(&user_id)
                .bind(&profile.name)
                .bind(&email)
                .execute(&mut *tx)
                .await
                .map_err(|e| conflict_or_db(e, "A user with this email already exists"))?;
                info!(user_id = %user_id, "Created user from Google profile");
                user_id
            }
        };

        sqlx::query(
            "INSERT INTO accounts (id, user_id, provider_id, account_id) VALUES (?, ?, ?, ?)",
        )
        .bind(generate_account_id())
        .bind(&user_id)
        .bind(GOOGLE_PROVIDER)
        .bind(&profile.subject)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_or_db(e, "Google account is already linked"))?;

        tx.commit().await.map_err(ApiError::DatabaseError)?;
        Ok(user_id)
    }

    // ---- Authenticated callers ----

    /// Resolves an access token to its user, requiring the session to be live
    pub async fn authenticate(&self, access_token: &str) -> Result<AuthedUser, ApiError> {
        let claims = self.tokens.verify_access(access_token).map_err(|e| match e {
            TokenError::Expired => ApiError::Unauthorized(SESSION_EXPIRED.to_string()),
            other => {
                debug!(error = %other, "Access token rejected");
                ApiError::Unauthorized("Invalid token".to_string())
            }
        })?;

        let row: Option<(String, String)> = sqlx::query_as(
            r#"
            SELECT u.id, u.email
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = ? AND s.user_id = ? AND s.expires_at > ?
            "#,
        )
        .bind(&claims.sid)
        .bind(&claims.sub)
        .bind(now_millis())
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        match row {
            Some((id, email)) => Ok(AuthedUser {
                id,
                email,
                session_id: claims.sid,
            }),
            None => {
                debug!(session_id = %claims.sid, "Access token for a revoked or expired session");
                Err(ApiError::Unauthorized(SESSION_EXPIRED.to_string()))
            }
        }
    }

    pub async fn current_user(&self, user_id: &str) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    /// Live sessions of a user, newest first
    pub async fn list_sessions(
        &self,
        user_id: &str,
        current_session_id: &str,
    ) -> Result<Vec<SessionInfo>, ApiError> {
        let sessions: Vec<Session> = sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE user_id = ? AND expires_at > ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(user_id)
        .bind(now_millis())
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(sessions
            .into_iter()
            .map(|s| SessionInfo {
                current: s.id == current_session_id,
                expires_at: millis_to_rfc3339(s.expires_at),
                id: s.id,
                user_agent: s.user_agent,
                created_at: s.created_at.map(sqlite_datetime_to_rfc3339),
            })
            .collect())
    }

    /// Deletes one of the caller's own sessions
    pub async fn revoke_session(&self, user_id: &str, session_id: &str) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ? AND user_id = ?")
            .bind(session_id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Session not found".to_string()));
        }

        info!(user_id = %user_id, session_id = %session_id, "Session revoked");
        Ok(())
    }

    /// Deletes expired sessions and verification records
    pub async fn purge_expired(&self) -> Result<PurgeReport, ApiError> {
        let now = now_millis();

        let sessions = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?
            .rows_affected();

        let verifications = sqlx::query("DELETE FROM verifications WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.db)
            .await
            .map_err(ApiError::DatabaseError)?
            .rows_affected();

        Ok(PurgeReport {
            sessions,
            verifications,
        })
    }

    // ---- Internals ----

    /// Undoes a signup whose verification mail could not be sent
    async fn discard_user(&self, user_id: &str) -> Result<(), sqlx::Error> {
        let mut tx = self.db.begin().await?;
        for statement in [
            "DELETE FROM verifications WHERE user_id = ?",
            "DELETE FROM sessions WHERE user_id = ?",
            "DELETE FROM accounts WHERE user_id = ?",
            "DELETE FROM users WHERE id = ?",
        ] {
            sqlx::query(statement)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await
    }

    async fn start_session(
        &self,
        user_id: &str,
        user_agent: Option<&str>,
    ) -> Result<IssuedSession, ApiError> {
        let session_id = generate_session_id();
        let expires_at = now_millis() + self.config.tokens.session_ttl.num_milliseconds();

        insert_session(&self.db, &session_id, user_id, user_agent, expires_at).await?;
        self.issue(user_id, &session_id, expires_at)
    }

    fn issue(
        &self,
        user_id: &str,
        session_id: &str,
        session_expires_at: i64,
    ) -> Result<IssuedSession, ApiError> {
        let access_token = self
            .tokens
            .sign_access(user_id, session_id)
            .map_err(signing_error)?;
        let refresh_token = self
            .tokens
            .sign_refresh(session_id, session_expires_at)
            .map_err(signing_error)?;

        Ok(IssuedSession {
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            tokens: TokenPair {
                access_token,
                refresh_token: Some(refresh_token),
            },
            session_expires_at,
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)
    }

    async fn find_account(&self, user_id: &str, provider: &str) -> Result<Option<Account>, ApiError> {
        sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE user_id = ? AND provider_id = ?")
            .bind(user_id)
            .bind(provider)
            .fetch_optional(&self.db)
            .await
            .map_err(ApiError::DatabaseError)
    }

    async fn find_live_verification(
        &self,
        value: &str,
        kind: VerificationKind,
    ) -> Result<Option<Verification>, ApiError> {
        sqlx::query_as::<_, Verification>(
            "SELECT * FROM verifications WHERE value = ? AND kind = ? AND expires_at > ?",
        )
        .bind(value)
        .bind(kind.as_str())
        .bind(now_millis())
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::DatabaseError)
    }
}

async fn insert_session<'e, E>(
    executor: E,
    session_id: &str,
    user_id: &str,
    user_agent: Option<&str>,
    expires_at: i64,
) -> Result<(), ApiError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO sessions (id, user_id, user_agent, expires_at) VALUES (?, ?, ?, ?)")
        .bind(session_id)
        .bind(user_id)
        .bind(user_agent)
        .bind(expires_at)
        .execute(executor)
        .await
        .map_err(ApiError::DatabaseError)?;
    Ok(())
}

async fn insert_verification<'e, E>(
    executor: E,
    user_id: &str,
    kind: VerificationKind,
    value: &str,
    expires_at: i64,
    created_at: i64,
) -> Result<(), ApiError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO verifications (id, user_id, kind, value, expires_at, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(generate_verification_id())
    .bind(user_id)
    .bind(kind.as_str())
    .bind(value)
    .bind(expires_at)
    .bind(created_at)
    .execute(executor)
    .await
    .map_err(ApiError::DatabaseError)?;
    Ok(())
}

/// Single use: a concurrent redemption that already deleted the row loses
async fn consume_verification<'e, E>(executor: E, id: &str, message: &str) -> Result<(), ApiError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM verifications WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await
        .map_err(ApiError::DatabaseError)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Unauthorized(message.to_string()));
    }
    Ok(())
}

fn millis_to_rfc3339(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| millis.to_string())
}

/// `datetime('now')` text (UTC) to RFC 3339
fn sqlite_datetime_to_rfc3339(raw: String) -> String {
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| Utc.from_utc_datetime(&naive).to_rfc3339())
        .unwrap_or(raw)
}
