//! Authentication handlers
//!
//! Each handler validates its input, runs one `AuthService` operation and
//! shapes the result into cookies plus a JSON body.

use axum::{
    extract::{Extension, Json, Path, Query},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

use super::cookies::{
    clear_auth_cookies, clear_oauth_state_cookie, set_auth_cookies, set_oauth_state_cookie,
    OAUTH_STATE_COOKIE, REFRESH_COOKIE,
};
use super::extractors::{access_token_from_headers, AuthedUser};
use super::models::{
    AuthResponse, ForgotPasswordRequest, GoogleCallbackQuery, LoginRequest, MessageResponse,
    RefreshRequest, ResetPasswordRequest, SessionListResponse, SignupRequest, TokenQuery,
    UserResponse,
};
use super::service::{AuthService, IssuedSession};
use super::validators::{validate_token, AuthValidator};
use crate::common::{generate_opaque_token, ApiError, SharedState, Validator};

async fn auth_service(state_lock: &SharedState) -> AuthService {
    let state = state_lock.read().await;
    AuthService::from_state(&state)
}

fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_AGENT).and_then(|v| v.to_str().ok())
}

fn required_token(query: TokenQuery) -> Result<String, ApiError> {
    validate_token(query.token.as_deref()).into_result()?;
    Ok(query.token.unwrap_or_default().trim().to_string())
}

fn auth_response(
    message: &str,
    issued: &IssuedSession,
    access_ttl_secs: i64,
    expose_refresh: bool,
) -> AuthResponse {
    AuthResponse {
        success: true,
        message: message.to_string(),
        access_token: issued.tokens.access_token.clone(),
        expires_in: access_ttl_secs,
        refresh_token: if expose_refresh {
            issued.tokens.refresh_token.clone()
        } else {
            None
        },
    }
}

/// GET /health
pub async fn health_handler() -> Json<MessageResponse> {
    Json(MessageResponse::ok("Hello world"))
}

/// POST /auth/signup
pub async fn signup_handler(
    Extension(state_lock): Extension<SharedState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    AuthValidator.validate(&payload).into_result()?;

    auth_service(&state_lock)
        .await
        .signup(&payload.name, &payload.email, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok("Account created. Verification email sent")),
    ))
}

/// POST /auth/email/verify?token=
pub async fn verify_email_handler(
    Extension(state_lock): Extension<SharedState>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(query): Query<TokenQuery>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    let token = required_token(query)?;
    let service = auth_service(&state_lock).await;

    let issued = service.verify_email(&token, user_agent(&headers)).await?;

    let jar = set_auth_cookies(jar, &issued.tokens, &service.cookie_settings());
    let body = auth_response("Email verified", &issued, service.access_ttl_secs(), false);
    Ok((StatusCode::CREATED, jar, Json(body)))
}

/// POST /auth/login
pub async fn login_handler(
    Extension(state_lock): Extension<SharedState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    AuthValidator.validate(&payload).into_result()?;
    let service = auth_service(&state_lock).await;

    let issued = service
        .login(&payload.email, &payload.password, user_agent(&headers))
        .await?;

    let jar = set_auth_cookies(jar, &issued.tokens, &service.cookie_settings());
    let body = auth_response("Login successful", &issued, service.access_ttl_secs(), false);
    Ok((StatusCode::CREATED, jar, Json(body)))
}

/// POST /auth/password/forgot
pub async fn forgot_password_handler(
    Extension(state_lock): Extension<SharedState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    AuthValidator.validate(&payload).into_result()?;

    auth_service(&state_lock)
        .await
        .forgot_password(&payload.email)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok("Password reset email sent.")),
    ))
}

/// GET /auth/password/reset?token=
pub async fn check_reset_token_handler(
    Extension(state_lock): Extension<SharedState>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = required_token(query)?;

    auth_service(&state_lock)
        .await
        .check_reset_token(&token)
        .await?;

    Ok(Json(MessageResponse::ok("Password change verified")))
}

/// POST /auth/password/reset?token=
pub async fn reset_password_handler(
    Extension(state_lock): Extension<SharedState>,
    jar: CookieJar,
    Query(query): Query<TokenQuery>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let token = required_token(query)?;
    AuthValidator.validate(&payload).into_result()?;

    auth_service(&state_lock)
        .await
        .reset_password(&token, &payload.password)
        .await?;

    Ok((
        clear_auth_cookies(jar),
        Json(MessageResponse::ok("Password reset successful")),
    ))
}

/// POST /auth/refresh
///
/// The refresh token comes from the JSON body when present, otherwise from
/// the `refreshToken` cookie. A rotated refresh token is echoed in the body
/// only to clients that sent theirs there.
pub async fn refresh_handler(
    Extension(state_lock): Extension<SharedState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let body_token = body
        .and_then(|Json(request)| request.refresh_token)
        .filter(|t| !t.trim().is_empty());
    let from_body = body_token.is_some();

    let refresh_token = body_token
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()))
        .ok_or_else(|| {
            warn!("Refresh rejected: no refresh token");
            ApiError::Unauthorized("Invalid refresh token".to_string())
        })?;

    let service = auth_service(&state_lock).await;
    let issued = service.refresh(&refresh_token).await?;

    let jar = set_auth_cookies(jar, &issued.tokens, &service.cookie_settings());
    let body = auth_response("Refreshed token", &issued, service.access_ttl_secs(), from_body);
    Ok((jar, Json(body)))
}

/// GET /session
pub async fn session_handler(_authed: AuthedUser) -> Json<MessageResponse> {
    Json(MessageResponse::ok("Valid session"))
}

/// GET / and GET /me
pub async fn me_handler(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = auth_service(&state_lock)
        .await
        .current_user(&authed.id)
        .await?;

    Ok(Json(UserResponse {
        success: true,
        user,
    }))
}

/// POST /logout
///
/// Needs a well-formed access token but not a live session, so cookies of a
/// revoked or expired session still get cleared.
pub async fn logout_handler(
    Extension(state_lock): Extension<SharedState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let access_token = access_token_from_headers(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Invalid access token".to_string()))?;

    auth_service(&state_lock)
        .await
        .logout_with_token(&access_token)
        .await?;

    Ok((
        clear_auth_cookies(jar),
        Json(MessageResponse::ok("Logout successful")),
    ))
}

/// GET /sessions
pub async fn list_sessions_handler(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = auth_service(&state_lock)
        .await
        .list_sessions(&authed.id, &authed.session_id)
        .await?;

    Ok(Json(SessionListResponse {
        success: true,
        sessions,
    }))
}

/// DELETE /sessions/:id
pub async fn revoke_session_handler(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
    Path(session_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    auth_service(&state_lock)
        .await
        .revoke_session(&authed.id, &session_id)
        .await?;

    Ok(Json(MessageResponse::ok("Session revoked")))
}

/// GET /auth/google
/// Redirects the browser to Google's consent page
pub async fn google_oauth_start(
    Extension(state_lock): Extension<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), ApiError> {
    let state = state_lock.read().await;

    let google = state.google_service.as_ref().ok_or_else(|| {
        warn!("Google sign-in requested but not configured");
        ApiError::ServiceUnavailable("Google sign-in is not configured".to_string())
    })?;

    let oauth_state = generate_opaque_token();
    let auth_url = google.get_authorization_url(&oauth_state);
    let jar = set_oauth_state_cookie(jar, &oauth_state, state.config.is_production());

    info!("Redirecting to Google OAuth");
    Ok((jar, Redirect::to(&auth_url)))
}

/// GET /auth/google/callback
///
/// Always answers with a redirect: to the app on success, to its login page
/// on any failure.
pub async fn google_oauth_callback(
    Extension(state_lock): Extension<SharedState>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(params): Query<GoogleCallbackQuery>,
) -> (CookieJar, Redirect) {
    let state = state_lock.read().await.clone();
    let origin = state.config.app_origin.clone();
    let expected_state = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let jar = clear_oauth_state_cookie(jar);

    let outcome: Result<IssuedSession, ApiError> = async {
        if let Some(error) = &params.error {
            return Err(ApiError::Unauthorized(format!("Google returned an error: {}", error)));
        }

        match (&params.state, &expected_state) {
            (Some(received), Some(expected)) if received == expected => {}
            _ => {
                return Err(ApiError::Unauthorized(
                    "OAuth state mismatch".to_string(),
                ))
            }
        }

        let code = params
            .code
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("No authorization code provided".to_string()))?;

        let google = state.google_service.as_ref().ok_or_else(|| {
            ApiError::ServiceUnavailable("Google sign-in is not configured".to_string())
        })?;

        let profile = google.profile_from_code(code).await.map_err(|e| {
            ApiError::Unauthorized(format!("Google sign-in failed: {}", e))
        })?;

        AuthService::from_state(&state)
            .google_sign_in(&profile, user_agent(&headers))
            .await
    }
    .await;

    match outcome {
        Ok(issued) => {
            let settings = AuthService::from_state(&state).cookie_settings();
            (set_auth_cookies(jar, &issued.tokens, &settings), Redirect::to(&origin))
        }
        Err(e) => {
            warn!(error = %e, "Google sign-in failed, redirecting to login");
            (jar, Redirect::to(&format!("{}/login", origin)))
        }
    }
}
