//! Authentication routes

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /auth/signup`, `POST /auth/login` - credential sign-up and sign-in
/// - `POST /auth/email/verify?token=` - redeem an email verification link
/// - `POST /auth/password/forgot`, `GET|POST /auth/password/reset?token=` - password reset
/// - `POST /auth/refresh` - new access token (rotates the refresh token near session expiry)
/// - `GET /auth/google`, `GET /auth/google/callback` - Google sign-in
/// - `GET /session`, `GET /`, `GET /me`, `POST /logout` - authenticated caller
/// - `GET /sessions`, `DELETE /sessions/:id` - device management
pub fn auth_routes() -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/auth/signup", post(handlers::signup_handler))
        .route("/auth/email/verify", post(handlers::verify_email_handler))
        .route("/auth/login", post(handlers::login_handler))
        .route("/auth/password/forgot", post(handlers::forgot_password_handler))
        .route(
            "/auth/password/reset",
            get(handlers::check_reset_token_handler).post(handlers::reset_password_handler),
        )
        .route("/auth/refresh", post(handlers::refresh_handler))
        .route("/auth/google", get(handlers::google_oauth_start))
        .route("/auth/google/callback", get(handlers::google_oauth_callback))
        .route("/session", get(handlers::session_handler))
        .route("/", get(handlers::me_handler))
        .route("/me", get(handlers::me_handler))
        .route("/logout", post(handlers::logout_handler))
        .route("/sessions", get(handlers::list_sessions_handler))
        .route("/sessions/:id", delete(handlers::revoke_session_handler))
}
