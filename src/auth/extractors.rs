//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use super::cookies::ACCESS_COOKIE;
use super::service::AuthService;
use crate::common::{safe_email_log, ApiError, SharedState};

/// Authenticated caller
///
/// Resolved from the access token in the `Authorization` header, falling back
/// to the `accessToken` cookie. The session the token names must still be
/// live, so a logged-out session is rejected even while its token is unexpired.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub id: String,
    pub email: String,
    pub session_id: String,
}

/// Bearer header first, then the access cookie
pub fn access_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|raw| raw.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(ACCESS_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<SharedState> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        let token = match access_token_from_headers(&parts.headers) {
            Some(t) => t,
            None => {
                warn!("Authentication failed: no access token");
                return Err(ApiError::Unauthorized("Invalid access token".into()));
            }
        };

        let user = AuthService::from_state(&app_state).authenticate(&token).await?;

        debug!(
            user_id = %user.id,
            email = %safe_email_log(&user.email),
            session_id = %user.session_id,
            "User authentication successful via extractor"
        );
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::COOKIE, HeaderValue};

    #[test]
    fn test_bearer_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));
        headers.insert(COOKIE, HeaderValue::from_static("accessToken=cookie-token"));

        assert_eq!(
            access_token_from_headers(&headers).as_deref(),
            Some("header-token")
        );
    }

    #[test]
    fn test_cookie_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; accessToken=cookie-token"),
        );

        assert_eq!(
            access_token_from_headers(&headers).as_deref(),
            Some("cookie-token")
        );
    }

    #[test]
    fn test_other_authorization_schemes_fall_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        headers.insert(COOKIE, HeaderValue::from_static("accessToken=cookie-token"));

        assert_eq!(
            access_token_from_headers(&headers).as_deref(),
            Some("cookie-token")
        );

        headers.remove(COOKIE);
        assert!(access_token_from_headers(&headers).is_none());
    }

    #[test]
    fn test_missing_token() {
        assert!(access_token_from_headers(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(access_token_from_headers(&headers).is_none());
    }
}
