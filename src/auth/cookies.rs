//! Auth cookies
//!
//! The access cookie is sent on every path; the refresh cookie only reaches
//! the refresh endpoint.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use super::tokens::TokenPair;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";
pub const OAUTH_STATE_COOKIE: &str = "oauthState";

pub const REFRESH_PATH: &str = "/auth/refresh";
pub const OAUTH_PATH: &str = "/auth/google";

/// Cookie attributes that depend on configuration
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub secure: bool,
    pub access_max_age_secs: i64,
    pub refresh_max_age_secs: i64,
}

fn base_cookie(name: &'static str, value: String, path: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path(path)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .build()
}

pub fn set_auth_cookies(jar: CookieJar, tokens: &TokenPair, settings: &CookieSettings) -> CookieJar {
    let mut access = base_cookie(ACCESS_COOKIE, tokens.access_token.clone(), "/", settings.secure);
    access.set_max_age(Duration::seconds(settings.access_max_age_secs));
    let jar = jar.add(access);

    match &tokens.refresh_token {
        Some(refresh_token) => {
            let mut refresh =
                base_cookie(REFRESH_COOKIE, refresh_token.clone(), REFRESH_PATH, settings.secure);
            refresh.set_max_age(Duration::seconds(settings.refresh_max_age_secs));
            jar.add(refresh)
        }
        None => jar,
    }
}

/// Expired, empty cookie. Sent even when the request did not carry the
/// cookie, as the refresh cookie only reaches `/auth/refresh`.
fn removal_cookie(name: &'static str, path: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).path(path).http_only(true).build();
    cookie.make_removal();
    cookie
}

pub fn clear_auth_cookies(jar: CookieJar) -> CookieJar {
    jar.add(removal_cookie(ACCESS_COOKIE, "/"))
        .add(removal_cookie(REFRESH_COOKIE, REFRESH_PATH))
}

/// CSRF state for the Google redirect flow; lax so it survives the redirect back
pub fn set_oauth_state_cookie(jar: CookieJar, state: &str, secure: bool) -> CookieJar {
    let mut cookie = base_cookie(OAUTH_STATE_COOKIE, state.to_string(), OAUTH_PATH, secure);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(Duration::minutes(10));
    jar.add(cookie)
}

pub fn clear_oauth_state_cookie(jar: CookieJar) -> CookieJar {
    jar.add(removal_cookie(OAUTH_STATE_COOKIE, OAUTH_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CookieSettings {
        CookieSettings {
            secure: true,
            access_max_age_secs: 900,
            refresh_max_age_secs: 1_209_600,
        }
    }

    #[test]
    fn test_set_both_cookies() {
        let tokens = TokenPair {
            access_token: "access".into(),
            refresh_token: Some("refresh".into()),
        };
        let jar = set_auth_cookies(CookieJar::new(), &tokens, &settings());

        let access = jar.get(ACCESS_COOKIE).unwrap();
        assert_eq!(access.value(), "access");
        assert_eq!(access.path(), Some("/"));
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.secure(), Some(true));
        assert_eq!(access.same_site(), Some(SameSite::Strict));
        assert_eq!(access.max_age(), Some(Duration::seconds(900)));

        let refresh = jar.get(REFRESH_COOKIE).unwrap();
        assert_eq!(refresh.value(), "refresh");
        assert_eq!(refresh.path(), Some(REFRESH_PATH));
        assert_eq!(refresh.max_age(), Some(Duration::seconds(1_209_600)));
    }

    #[test]
    fn test_access_only_when_not_rotated() {
        let tokens = TokenPair {
            access_token: "access".into(),
            refresh_token: None,
        };
        let jar = set_auth_cookies(CookieJar::new(), &tokens, &settings());

        assert!(jar.get(ACCESS_COOKIE).is_some());
        assert!(jar.get(REFRESH_COOKIE).is_none());
    }

    #[test]
    fn test_clear_cookies() {
        let jar = CookieJar::new()
            .add(Cookie::new(ACCESS_COOKIE, "a"))
            .add(Cookie::new(REFRESH_COOKIE, "r"));
        let jar = clear_auth_cookies(jar);

        let access = jar.get(ACCESS_COOKIE).unwrap();
        assert_eq!(access.value(), "");
        assert_eq!(access.max_age(), Some(Duration::ZERO));

        let refresh = jar.get(REFRESH_COOKIE).unwrap();
        assert_eq!(refresh.value(), "");
        assert_eq!(refresh.path(), Some(REFRESH_PATH));
        assert_eq!(refresh.max_age(), Some(Duration::ZERO));
    }

    #[test]
    fn test_clear_without_request_cookies() {
        let jar = clear_auth_cookies(CookieJar::new());
        assert!(jar.get(REFRESH_COOKIE).is_some());
    }

    #[test]
    fn test_oauth_state_cookie() {
        let jar = set_oauth_state_cookie(CookieJar::new(), "xyz", false);
        let cookie = jar.get(OAUTH_STATE_COOKIE).unwrap();

        assert_eq!(cookie.value(), "xyz");
        assert_eq!(cookie.path(), Some(OAUTH_PATH));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));

        let jar = clear_oauth_state_cookie(jar);
        assert_eq!(jar.get(OAUTH_STATE_COOKIE).unwrap().value(), "");
    }
}
