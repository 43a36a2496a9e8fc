use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
    response::Redirect,
};
use chrono::{Duration, Utc};
use cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::middleware::AppState;

pub const SESSION_COOKIE: &str = "linkboard_session";

/// Upper bound for `--session-hours`, one year.
pub const MAX_SESSION_HOURS: i64 = 8760;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    admin: bool,
    iat: i64,
    exp: i64,
}

/// Signs and checks the session cookie.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    hours: i64,
}

impl SessionKeys {
    /// `hours` is clamped to `1..=MAX_SESSION_HOURS`.
    pub fn new(secret: &str, hours: i64) -> SessionKeys {
        SessionKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            hours: hours.clamp(1, MAX_SESSION_HOURS),
        }
    }

    /// A fresh admin session cookie for `username`.
    pub fn issue(&self, username: &str) -> Result<Cookie<'static>, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            admin: true,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.hours)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;

        Ok(Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(cookie::time::Duration::hours(self.hours))
            .build())
    }

    /// A cookie that makes the browser drop the session.
    pub fn clear(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        cookie.make_removal();
        cookie
    }

    pub fn is_admin(&self, token: &str) -> bool {
        match decode::<Claims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => data.claims.admin,
            Err(e) => {
                debug!("Rejected session token: {}", e);
                false
            }
        }
    }
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

/// Who is making the request. A missing or invalid cookie is a visitor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub is_admin: bool,
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let is_admin = session_token(&parts.headers)
            .map(|token| state.sessions.is_admin(&token))
            .unwrap_or(false);

        Ok(Session { is_admin })
    }
}

/// Guard for admin-only routes. Visitors are sent to the login page.
#[derive(Clone, Copy, Debug)]
pub struct AdminSession;

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(session) = Session::from_request_parts(parts, state).await;

        if session.is_admin {
            Ok(AdminSession)
        } else {
            debug!("Admin session required for {}", parts.uri);
            Err(Redirect::to("/login"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::resolve_secret;
    use axum::http::HeaderValue;

    fn claims_of(keys: &SessionKeys, token: &str) -> Claims {
        decode::<Claims>(token, &keys.decoding, &Validation::default())
            .unwrap()
            .claims
    }

    #[test]
    fn issued_cookie_verifies() {
        let keys = SessionKeys::new("test-secret", 1);
        let cookie = keys.issue("editor").unwrap();

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert!(keys.is_admin(cookie.value()));
        assert_eq!(claims_of(&keys, cookie.value()).sub, "editor");
    }

    #[test]
    fn blank_secret_is_replaced_before_signing() {
        let forger = SessionKeys::new("", 1);
        let forged = forger.issue("admin").unwrap();

        let keys = SessionKeys::new(&resolve_secret(Some(String::new())), 1);
        assert!(!keys.is_admin(forged.value()));

        let keys = SessionKeys::new(&resolve_secret(Some("  ".to_string())), 1);
        assert!(!keys.is_admin(forged.value()));
    }

    #[test]
    fn session_hours_are_clamped() {
        let huge = SessionKeys::new("test-secret", i64::MAX / 1000);
        let cookie = huge.issue("admin").unwrap();
        assert!(huge.is_admin(cookie.value()));
        assert_eq!(
            cookie.max_age(),
            Some(cookie::time::Duration::hours(MAX_SESSION_HOURS))
        );

        let zero = SessionKeys::new("test-secret", 0);
        let cookie = zero.issue("admin").unwrap();
        assert!(zero.is_admin(cookie.value()));
        assert_eq!(cookie.max_age(), Some(cookie::time::Duration::hours(1)));
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let ours = SessionKeys::new("test-secret", 1);
        let theirs = SessionKeys::new("other-secret", 1);
        let cookie = theirs.issue("admin").unwrap();

        assert!(!ours.is_admin(cookie.value()));
        assert!(!ours.is_admin("not-a-token"));
        assert!(!ours.is_admin(""));
    }

    #[test]
    fn expired_session_is_rejected() {
        let keys = SessionKeys::new("test-secret", 1);
        let issued = Utc::now() - Duration::hours(3);
        let claims = Claims {
            sub: "admin".to_string(),
            admin: true,
            iat: issued.timestamp(),
            exp: (issued + Duration::hours(1)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();

        assert!(!keys.is_admin(&token));
    }

    #[test]
    fn cleared_cookie_is_a_removal() {
        let keys = SessionKeys::new("test-secret", 1);
        let cookie = keys.clear();

        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(cookie::time::Duration::ZERO));
    }

    #[test]
    fn session_token_is_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("lang=en; linkboard_session=abc.def.ghi"),
        );

        assert_eq!(session_token(&headers).as_deref(), Some("abc.def.ghi"));
        assert_eq!(session_token(&HeaderMap::new()), None);
    }
}
