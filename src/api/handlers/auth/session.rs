//! Stateless session credentials.
//!
//! Login and email verification mint an HMAC-signed claim set that travels in
//! the `auth_token` cookie (or an `Authorization: Bearer` header). Validation
//! is pure computation over the signature and expiry, so no session table
//! exists and logout can only replace the cookie with an expired one.

use anyhow::{Context, Result};
use axum::{
    Json,
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, COOKIE, InvalidHeaderValue, SET_COOKIE},
    },
    response::IntoResponse,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::state::{AuthConfig, AuthState};
use super::types::SessionResponse;
use crate::session_token::{self, SessionClaims};

pub(crate) const SESSION_COOKIE_NAME: &str = "auth_token";

#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Current session claims", body = SessionResponse),
        (status = 401, description = "Missing, invalid, or expired credential"),
    ),
    tag = "auth"
)]
pub async fn session(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    match authenticate_session(&headers, &auth_state) {
        Some(claims) => (
            StatusCode::OK,
            Json(SessionResponse {
                user_id: claims.sub,
                email: claims.email,
                role: claims.role,
                expires_at: claims.exp,
            }),
        )
            .into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 204, description = "Session cookie cleared"),
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(auth_state.config()) {
        headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::NO_CONTENT, headers)
}

/// Validate the presented credential and return its claims.
///
/// `None` covers missing, malformed, badly signed, and expired credentials;
/// callers answer 401 for all of them.
pub(crate) fn authenticate_session(
    headers: &HeaderMap,
    auth_state: &AuthState,
) -> Option<SessionClaims> {
    let token = extract_session_token(headers)?;
    let secret = auth_state.session_secret();
    match session_token::verify_hs256(
        &token,
        secret.expose_secret().as_bytes(),
        session_token::unix_now(),
    ) {
        Ok(claims) => Some(claims),
        Err(session_token::Error::Expired) => {
            debug!("session credential expired");
            None
        }
        Err(err) => {
            debug!("session credential rejected: {err}");
            None
        }
    }
}

/// Sign a fresh credential for the user and wrap it in a Set-Cookie value.
pub(super) fn issue_session_cookie(
    auth_state: &AuthState,
    user_id: Uuid,
    email: &str,
    role: &str,
    remember_me: bool,
) -> Result<HeaderValue> {
    let ttl_seconds = auth_state.config().session_ttl_for(remember_me);
    let now = session_token::unix_now();
    let claims = SessionClaims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        iat: now,
        exp: now.saturating_add(ttl_seconds),
    };
    let token = session_token::sign_hs256(
        auth_state.session_secret().expose_secret().as_bytes(),
        &claims,
    )
    .context("failed to sign session credential")?;
    session_cookie(auth_state.config(), &token, ttl_seconds)
        .context("failed to build session cookie")
}

fn session_cookie(
    config: &AuthConfig,
    token: &str,
    ttl_seconds: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Pull the session token out of the request, preferring the Authorization
/// header over the cookie.
fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }

    let cookie_header = headers.get(COOKIE)?.to_str().ok()?;
    for pair in cookie_header.split(';') {
        let Some((name, value)) = pair.trim().split_once('=') else {
            continue;
        };
        if name == SESSION_COOKIE_NAME && !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogEmailSender;
    use axum::http::header::COOKIE;
    use secrecy::SecretString;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn test_state(frontend: &str) -> AuthState {
        let config = AuthConfig::new(frontend.to_string());
        AuthState::new(config, SecretString::from(SECRET), Arc::new(LogEmailSender))
    }

    fn signed_token(state: &AuthState, exp_offset: i64) -> String {
        let now = session_token::unix_now();
        let claims = SessionClaims {
            sub: Uuid::nil().to_string(),
            email: "asha@example.com".to_string(),
            role: "user".to_string(),
            iat: now,
            exp: now + exp_offset,
        };
        session_token::sign_hs256(state.session_secret().expose_secret().as_bytes(), &claims)
            .unwrap()
    }

    #[test]
    fn session_cookie_carries_attributes() {
        let state = test_state("http://localhost:3000");
        let cookie = issue_session_cookie(
            &state,
            Uuid::nil(),
            "asha@example.com",
            "user",
            false,
        )
        .unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("auth_token="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn session_cookie_secure_over_https() {
        let state = test_state("https://app.example.com");
        let cookie = issue_session_cookie(
            &state,
            Uuid::nil(),
            "asha@example.com",
            "user",
            false,
        )
        .unwrap();
        assert!(cookie.to_str().unwrap().contains("; Secure"));
    }

    #[test]
    fn remember_me_extends_cookie_lifetime() {
        let state = test_state("http://localhost:3000");
        let cookie =
            issue_session_cookie(&state, Uuid::nil(), "asha@example.com", "user", true).unwrap();
        assert!(cookie.to_str().unwrap().contains("Max-Age=2592000"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let state = test_state("http://localhost:3000");
        let cookie = clear_session_cookie(state.config()).unwrap();
        assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
    }

    #[test]
    fn bearer_token_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(
            COOKIE,
            HeaderValue::from_static("auth_token=from-cookie"),
        );
        assert_eq!(
            extract_session_token(&headers),
            Some("from-header".to_string())
        );
    }

    #[test]
    fn cookie_parsed_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; auth_token=abc123; lang=en"),
        );
        assert_eq!(extract_session_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn malformed_cookie_pairs_are_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("garbage; auth_token=abc123"),
        );
        assert_eq!(extract_session_token(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn missing_credential_yields_none() {
        let state = test_state("http://localhost:3000");
        let headers = HeaderMap::new();
        assert!(authenticate_session(&headers, &state).is_none());
    }

    #[test]
    fn valid_cookie_authenticates() {
        let state = test_state("http://localhost:3000");
        let token = signed_token(&state, 3600);
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("auth_token={token}")).unwrap(),
        );
        let claims = authenticate_session(&headers, &state).unwrap();
        assert_eq!(claims.email, "asha@example.com");
        assert_eq!(claims.role, "user");
    }

    #[test]
    fn expired_credential_is_rejected() {
        let state = test_state("http://localhost:3000");
        let token = signed_token(&state, -60);
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        assert!(authenticate_session(&headers, &state).is_none());
    }

    #[test]
    fn tampered_credential_is_rejected() {
        let state = test_state("http://localhost:3000");
        let mut token = signed_token(&state, 3600);
        token.push('x');
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        assert!(authenticate_session(&headers, &state).is_none());
    }

    #[tokio::test]
    async fn session_endpoint_rejects_anonymous() {
        let state = Arc::new(test_state("http://localhost:3000"));
        let response = session(HeaderMap::new(), Extension(state))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn session_endpoint_returns_claims() {
        let state = Arc::new(test_state("http://localhost:3000"));
        let token = signed_token(&state, 3600);
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        let response = session(headers, Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let state = Arc::new(test_state("http://localhost:3000"));
        let response = logout(Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .unwrap();
        assert!(cookie.starts_with("auth_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
