//! Email verification endpoints.
//!
//! `GET /verify` is the target of the emailed link, so it answers with
//! browser redirects to the frontend result pages instead of JSON. The
//! resend endpoint always answers the same 200 body so it cannot be used to
//! probe which addresses have accounts.

use axum::{
    Json,
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Redirect},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, warn};

use super::session::issue_session_cookie;
use super::state::AuthState;
use super::storage::{self, ConsumeOutcome, ResendOutcome};
use super::types::{ResendVerificationRequest, ResendVerificationResponse, VerifyEmailQuery};
use super::utils::{build_verify_url, hash_verification_token, normalize_email};
use crate::api::email::verification_message;

const RESEND_MESSAGE: &str =
    "If an account exists for that address, a verification email has been sent.";

fn verification_redirect(frontend_base_url: &str, page: &str) -> Redirect {
    Redirect::to(&format!("{frontend_base_url}/verification/{page}"))
}

#[utoipa::path(
    get,
    path = "/verify",
    params(
        ("token" = String, Query, description = "Raw verification token from the emailed link"),
    ),
    responses(
        (status = 303, description = "Redirects to the frontend verification result page"),
    ),
    tag = "auth"
)]
pub async fn verify_email(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    query: Option<Query<VerifyEmailQuery>>,
) -> impl IntoResponse {
    let frontend = auth_state.config().frontend_base_url();

    let Some(Query(query)) = query else {
        return verification_redirect(frontend, "invalid").into_response();
    };
    let token = query.token.trim();
    if token.is_empty() {
        return verification_redirect(frontend, "invalid").into_response();
    }

    let token_hash = hash_verification_token(token);
    match storage::consume_verification_token(&pool, &token_hash).await {
        Ok(ConsumeOutcome::Verified {
            user_id,
            email,
            role,
        }) => {
            let mut headers = HeaderMap::new();
            if auth_state.config().auto_login_on_verify() {
                // The account is already verified at this point, so a cookie
                // failure downgrades to a success page without a session.
                match issue_session_cookie(&auth_state, user_id, &email, &role, false) {
                    Ok(cookie) => {
                        headers.insert(SET_COOKIE, cookie);
                    }
                    Err(err) => warn!("failed to issue session after verification: {err}"),
                }
            }
            (headers, verification_redirect(frontend, "success")).into_response()
        }
        Ok(ConsumeOutcome::Expired) => verification_redirect(frontend, "expired").into_response(),
        Ok(ConsumeOutcome::NotFound) => verification_redirect(frontend, "invalid").into_response(),
        Err(err) => {
            error!("{err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Verification failed").into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/resend-verification",
    request_body = ResendVerificationRequest,
    responses(
        (status = 200, description = "Generic acknowledgement regardless of account state", body = ResendVerificationResponse),
        (status = 400, description = "Missing payload"),
    ),
    tag = "auth"
)]
pub async fn resend_verification(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResendVerificationRequest>>,
) -> impl IntoResponse {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    // One response body for every outcome; failures only log.
    let email = normalize_email(&payload.email);
    match storage::reissue_verification_for_email(&pool, &email, auth_state.config()).await {
        Ok(ResendOutcome::Reissued { verification_token }) => {
            let verify_url = build_verify_url(
                auth_state.config().frontend_base_url(),
                &verification_token,
            );
            let message = verification_message(&email, &verify_url);
            if let Err(err) = auth_state.email_sender().send(&message) {
                warn!("failed to send verification email: {err}");
            }
        }
        Ok(ResendOutcome::Noop) => {}
        Err(err) => error!("{err}"),
    }

    (
        StatusCode::OK,
        Json(ResendVerificationResponse {
            message: RESEND_MESSAGE.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogEmailSender;
    use crate::api::handlers::auth::state::AuthConfig;
    use anyhow::Result;
    use axum::http::header::LOCATION;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    fn test_state() -> Arc<AuthState> {
        Arc::new(AuthState::new(
            AuthConfig::new("http://localhost:3000".to_string()),
            SecretString::from("0123456789abcdef0123456789abcdef"),
            Arc::new(LogEmailSender),
        ))
    }

    fn lazy_pool() -> Result<PgPool> {
        Ok(PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?)
    }

    #[tokio::test]
    async fn missing_token_redirects_to_invalid() -> Result<()> {
        let response = verify_email(Extension(lazy_pool()?), Extension(test_state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok());
        assert_eq!(
            location,
            Some("http://localhost:3000/verification/invalid")
        );
        Ok(())
    }

    #[tokio::test]
    async fn blank_token_redirects_to_invalid() -> Result<()> {
        let query = Query(VerifyEmailQuery {
            token: "   ".to_string(),
        });
        let response = verify_email(Extension(lazy_pool()?), Extension(test_state()), Some(query))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok());
        assert_eq!(
            location,
            Some("http://localhost:3000/verification/invalid")
        );
        Ok(())
    }

    #[tokio::test]
    async fn resend_requires_payload() -> Result<()> {
        let response = resend_verification(Extension(lazy_pool()?), Extension(test_state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[test]
    fn redirect_pages_follow_frontend_base() {
        let redirect = verification_redirect("https://app.example.com", "expired");
        let response = redirect.into_response();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok());
        assert_eq!(
            location,
            Some("https://app.example.com/verification/expired")
        );
    }
}
