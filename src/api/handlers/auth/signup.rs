//! Account creation endpoint.

use anyhow::Context;
use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, warn};

use super::password::hash_password;
use super::state::AuthState;
use super::storage::{self, NewUser, SignupOutcome};
use super::types::{SignupRequest, SignupResponse};
use super::utils::{
    build_verify_url, normalize_email, valid_date_of_birth, valid_email, valid_password,
    valid_username,
};
use crate::api::email::verification_message;

#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created, verification email dispatched", body = SignupResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Email already registered"),
    ),
    tag = "auth"
)]
pub async fn signup(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<SignupRequest>>,
) -> impl IntoResponse {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let email = normalize_email(&payload.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email address").into_response();
    }
    if !valid_password(&payload.password) {
        return (
            StatusCode::BAD_REQUEST,
            "Password must be between 8 and 128 characters",
        )
            .into_response();
    }
    let username = payload.username.trim();
    if !valid_username(username) {
        return (StatusCode::BAD_REQUEST, "Username is required").into_response();
    }
    if let Some(date_of_birth) = payload.date_of_birth.as_deref() {
        if !valid_date_of_birth(date_of_birth) {
            return (StatusCode::BAD_REQUEST, "Invalid date of birth").into_response();
        }
    }

    // Argon2 is deliberately slow; keep it off the async workers.
    let password = payload.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("password hashing task failed")
        .and_then(|result| result);
    let password_hash = match password_hash {
        Ok(hash) => hash,
        Err(err) => {
            error!("{err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Signup failed").into_response();
        }
    };

    let new_user = NewUser {
        email: &email,
        username,
        password_hash: &password_hash,
        gender: payload.gender.as_deref(),
        date_of_birth: payload.date_of_birth.as_deref(),
        profile_image_url: payload.profile_image_url.as_deref(),
    };

    let outcome =
        match storage::insert_user_and_verification(&pool, &new_user, auth_state.config()).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("{err}");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Signup failed").into_response();
            }
        };

    match outcome {
        SignupOutcome::Conflict => {
            (StatusCode::CONFLICT, "Email already registered").into_response()
        }
        SignupOutcome::Created {
            user_id,
            verification_token,
        } => {
            // Delivery is best effort: the account exists either way, and the
            // client can fall back to resend-verification.
            let verify_url = build_verify_url(
                auth_state.config().frontend_base_url(),
                &verification_token,
            );
            let message = verification_message(&email, &verify_url);
            let warning = match auth_state.email_sender().send(&message) {
                Ok(()) => None,
                Err(err) => {
                    warn!("failed to send verification email: {err}");
                    Some(
                        "Verification email could not be sent. \
                         Use resend-verification to request a new link."
                            .to_string(),
                    )
                }
            };

            (
                StatusCode::CREATED,
                Json(SignupResponse {
                    message: "Account created. Please check your email to verify your account."
                        .to_string(),
                    user_id: user_id.to_string(),
                    warning,
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogEmailSender;
    use crate::api::handlers::auth::state::AuthConfig;
    use anyhow::Result;
    use secrecy::SecretString;
    use serde_json::json;
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
    async fn signup_requires_payload() -> Result<()> {
        let pool = lazy_pool()?;
        let response = signup(Extension(pool), Extension(test_state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn signup_rejects_invalid_email() -> Result<()> {
        let pool = lazy_pool()?;
        let payload: SignupRequest = serde_json::from_value(json!({
            "email": "not-an-email",
            "password": "Secret123",
            "username": "asha",
        }))?;
        let response = signup(Extension(pool), Extension(test_state()), Some(Json(payload)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn signup_rejects_short_password() -> Result<()> {
        let pool = lazy_pool()?;
        let payload: SignupRequest = serde_json::from_value(json!({
            "email": "asha@example.com",
            "password": "short",
            "username": "asha",
        }))?;
        let response = signup(Extension(pool), Extension(test_state()), Some(Json(payload)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn signup_rejects_blank_username() -> Result<()> {
        let pool = lazy_pool()?;
        let payload: SignupRequest = serde_json::from_value(json!({
            "email": "asha@example.com",
            "password": "Secret123",
            "username": "   ",
        }))?;
        let response = signup(Extension(pool), Extension(test_state()), Some(Json(payload)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn signup_rejects_bad_date_of_birth() -> Result<()> {
        let pool = lazy_pool()?;
        let payload: SignupRequest = serde_json::from_value(json!({
            "email": "asha@example.com",
            "password": "Secret123",
            "username": "asha",
            "date_of_birth": "1995-02-30",
        }))?;
        let response = signup(Extension(pool), Extension(test_state()), Some(Json(payload)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
