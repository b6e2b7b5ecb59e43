//! Password login endpoint.
//!
//! Unknown email and wrong password answer the same generic 401 so the
//! endpoint cannot be used to probe which addresses have accounts. Correct
//! credentials on an unverified account answer 403 with a
//! `needs_verification` flag instead of minting a session.

use anyhow::Context;
use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::password::verify_password;
use super::session::issue_session_cookie;
use super::state::AuthState;
use super::storage;
use super::types::{LoginErrorResponse, LoginRequest, LoginResponse, UserProfile};
use super::utils::normalize_email;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session cookie issued", body = LoginResponse),
        (status = 400, description = "Missing payload"),
        (status = 401, description = "Unknown email or wrong password"),
        (status = 403, description = "Credentials valid but email not verified", body = LoginErrorResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };

    let email = normalize_email(&payload.email);
    let record = match storage::lookup_login_record(&pool, &email).await {
        Ok(record) => record,
        Err(err) => {
            error!("{err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed").into_response();
        }
    };
    let Some(record) = record else {
        return (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS).into_response();
    };

    let password = payload.password.clone();
    let password_hash = record.password_hash.clone();
    let password_matches =
        tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .context("password verification task failed");
    let password_matches = match password_matches {
        Ok(matches) => matches,
        Err(err) => {
            error!("{err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed").into_response();
        }
    };
    if !password_matches {
        return (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS).into_response();
    }

    // Password is checked first so this branch never leaks whether a wrong
    // password belongs to an unverified account.
    if !record.email_verified {
        return (
            StatusCode::FORBIDDEN,
            Json(LoginErrorResponse {
                error: "Please verify your email before logging in.".to_string(),
                needs_verification: true,
            }),
        )
            .into_response();
    }

    let cookie = match issue_session_cookie(
        &auth_state,
        record.user_id,
        &record.email,
        &record.role,
        payload.remember_me,
    ) {
        Ok(cookie) => cookie,
        Err(err) => {
            error!("{err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed").into_response();
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    (
        StatusCode::OK,
        headers,
        Json(LoginResponse {
            user: UserProfile {
                id: record.user_id.to_string(),
                username: record.username,
                email: record.email,
                role: record.role,
                email_verified: record.email_verified,
            },
        }),
    )
        .into_response()
}
