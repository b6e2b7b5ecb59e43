//! Per-category document verification endpoints.
//!
//! Flow Overview:
//! 1) Authenticate the request via session cookie or bearer token.
//! 2) Users read their own statuses; admins read and update anyone's.
//! 3) `GetStatuses` always answers the full category set, defaulting
//!    categories with no stored row, so clients never special-case gaps.

use axum::{
    Json,
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::AuthState;
use super::auth::principal::{ensure_admin, require_auth};

/// Closed set of document categories. Unknown categories are rejected at
/// the boundary, not stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Address,
    Education,
    Employment,
    GovernmentId,
    CriminalRecord,
    Passport,
}

impl Category {
    pub const ALL: [Self; 6] = [
        Self::Address,
        Self::Education,
        Self::Employment,
        Self::GovernmentId,
        Self::CriminalRecord,
        Self::Passport,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Education => "education",
            Self::Employment => "employment",
            Self::GovernmentId => "government_id",
            Self::CriminalRecord => "criminal_record",
            Self::Passport => "passport",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "address" => Some(Self::Address),
            "education" => Some(Self::Education),
            "employment" => Some(Self::Employment),
            "government_id" => Some(Self::GovernmentId),
            "criminal_record" => Some(Self::CriminalRecord),
            "passport" => Some(Self::Passport),
            _ => None,
        }
    }
}

/// Review status of one category. Any status may move to any other status
/// directly; transitions reflect manual review, not a pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    NotVerified,
    Pending,
    Verified,
    Failed,
}

impl Status {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotVerified => "not_verified",
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "not_verified" => Some(Self::NotVerified),
            "pending" => Some(Self::Pending),
            "verified" => Some(Self::Verified),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusEntry {
    pub status: Status,
    pub verified_at: Option<String>,
    pub document_url: Option<String>,
    pub notes: Option<String>,
    pub updated_at: Option<String>,
}

impl StatusEntry {
    fn default_entry() -> Self {
        Self {
            status: Status::NotVerified,
            verified_at: None,
            document_url: None,
            notes: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerificationStatusResponse {
    pub user_id: String,
    pub statuses: BTreeMap<Category, StatusEntry>,
}

#[derive(Debug, Deserialize)]
pub struct VerificationStatusQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SetVerificationStatusRequest {
    pub user_id: String,
    pub category: String,
    pub status: String,
    pub document_url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SetVerificationStatusResponse {
    pub user_id: String,
    pub category: Category,
    pub status: Status,
    pub verified_at: Option<String>,
    pub updated_at: String,
}

#[utoipa::path(
    get,
    path = "/verification-status",
    params(
        ("user_id" = Option<String>, Query, description = "Target user id; admin-only, defaults to the caller"),
    ),
    responses(
        (status = 200, description = "Full category map for the target user", body = VerificationStatusResponse),
        (status = 400, description = "Invalid user id."),
        (status = 401, description = "Missing or invalid session credential."),
        (status = 403, description = "Non-admin asked for another user."),
    ),
    tag = "verification"
)]
pub async fn get_verification_status(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Query(query): Query<VerificationStatusQuery>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };

    let target = match query.user_id.as_deref() {
        None => principal.user_id,
        Some(raw) => {
            let Ok(target) = Uuid::parse_str(raw.trim()) else {
                return (StatusCode::BAD_REQUEST, "Invalid user id.").into_response();
            };
            if target != principal.user_id {
                if let Err(status) = ensure_admin(&principal) {
                    return status.into_response();
                }
            }
            target
        }
    };

    match fetch_statuses(&pool, target).await {
        Ok(statuses) => (
            StatusCode::OK,
            Json(VerificationStatusResponse {
                user_id: target.to_string(),
                statuses,
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to fetch verification statuses: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/verification-status",
    request_body = SetVerificationStatusRequest,
    responses(
        (status = 200, description = "Status upserted (admin-only).", body = SetVerificationStatusResponse),
        (status = 400, description = "Missing payload or unknown user/category/status."),
        (status = 401, description = "Missing or invalid session credential."),
        (status = 403, description = "Caller is not an admin."),
    ),
    tag = "verification"
)]
pub async fn set_verification_status(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<SetVerificationStatusRequest>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &auth_state) {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };
    if let Err(status) = ensure_admin(&principal) {
        return status.into_response();
    }

    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload").into_response();
    };
    let Ok(user_id) = Uuid::parse_str(payload.user_id.trim()) else {
        return (StatusCode::BAD_REQUEST, "Invalid user id.").into_response();
    };
    let Some(category) = Category::parse(payload.category.trim()) else {
        return (StatusCode::BAD_REQUEST, "Unknown category.").into_response();
    };
    let Some(status) = Status::parse(payload.status.trim()) else {
        return (StatusCode::BAD_REQUEST, "Unknown status.").into_response();
    };

    match upsert_status(
        &pool,
        user_id,
        category,
        status,
        payload.document_url.as_deref(),
        payload.notes.as_deref(),
    )
    .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Debug)]
enum ServiceError {
    BadRequest(&'static str),
    Database(sqlx::Error),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::Database(err) => {
                error!("Failed to handle verification status request: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(sqlx::error::DatabaseError::code)
        .is_some_and(|code| code == "23503")
}

async fn fetch_statuses(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<BTreeMap<Category, StatusEntry>, sqlx::Error> {
    let query = r#"
        SELECT
            category,
            status,
            to_char(verified_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS verified_at,
            document_url,
            notes,
            to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
        FROM verification_status
        WHERE user_id = $1
    "#;
    let rows = sqlx::query(query).bind(user_id).fetch_all(pool).await?;

    let mut statuses: BTreeMap<Category, StatusEntry> = Category::ALL
        .iter()
        .map(|category| (*category, StatusEntry::default_entry()))
        .collect();
    for row in rows {
        let category: String = row.get("category");
        let Some(category) = Category::parse(&category) else {
            continue;
        };
        let status: String = row.get("status");
        statuses.insert(
            category,
            StatusEntry {
                status: Status::parse(&status).unwrap_or(Status::NotVerified),
                verified_at: row.get("verified_at"),
                document_url: row.get("document_url"),
                notes: row.get("notes"),
                updated_at: row.get("updated_at"),
            },
        );
    }
    Ok(statuses)
}

async fn upsert_status(
    pool: &PgPool,
    user_id: Uuid,
    category: Category,
    status: Status,
    document_url: Option<&str>,
    notes: Option<&str>,
) -> Result<SetVerificationStatusResponse, ServiceError> {
    // verified_at only ever holds a value while status is 'verified'; every
    // other transition clears it in the same statement.
    let query = r#"
        INSERT INTO verification_status
            (user_id, category, status, verified_at, document_url, notes)
        VALUES ($1, $2, $3, CASE WHEN $3 = 'verified' THEN NOW() END, $4, $5)
        ON CONFLICT (user_id, category)
        DO UPDATE SET
            status = EXCLUDED.status,
            verified_at = CASE WHEN EXCLUDED.status = 'verified' THEN NOW() ELSE NULL END,
            document_url = EXCLUDED.document_url,
            notes = EXCLUDED.notes,
            updated_at = NOW()
        RETURNING
            to_char(verified_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS verified_at,
            to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
    "#;
    let row = sqlx::query(query)
        .bind(user_id)
        .bind(category.as_str())
        .bind(status.as_str())
        .bind(document_url)
        .bind(notes)
        .fetch_one(pool)
        .await
        .map_err(|err| {
            if is_foreign_key_violation(&err) {
                ServiceError::BadRequest("Unknown user.")
            } else {
                ServiceError::Database(err)
            }
        })?;

    Ok(SetVerificationStatusResponse {
        user_id: user_id.to_string(),
        category,
        status,
        verified_at: row.get("verified_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Seed randomized demo statuses for a user across every category.
///
/// Pending and failed rows get the canned reviewer notes the frontend shows.
pub async fn seed_statuses(pool: &PgPool, user_id: Uuid) -> anyhow::Result<()> {
    for category in Category::ALL {
        let status = match rand::thread_rng().gen_range(0..4) {
            0 => Status::NotVerified,
            1 => Status::Pending,
            2 => Status::Verified,
            _ => Status::Failed,
        };
        let notes = match status {
            Status::Failed => Some("Document verification failed. Please resubmit."),
            Status::Pending => Some("Document under review. This may take 2-3 business days."),
            _ => None,
        };
        upsert_status(pool, user_id, category, status, None, notes)
            .await
            .map_err(|err| anyhow::anyhow!("failed to seed {category:?}: {err:?}"))?;
    }
    Ok(())
}
