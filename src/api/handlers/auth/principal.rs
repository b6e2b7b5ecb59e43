//! Authenticated request principal.
//!
//! Handlers that need an identity call `require_auth` with the request
//! headers; admin-only operations additionally pass the principal through
//! `ensure_admin`.

use axum::http::{HeaderMap, StatusCode};
use uuid::Uuid;

use super::session::authenticate_session;
use super::state::AuthState;

/// Role carried in session claims and on the users table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parse a role claim or column value; anything unknown maps to `User`
    /// so a corrupted value can never grant admin.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }
}

/// Identity extracted from a valid session credential.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Principal {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authenticate the request or answer 401.
pub(crate) fn require_auth(
    headers: &HeaderMap,
    auth_state: &AuthState,
) -> Result<Principal, StatusCode> {
    let claims = authenticate_session(headers, auth_state).ok_or(StatusCode::UNAUTHORIZED)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| StatusCode::UNAUTHORIZED)?;
    Ok(Principal {
        user_id,
        email: claims.email,
        role: Role::parse(&claims.role),
    })
}

/// Gate for admin-only operations; authenticated non-admins get 403.
pub(crate) fn ensure_admin(principal: &Principal) -> Result<(), StatusCode> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(StatusCode::FORBIDDEN)
    }
}
