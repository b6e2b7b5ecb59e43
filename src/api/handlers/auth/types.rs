//! Request/response types for account lifecycle endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignupResponse {
    pub message: String,
    pub user_id: String,
    /// Set when the verification email could not be dispatched; account
    /// creation still succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub email_verified: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub user: UserProfile,
}

/// 403 body for correct credentials on an unverified account.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginErrorResponse {
    pub error: String,
    pub needs_verification: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct ResendVerificationRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResendVerificationResponse {
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub user_id: String,
    pub email: String,
    pub role: String,
    pub expires_at: i64,
}

#[derive(Deserialize, Debug)]
pub struct VerifyEmailQuery {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};
    use serde_json::json;

    #[test]
    fn signup_request_round_trips() -> Result<()> {
        let request = SignupRequest {
            email: "asha@example.com".to_string(),
            password: "Secret123".to_string(),
            username: "asha".to_string(),
            gender: Some("female".to_string()),
            date_of_birth: None,
            profile_image_url: None,
        };
        let value = serde_json::to_value(&request)?;
        let email = value
            .get("email")
            .and_then(serde_json::Value::as_str)
            .context("missing email")?;
        assert_eq!(email, "asha@example.com");
        let decoded: SignupRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.username, "asha");
        Ok(())
    }

    #[test]
    fn signup_request_rejects_unknown_fields() {
        let result: Result<SignupRequest, _> = serde_json::from_value(json!({
            "email": "asha@example.com",
            "password": "Secret123",
            "username": "asha",
            "is_admin": true,
        }));
        assert!(result.is_err());
    }

    #[test]
    fn login_request_defaults_remember_me() -> Result<()> {
        let decoded: LoginRequest = serde_json::from_value(json!({
            "email": "asha@example.com",
            "password": "Secret123",
        }))?;
        assert!(!decoded.remember_me);
        Ok(())
    }

    #[test]
    fn signup_response_omits_missing_warning() -> Result<()> {
        let response = SignupResponse {
            message: "ok".to_string(),
            user_id: "id".to_string(),
            warning: None,
        };
        let value = serde_json::to_value(&response)?;
        assert!(value.get("warning").is_none());
        Ok(())
    }

    #[test]
    fn login_error_response_carries_flag() -> Result<()> {
        let response = LoginErrorResponse {
            error: "Please verify your email before logging in.".to_string(),
            needs_verification: true,
        };
        let value = serde_json::to_value(&response)?;
        assert_eq!(
            value.get("needs_verification"),
            Some(&serde_json::Value::Bool(true))
        );
        Ok(())
    }
}
