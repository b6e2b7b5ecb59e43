//! Small helpers for signup validation and email verification token handling.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{RngCore, rngs::OsRng};
use regex::Regex;
use sha2::{Digest, Sha256};

/// Normalize an email for lookup/uniqueness checks.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(crate) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Password policy: length only. Complexity rules push users toward
/// predictable substitutions, so none are enforced here.
pub(crate) fn valid_password(password: &str) -> bool {
    (8..=128).contains(&password.chars().count())
}

pub(crate) fn valid_username(username: &str) -> bool {
    let trimmed = username.trim();
    (1..=64).contains(&trimmed.chars().count())
}

/// Accepts `YYYY-MM-DD` with a real calendar date. The value is bound as
/// text and cast to `DATE` in SQL, so it must be valid before it reaches
/// the store.
pub(crate) fn valid_date_of_birth(value: &str) -> bool {
    let Some(captures) = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$")
        .ok()
        .and_then(|regex| regex.captures(value))
    else {
        return false;
    };

    let field = |index: usize| -> Option<i64> {
        captures.get(index).and_then(|m| m.as_str().parse().ok())
    };
    let (Some(year), Some(month), Some(day)) = (field(1), field(2), field(3)) else {
        return false;
    };

    if !(1900..=2100).contains(&year) || !(1..=12).contains(&month) {
        return false;
    }

    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    let days_in_month = match month {
        2 if leap => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    };
    (1..=days_in_month).contains(&day)
}

/// Create a new verification token for email links.
///
/// Returned token is only sent to the user; we store a hash in the database.
pub(crate) fn generate_verification_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate verification token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Hash a verification token so we never store the raw token in the database.
pub(crate) fn hash_verification_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

/// Build the frontend verification link included in outbound emails.
pub(crate) fn build_verify_url(frontend_base_url: &str, token: &str) -> String {
    let base = frontend_base_url.trim_end_matches('/');
    format!("{base}/verify-email?token={token}")
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn valid_password_enforces_length_only() {
        assert!(valid_password("Secret123"));
        assert!(valid_password("all lowercase but long"));
        assert!(!valid_password("short"));
        assert!(!valid_password(&"x".repeat(129)));
    }

    #[test]
    fn valid_username_bounds() {
        assert!(valid_username("asha"));
        assert!(valid_username(&"x".repeat(64)));
        assert!(!valid_username("   "));
        assert!(!valid_username(&"x".repeat(65)));
    }

    #[test]
    fn valid_date_of_birth_accepts_real_dates() {
        assert!(valid_date_of_birth("1990-05-17"));
        assert!(valid_date_of_birth("2000-02-29"));
        assert!(valid_date_of_birth("1999-12-31"));
    }

    #[test]
    fn valid_date_of_birth_rejects_bad_dates() {
        assert!(!valid_date_of_birth("1990-13-01"));
        assert!(!valid_date_of_birth("1900-02-29"));
        assert!(!valid_date_of_birth("1990-04-31"));
        assert!(!valid_date_of_birth("17-05-1990"));
        assert!(!valid_date_of_birth("1990/05/17"));
    }

    #[test]
    fn build_verify_url_trims_trailing_slash() {
        let url = build_verify_url("https://dwarpal.dev/", "token");
        assert_eq!(url, "https://dwarpal.dev/verify-email?token=token");
    }

    #[test]
    fn generate_verification_token_round_trip() {
        let decoded_len = generate_verification_token()
            .ok()
            .and_then(|token| Base64UrlUnpadded::decode_vec(&token).ok())
            .map(|bytes| bytes.len());
        assert_eq!(decoded_len, Some(32));
    }

    #[test]
    fn hash_verification_token_stable() {
        let first = hash_verification_token("token");
        let second = hash_verification_token("token");
        let different = hash_verification_token("other");
        assert_eq!(first, second);
        assert_ne!(first, different);
    }

    #[test]
    fn is_unique_violation_ignores_non_database_errors() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
