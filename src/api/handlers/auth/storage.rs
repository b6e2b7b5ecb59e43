//! Database helpers for signup, verification and login state.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::state::AuthConfig;
use super::utils::{generate_verification_token, hash_verification_token, is_unique_violation};

/// Validated signup fields, ready to insert. Email is already normalized,
/// the password already hashed.
pub(super) struct NewUser<'a> {
    pub(super) email: &'a str,
    pub(super) username: &'a str,
    pub(super) password_hash: &'a str,
    pub(super) gender: Option<&'a str>,
    pub(super) date_of_birth: Option<&'a str>,
    pub(super) profile_image_url: Option<&'a str>,
}

/// Outcome when attempting to create a new user + verification token.
#[derive(Debug)]
pub(super) enum SignupOutcome {
    Created {
        user_id: Uuid,
        verification_token: String,
    },
    Conflict,
}

/// Outcome of consuming a verification token.
///
/// `Expired` means the hash still matches a stored token whose expiry has
/// passed; the row is left untouched so a later resend can overwrite it.
#[derive(Debug)]
pub(super) enum ConsumeOutcome {
    Verified {
        user_id: Uuid,
        email: String,
        role: String,
    },
    Expired,
    NotFound,
}

/// Outcome for a resend request (callers always answer 200 to avoid
/// account probing).
#[derive(Debug)]
pub(super) enum ResendOutcome {
    Reissued { verification_token: String },
    Noop,
}

/// Everything login needs in one read.
pub(super) struct LoginRecord {
    pub(super) user_id: Uuid,
    pub(super) username: String,
    pub(super) email: String,
    pub(super) role: String,
    pub(super) password_hash: String,
    pub(super) email_verified: bool,
}

pub(super) async fn insert_user_and_verification(
    pool: &PgPool,
    new_user: &NewUser<'_>,
    config: &AuthConfig,
) -> Result<SignupOutcome> {
    // Transaction keeps user creation and token issuance consistent even if
    // something fails between the two statements.
    let mut tx = pool.begin().await.context("begin signup transaction")?;

    let query = r"
        INSERT INTO users
            (email, username, password_hash, gender, date_of_birth, profile_image_url)
        VALUES ($1, $2, $3, $4, ($5)::date, $6)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(new_user.email)
        .bind(new_user.username)
        .bind(new_user.password_hash)
        .bind(new_user.gender)
        .bind(new_user.date_of_birth)
        .bind(new_user.profile_image_url)
        .fetch_one(&mut *tx)
        .instrument(span)
        .await;

    let user_id: Uuid = match row {
        Ok(row) => row.get("id"),
        Err(err) => {
            if is_unique_violation(&err) {
                let _ = tx.rollback().await;
                return Ok(SignupOutcome::Conflict);
            }
            return Err(err).context("failed to insert user");
        }
    };

    let verification_token = issue_verification_token(&mut tx, user_id, config).await?;

    tx.commit().await.context("commit signup transaction")?;

    Ok(SignupOutcome::Created {
        user_id,
        verification_token,
    })
}

/// Issue a fresh verification token for a user, overwriting any prior one.
///
/// At most one token is live per user because the hash and expiry live on
/// the user row itself; issuing is a plain overwrite. Returns the raw token
/// for the email link; only its hash is stored.
pub(super) async fn issue_verification_token(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
    config: &AuthConfig,
) -> Result<String> {
    let token = generate_verification_token()?;
    let token_hash = hash_verification_token(&token);

    let query = r"
        UPDATE users
        SET verification_token_hash = $2,
            verification_token_expires_at = NOW() + ($3 * INTERVAL '1 second'),
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(token_hash)
        .bind(config.verification_token_ttl_seconds())
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to store verification token")?;

    Ok(token)
}

/// Flip a user to verified if the presented token is the current live one.
///
/// The state change is a single conditional `UPDATE`, so concurrent attempts
/// with the same token cannot both succeed, and a consumed token can never
/// match again (the hash is cleared in the same statement).
pub(super) async fn consume_verification_token(
    pool: &PgPool,
    token_hash: &[u8],
) -> Result<ConsumeOutcome> {
    let query = r"
        UPDATE users
        SET email_verified = TRUE,
            verification_token_hash = NULL,
            verification_token_expires_at = NULL,
            updated_at = NOW()
        WHERE verification_token_hash = $1
          AND verification_token_expires_at > NOW()
        RETURNING id, email, role
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to consume verification token")?;

    if let Some(row) = row {
        return Ok(ConsumeOutcome::Verified {
            user_id: row.get("id"),
            email: row.get("email"),
            role: row.get("role"),
        });
    }

    // The conditional update only skips a stored match when its expiry has
    // passed; expired tokens stay in place until a resend overwrites them.
    let query = r"
        SELECT 1 AS present
        FROM users
        WHERE verification_token_hash = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to check for expired verification token")?;

    if row.is_some() {
        Ok(ConsumeOutcome::Expired)
    } else {
        Ok(ConsumeOutcome::NotFound)
    }
}

/// Look up login data by normalized email.
pub(super) async fn lookup_login_record(pool: &PgPool, email: &str) -> Result<Option<LoginRecord>> {
    let query = r"
        SELECT id, username, email, role, password_hash, email_verified
        FROM users
        WHERE email = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup login record")?;

    Ok(row.map(|row| LoginRecord {
        user_id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        role: row.get("role"),
        password_hash: row.get("password_hash"),
        email_verified: row.get("email_verified"),
    }))
}

/// Reissue a verification token for an unverified account.
///
/// Missing and already-verified accounts are a silent no-op; the handler
/// answers identically either way.
pub(super) async fn reissue_verification_for_email(
    pool: &PgPool,
    email: &str,
    config: &AuthConfig,
) -> Result<ResendOutcome> {
    let mut tx = pool.begin().await.context("begin resend transaction")?;

    let query = r"
        SELECT id, email_verified
        FROM users
        WHERE email = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to lookup user for resend")?;

    let Some(row) = row else {
        tx.commit().await.context("commit resend noop")?;
        return Ok(ResendOutcome::Noop);
    };

    let email_verified: bool = row.get("email_verified");
    if email_verified {
        tx.commit().await.context("commit resend noop")?;
        return Ok(ResendOutcome::Noop);
    }

    let user_id: Uuid = row.get("id");
    let verification_token = issue_verification_token(&mut tx, user_id, config).await?;
    tx.commit().await.context("commit resend reissue")?;

    Ok(ResendOutcome::Reissued { verification_token })
}

#[cfg(test)]
mod tests {
    use super::{ConsumeOutcome, LoginRecord, NewUser, ResendOutcome, SignupOutcome};
    use uuid::Uuid;

    #[test]
    fn signup_outcome_debug_names() {
        let created = SignupOutcome::Created {
            user_id: Uuid::nil(),
            verification_token: "t".to_string(),
        };
        assert!(format!("{created:?}").starts_with("Created"));
        assert_eq!(format!("{:?}", SignupOutcome::Conflict), "Conflict");
    }

    #[test]
    fn consume_outcome_debug_names() {
        let verified = ConsumeOutcome::Verified {
            user_id: Uuid::nil(),
            email: "asha@example.com".to_string(),
            role: "user".to_string(),
        };
        assert!(format!("{verified:?}").starts_with("Verified"));
        assert_eq!(format!("{:?}", ConsumeOutcome::Expired), "Expired");
        assert_eq!(format!("{:?}", ConsumeOutcome::NotFound), "NotFound");
    }

    #[test]
    fn resend_outcome_debug_names() {
        let reissued = ResendOutcome::Reissued {
            verification_token: "t".to_string(),
        };
        assert!(format!("{reissued:?}").starts_with("Reissued"));
        assert_eq!(format!("{:?}", ResendOutcome::Noop), "Noop");
    }

    #[test]
    fn login_record_holds_values() {
        let record = LoginRecord {
            user_id: Uuid::nil(),
            username: "asha".to_string(),
            email: "asha@example.com".to_string(),
            role: "user".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            email_verified: false,
        };
        assert_eq!(record.user_id, Uuid::nil());
        assert_eq!(record.role, "user");
        assert!(!record.email_verified);
    }

    #[test]
    fn new_user_borrows_optional_fields() {
        let new_user = NewUser {
            email: "asha@example.com",
            username: "asha",
            password_hash: "$argon2id$stub",
            gender: Some("female"),
            date_of_birth: None,
            profile_image_url: None,
        };
        assert_eq!(new_user.gender, Some("female"));
        assert!(new_user.date_of_birth.is_none());
    }
}
