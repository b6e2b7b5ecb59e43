use crate::api::handlers::verification_status;
use anyhow::{Context, Result, anyhow};
use sqlx::{Row, postgres::PgPoolOptions};
use tracing::info;
use uuid::Uuid;

#[derive(Debug)]
pub struct Args {
    pub dsn: String,
    pub user_email: String,
}

/// Execute the seed action: write demo tracker rows for one existing user.
/// # Errors
/// Returns an error if the database is unreachable, the user does not exist
/// or the upserts fail.
pub async fn execute(args: Args) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&args.dsn)
        .await
        .context("Failed to connect to the database")?;

    // Stored emails are normalized at signup.
    let email = args.user_email.trim().to_lowercase();

    let row = sqlx::query("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&pool)
        .await?;

    let Some(row) = row else {
        return Err(anyhow!("No user found for email {email}"));
    };

    let user_id: Uuid = row.get("id");

    verification_status::seed_statuses(&pool, user_id).await?;

    info!("Seeded verification statuses for {email}");

    Ok(())
}
