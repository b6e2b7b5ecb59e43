//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action the binary executes, either the
//! API server with its full configuration or the one-shot seed job.

use crate::cli::actions::{Action, seed, server};
use crate::cli::commands::auth;
use anyhow::{Context, Result};

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    if let Some(seed_matches) = matches.subcommand_matches("seed") {
        let dsn = seed_matches
            .get_one::<String>("dsn")
            .cloned()
            .context("missing required argument: --dsn")?;
        let user_email = seed_matches
            .get_one::<String>("user-email")
            .cloned()
            .context("missing required argument: --user-email")?;

        return Ok(Action::Seed(seed::Args { dsn, user_email }));
    }

    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(server::Args {
        port,
        dsn,
        dsn_user: auth_opts.dsn_user,
        dsn_password: auth_opts.dsn_password,
        session_secret: auth_opts.session_secret,
        frontend_base_url: auth_opts.frontend_base_url,
        verification_token_ttl_seconds: auth_opts.verification_token_ttl_seconds,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        session_remember_ttl_seconds: auth_opts.session_remember_ttl_seconds,
        auto_login_on_verify: auth_opts.auto_login_on_verify,
    }))
}
