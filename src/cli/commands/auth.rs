use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const ARG_DSN_USER: &str = "dsn-user";
pub const ARG_DSN_PASSWORD: &str = "dsn-password";
pub const ARG_VERIFICATION_TOKEN_TTL_SECONDS: &str = "verification-token-ttl-seconds";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_SESSION_REMEMBER_TTL_SECONDS: &str = "session-remember-ttl-seconds";
pub const ARG_AUTO_LOGIN_ON_VERIFY: &str = "auto-login-on-verify";

/// Session tokens are HMAC-SHA256 signed; shorter keys weaken the MAC.
pub const MIN_SESSION_SECRET_BYTES: usize = 32;

#[derive(Debug)]
pub struct Options {
    pub frontend_base_url: String,
    pub session_secret: SecretString,
    pub dsn_user: Option<String>,
    pub dsn_password: Option<SecretString>,
    pub verification_token_ttl_seconds: i64,
    pub session_ttl_seconds: i64,
    pub session_remember_ttl_seconds: i64,
    pub auto_login_on_verify: bool,
}

impl Options {
    /// Parse auth arguments from matches.
    ///
    /// # Errors
    /// Returns an error if required arguments are missing or the session
    /// secret is too short.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let session_secret = matches.get_one::<String>(ARG_SESSION_SECRET).cloned();
        let session_secret = match session_secret {
            Some(value) if value.len() >= MIN_SESSION_SECRET_BYTES => SecretString::from(value),
            Some(_) => anyhow::bail!(
                "--{ARG_SESSION_SECRET} must be at least {MIN_SESSION_SECRET_BYTES} bytes"
            ),
            None => anyhow::bail!("missing required argument: --{ARG_SESSION_SECRET}"),
        };

        let frontend_base_url = matches
            .get_one::<String>(ARG_FRONTEND_BASE_URL)
            .cloned()
            .unwrap_or_else(|| "http://localhost:3000".to_string());

        // Helper to filter empty strings which clap might pass through if env vars are set to ""
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        Ok(Self {
            frontend_base_url,
            session_secret,
            dsn_user: get_non_empty(ARG_DSN_USER),
            dsn_password: get_non_empty(ARG_DSN_PASSWORD).map(SecretString::from),
            verification_token_ttl_seconds: matches
                .get_one::<i64>(ARG_VERIFICATION_TOKEN_TTL_SECONDS)
                .copied()
                .unwrap_or(86_400),
            session_ttl_seconds: matches
                .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
                .copied()
                .unwrap_or(86_400),
            session_remember_ttl_seconds: matches
                .get_one::<i64>(ARG_SESSION_REMEMBER_TTL_SECONDS)
                .copied()
                .unwrap_or(2_592_000),
            auto_login_on_verify: matches
                .get_one::<bool>(ARG_AUTO_LOGIN_ON_VERIFY)
                .copied()
                .unwrap_or(true),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_session_args(command);
    let command = with_verification_args(command);
    with_dsn_credential_args(command)
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_SECRET)
                .long(ARG_SESSION_SECRET)
                .help("HMAC key for signing session tokens (minimum 32 bytes)")
                .env("DWARPAL_SESSION_SECRET")
                .required(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session TTL in seconds")
                .env("DWARPAL_SESSION_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_SESSION_REMEMBER_TTL_SECONDS)
                .long(ARG_SESSION_REMEMBER_TTL_SECONDS)
                .help("Session TTL in seconds when remember-me is requested")
                .env("DWARPAL_SESSION_REMEMBER_TTL_SECONDS")
                .default_value("2592000")
                .value_parser(clap::value_parser!(i64)),
        )
}

fn with_verification_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL used for verification links, redirects and CORS")
                .env("DWARPAL_FRONTEND_BASE_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new(ARG_VERIFICATION_TOKEN_TTL_SECONDS)
                .long(ARG_VERIFICATION_TOKEN_TTL_SECONDS)
                .help("Email verification token TTL in seconds")
                .env("DWARPAL_VERIFICATION_TOKEN_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_AUTO_LOGIN_ON_VERIFY)
                .long(ARG_AUTO_LOGIN_ON_VERIFY)
                .help("Issue a session cookie when a verification link is consumed")
                .env("DWARPAL_AUTO_LOGIN_ON_VERIFY")
                .default_value("true")
                .value_parser(clap::value_parser!(bool)),
        )
}

fn with_dsn_credential_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DSN_USER)
                .long(ARG_DSN_USER)
                .help("Database username injected into the DSN")
                .env("DWARPAL_DSN_USER"),
        )
        .arg(
            Arg::new(ARG_DSN_PASSWORD)
                .long(ARG_DSN_PASSWORD)
                .help("Database password injected into the DSN")
                .env("DWARPAL_DSN_PASSWORD"),
        )
}
