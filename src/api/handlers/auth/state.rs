//! Auth state and configuration shared by the account lifecycle handlers.

use secrecy::SecretString;
use std::sync::Arc;

use crate::api::email::EmailSender;

const DEFAULT_VERIFICATION_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_SESSION_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_SESSION_REMEMBER_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    verification_token_ttl_seconds: i64,
    session_ttl_seconds: i64,
    session_remember_ttl_seconds: i64,
    auto_login_on_verify: bool,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            verification_token_ttl_seconds: DEFAULT_VERIFICATION_TOKEN_TTL_SECONDS,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            session_remember_ttl_seconds: DEFAULT_SESSION_REMEMBER_TTL_SECONDS,
            auto_login_on_verify: true,
        }
    }

    #[must_use]
    pub fn with_verification_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.verification_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_remember_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_remember_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_auto_login_on_verify(mut self, enabled: bool) -> Self {
        self.auto_login_on_verify = enabled;
        self
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(crate) fn verification_token_ttl_seconds(&self) -> i64 {
        self.verification_token_ttl_seconds
    }

    pub(crate) fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    pub(crate) fn session_remember_ttl_seconds(&self) -> i64 {
        self.session_remember_ttl_seconds
    }

    /// TTL for a new session: the extended lifetime when the client asked to
    /// be remembered, the default otherwise.
    pub(crate) fn session_ttl_for(&self, remember_me: bool) -> i64 {
        if remember_me {
            self.session_remember_ttl_seconds
        } else {
            self.session_ttl_seconds
        }
    }

    pub(crate) fn auto_login_on_verify(&self) -> bool {
        self.auto_login_on_verify
    }

    pub(crate) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

pub struct AuthState {
    config: AuthConfig,
    session_secret: SecretString,
    email_sender: Arc<dyn EmailSender>,
}

impl AuthState {
    pub fn new(
        config: AuthConfig,
        session_secret: SecretString,
        email_sender: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            config,
            session_secret,
            email_sender,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(crate) fn session_secret(&self) -> &SecretString {
        &self.session_secret
    }

    pub(crate) fn email_sender(&self) -> &dyn EmailSender {
        self.email_sender.as_ref()
    }
}
