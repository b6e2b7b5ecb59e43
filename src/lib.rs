//! # Dwarpal (Account Lifecycle Service)
//!
//! `dwarpal` is the account gatekeeper of a matrimony platform. It owns the
//! signup → email-verification → login state machine and the per-user
//! document verification tracker.
//!
//! ## Email Verification
//!
//! Signup creates an unverified account and issues a single-use verification
//! token (the database stores only its SHA-256). Tokens expire after a
//! configurable TTL; issuing a new one overwrites the previous one, so at
//! most one token is live per user. Consumption is a single conditional
//! `UPDATE`, which makes verification at-most-once even under concurrent
//! requests. Expired tokens stay in place until a resend overwrites them.
//!
//! ## Sessions
//!
//! Sessions are stateless HS256-signed JWTs carried in an `HttpOnly` cookie
//! (or a bearer header). Validity is computed from the signature and the
//! embedded expiry alone; there is no server-side session table and no
//! revocation list.
//!
//! ## Document Verification
//!
//! Each user has an independent status per category (address, education,
//! employment, government ID, criminal record, passport). Categories without
//! a stored row read as `not_verified`. Only admins may change statuses;
//! `verified_at` is set exactly while a category is `verified`.

pub mod api;
pub mod cli;
pub mod session_token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
