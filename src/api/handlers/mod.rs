//! API handlers for dwarpal.
//!
//! `auth` owns the account lifecycle (signup, verification, login, sessions);
//! `verification_status` owns the per-category document tracker.

pub mod auth;
pub mod health;
pub mod verification_status;
