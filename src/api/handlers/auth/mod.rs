//! Account lifecycle: signup, email verification, password login, and
//! stateless sessions.

pub(crate) mod login;
mod password;
pub(crate) mod principal;
pub(crate) mod session;
pub(crate) mod signup;
pub(crate) mod state;
mod storage;
pub(crate) mod types;
mod utils;
pub(crate) mod verification;

pub use state::{AuthConfig, AuthState};
