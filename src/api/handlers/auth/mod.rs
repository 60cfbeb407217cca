//! Auth handlers and supporting modules.
//!
//! This module coordinates the account lifecycle: registration, email
//! verification, session login/logout, password reset and Google OAuth.
//!
//! ## Tokens
//!
//! Verification, reset and session tokens are random 32-byte values handed
//! to the client in their raw form; only their SHA-256 digests are stored.
//! A presented token is hashed and looked up, so a database leak does not
//! expose usable tokens.
//!
//! ## Sessions
//!
//! Login stores a session row and sets an HttpOnly cookie with the raw
//! token. Every protected route re-validates the cookie against the
//! `user_sessions` table; logout deletes the row, which invalidates the
//! cookie everywhere.

mod credential;
pub(crate) mod oauth;
mod password;
pub(crate) mod password_reset;
pub(crate) mod principal;
pub(crate) mod register;
pub(crate) mod session;
mod state;
mod storage;
pub(crate) mod types;
mod utils;
pub(crate) mod verification;

pub use state::{AuthConfig, AuthState};

pub(crate) use oauth::{google_callback, google_start};
pub(crate) use password_reset::{forgot_password, reset_password};
pub(crate) use register::register;
pub(crate) use session::{current_user, login, logout};
pub(crate) use verification::verify_email;
