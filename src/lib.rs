//! # Portero (Accounts & Messaging Backend)
//!
//! `portero` is the backend for a small web application: user accounts with
//! email verification, password resets, session-based login (local credentials
//! or Google OAuth) and an outbound WhatsApp messaging relay.
//!
//! ## Accounts
//!
//! Accounts are created with a username, an email address and a password.
//! Emails are normalized to lowercase and must be unique; a freshly registered
//! account stays locked out of login until the verification link sent to that
//! address is followed.
//!
//! - **Local credentials:** passwords are stored as `argon2id` hashes.
//! - **Google accounts:** created on first OAuth login, verified from the
//!   start and carrying no password hash.
//!
//! ## Sessions
//!
//! Login creates a server-side session row keyed by the SHA-256 hash of a
//! random token; only the raw token travels in an `HttpOnly` cookie. Protected
//! routes restore the account from that cookie on every request.
//!
//! ## One-time tokens
//!
//! Email verification and password reset both rely on one-time opaque tokens.
//! Tokens are never persisted in plaintext; the database keeps their SHA-256
//! digests, and reset tokens additionally expire after a configurable TTL.

pub mod api;
pub mod cli;
pub mod google;
pub mod twilio;

#[cfg(test)]
mod test_support;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
