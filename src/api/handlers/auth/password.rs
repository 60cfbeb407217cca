//! Password hashing for local credentials.
//!
//! Argon2id with per-password random salts. Only the encoded hash string is
//! stored; verification reparses it on every login attempt.

use anyhow::Result;
use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{PasswordHash, SaltString},
};
use rand::rngs::OsRng;

pub(super) fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|err| anyhow::anyhow!("failed to hash password: {err}"))?
        .to_string();
    Ok(hash)
}

/// Check a plaintext password against a stored hash.
/// A malformed stored hash counts as a mismatch, not an error.
pub(super) fn verify_password(plain: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    })
}
