//! Authenticated principal extraction.
//!
//! Flow Overview: read the session cookie, resolve it to an account, and
//! return a principal that downstream handlers can use.

use axum::http::HeaderMap;
use sqlx::PgPool;

use super::super::error::ApiError;
use super::session::authenticate_session;

/// Authenticated user context derived from the session cookie.
#[derive(Clone, Debug)]
pub struct Principal {
    pub user_id: uuid::Uuid,
    pub username: String,
    pub email: String,
}

/// Resolve a session cookie into a principal, or fail with 401.
pub async fn require_auth(headers: &HeaderMap, pool: &PgPool) -> Result<Principal, ApiError> {
    match authenticate_session(headers, pool).await? {
        Some(record) => Ok(Principal {
            user_id: record.user_id,
            username: record.username,
            email: record.email,
        }),
        None => Err(ApiError::Unauthenticated(
            "Not authorized, no token".to_string(),
        )),
    }
}
