//! Database helpers for accounts, one-time tokens and sessions.

use anyhow::{Context, Result, anyhow};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::utils::{generate_session_token, hash_session_token, is_unique_violation};

/// Outcome when attempting to create a new account.
#[derive(Debug)]
pub(super) enum SignupOutcome {
    Created { user_id: Uuid },
    Conflict(ConflictField),
}

/// Which unique column rejected an account insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ConflictField {
    Username,
    Email,
}

/// Map a unique violation to the offending column via the constraint name.
/// Anything other than the username constraint counts as an email conflict.
fn conflict_field(err: &sqlx::Error) -> ConflictField {
    match err.as_database_error().and_then(|db| db.constraint()) {
        Some("users_username_key") => ConflictField::Username,
        _ => ConflictField::Email,
    }
}

/// Fields needed to authenticate a login attempt.
pub(super) struct LoginRow {
    pub(super) user_id: Uuid,
    pub(super) username: String,
    pub(super) email: String,
    pub(super) password_hash: Option<String>,
    pub(super) google_id: Option<String>,
    pub(super) is_verified: bool,
}

/// Minimal data returned for a valid session cookie.
pub(crate) struct SessionRecord {
    pub(crate) user_id: Uuid,
    pub(crate) username: String,
    pub(crate) email: String,
}

/// Create a local account with an unconsumed verification token hash.
/// A duplicate email or username surfaces as [`SignupOutcome::Conflict`].
pub(super) async fn insert_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
    verification_token_hash: &[u8],
) -> Result<SignupOutcome> {
    let query = r"
        INSERT INTO users
            (username, email, password_hash, verification_token_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(verification_token_hash)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(SignupOutcome::Created {
            user_id: row.get("id"),
        }),
        Err(err) if is_unique_violation(&err) => Ok(SignupOutcome::Conflict(conflict_field(&err))),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

/// Create an account from a Google profile. These accounts are verified from
/// the start and carry no password hash.
pub(super) async fn insert_google_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    google_id: &str,
) -> Result<SignupOutcome> {
    let query = r"
        INSERT INTO users
            (username, email, google_id, is_verified)
        VALUES ($1, $2, $3, true)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(email)
        .bind(google_id)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(SignupOutcome::Created {
            user_id: row.get("id"),
        }),
        Err(err) if is_unique_violation(&err) => Ok(SignupOutcome::Conflict(conflict_field(&err))),
        Err(err) => Err(err).context("failed to insert google user"),
    }
}

/// Compensating delete for a freshly created account whose verification email
/// could not be delivered.
pub(super) async fn delete_user(pool: &PgPool, user_id: Uuid) -> Result<bool> {
    let query = "DELETE FROM users WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete user")?;
    Ok(result.rows_affected() > 0)
}

/// Look up login data by username.
pub(super) async fn find_user_for_login(
    pool: &PgPool,
    username: &str,
) -> Result<Option<LoginRow>> {
    let query = r"
        SELECT id, username, email, password_hash, google_id, is_verified
        FROM users
        WHERE username = $1
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user for login")?;

    Ok(row.map(|row| LoginRow {
        user_id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        google_id: row.get("google_id"),
        is_verified: row.get("is_verified"),
    }))
}

pub(super) async fn find_user_by_google_id(
    pool: &PgPool,
    google_id: &str,
) -> Result<Option<Uuid>> {
    let query = "SELECT id FROM users WHERE google_id = $1 LIMIT 1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(google_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by google id")?;
    Ok(row.map(|row| row.get("id")))
}

/// Mark the account holding this token hash as verified and clear the token
/// in the same statement, so a token can only ever be consumed once.
pub(super) async fn consume_verification_token(pool: &PgPool, token_hash: &[u8]) -> Result<bool> {
    let query = r"
        UPDATE users
        SET is_verified = true,
            verification_token_hash = NULL,
            updated_at = NOW()
        WHERE verification_token_hash = $1
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to consume verification token")?;

    Ok(row.is_some())
}

/// Attach a reset token hash and its expiry to the account behind an email.
/// Returns the account id, or `None` when no account has that email.
pub(super) async fn set_password_reset_token(
    pool: &PgPool,
    email: &str,
    token_hash: &[u8],
    ttl_seconds: i64,
) -> Result<Option<Uuid>> {
    let query = r"
        UPDATE users
        SET password_reset_token_hash = $2,
            password_reset_expires_at = NOW() + ($3 * INTERVAL '1 second'),
            updated_at = NOW()
        WHERE email = $1
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(token_hash)
        .bind(ttl_seconds)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to set password reset token")?;
    Ok(row.map(|row| row.get("id")))
}

/// Compensating clear for a reset token whose email could not be delivered.
pub(super) async fn clear_password_reset_token(pool: &PgPool, user_id: Uuid) -> Result<()> {
    let query = r"
        UPDATE users
        SET password_reset_token_hash = NULL,
            password_reset_expires_at = NULL,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to clear password reset token")?;
    Ok(())
}

/// Find the account holding an unexpired reset token hash.
pub(super) async fn find_user_by_reset_token(
    pool: &PgPool,
    token_hash: &[u8],
) -> Result<Option<Uuid>> {
    let query = r"
        SELECT id
        FROM users
        WHERE password_reset_token_hash = $1
          AND password_reset_expires_at > NOW()
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup user by reset token")?;
    Ok(row.map(|row| row.get("id")))
}

/// Store the new password hash and clear the reset token. Proving control of
/// the email also marks the account verified.
pub(super) async fn complete_password_reset(
    pool: &PgPool,
    user_id: Uuid,
    password_hash: &str,
) -> Result<()> {
    let query = r"
        UPDATE users
        SET password_hash = $2,
            password_reset_token_hash = NULL,
            password_reset_expires_at = NULL,
            is_verified = true,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(password_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to complete password reset")?;
    Ok(())
}

pub(super) async fn insert_session(
    pool: &PgPool,
    user_id: Uuid,
    ttl_seconds: i64,
) -> Result<String> {
    // Generate a random token, store only its hash, and return the raw value
    // so the caller can set the session cookie.
    let query = r"
        INSERT INTO user_sessions (user_id, token_hash, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );

    for _ in 0..3 {
        let token = generate_session_token()?;
        let token_hash = hash_session_token(&token);
        let result = sqlx::query(query)
            .bind(user_id)
            .bind(token_hash)
            .bind(ttl_seconds)
            .execute(pool)
            .instrument(span.clone())
            .await;

        match result {
            Ok(_) => return Ok(token),
            Err(err) if is_unique_violation(&err) => {}
            Err(err) => return Err(err).context("failed to insert session"),
        }
    }

    Err(anyhow!("failed to generate unique session token"))
}

pub(super) async fn lookup_session(
    pool: &PgPool,
    token_hash: &[u8],
) -> Result<Option<SessionRecord>> {
    // Only accept unexpired sessions.
    let query = r"
        SELECT users.id, users.username, users.email
        FROM user_sessions
        JOIN users ON users.id = user_sessions.user_id
        WHERE user_sessions.token_hash = $1
          AND user_sessions.expires_at > NOW()
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session")?;

    if row.is_none() {
        return Ok(None);
    }

    // Record activity for audit/visibility without extending the session TTL.
    let query = r"
        UPDATE user_sessions
        SET last_seen_at = NOW()
        WHERE token_hash = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update session last_seen_at")?;

    Ok(row.map(|row| SessionRecord {
        user_id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
    }))
}

pub(super) async fn delete_session(pool: &PgPool, token_hash: &[u8]) -> Result<()> {
    // Logout is idempotent; it's fine if no rows are deleted.
    let query = "DELETE FROM user_sessions WHERE token_hash = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete session")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ConflictField, LoginRow, SessionRecord, SignupOutcome, conflict_field};
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;
    use uuid::Uuid;

    #[derive(Debug)]
    struct TestDbError {
        constraint: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23505"))
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn signup_outcome_debug_names() {
        let created = SignupOutcome::Created {
            user_id: Uuid::nil(),
        };
        assert!(format!("{created:?}").starts_with("Created"));
        assert_eq!(
            format!("{:?}", SignupOutcome::Conflict(ConflictField::Email)),
            "Conflict(Email)"
        );
    }

    #[test]
    fn conflict_field_follows_constraint_name() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            constraint: Some("users_username_key"),
        }));
        assert_eq!(conflict_field(&err), ConflictField::Username);

        let err = sqlx::Error::Database(Box::new(TestDbError {
            constraint: Some("users_email_key"),
        }));
        assert_eq!(conflict_field(&err), ConflictField::Email);

        let err = sqlx::Error::Database(Box::new(TestDbError { constraint: None }));
        assert_eq!(conflict_field(&err), ConflictField::Email);
    }

    #[test]
    fn login_row_holds_values() {
        let row = LoginRow {
            user_id: Uuid::nil(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: Some("hash".to_string()),
            google_id: None,
            is_verified: true,
        };
        assert_eq!(row.user_id, Uuid::nil());
        assert_eq!(row.username, "alice");
        assert_eq!(row.email, "alice@example.com");
        assert_eq!(row.password_hash.as_deref(), Some("hash"));
        assert!(row.google_id.is_none());
        assert!(row.is_verified);
    }

    #[test]
    fn session_record_holds_values() {
        let record = SessionRecord {
            user_id: Uuid::nil(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
        };
        assert_eq!(record.user_id, Uuid::nil());
        assert_eq!(record.username, "alice");
        assert_eq!(record.email, "alice@example.com");
    }
}
