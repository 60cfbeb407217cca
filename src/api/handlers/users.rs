//! User management endpoints.
//!
//! Flow Overview:
//! 1) Authenticate the request via session cookie.
//! 2) Perform list, read, update or delete on the requested account.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::principal::require_auth;
use super::auth::types::{MessageResponse, UserResponse};
use super::error::ApiError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserUpdateRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserUpdateResponse {
    pub message: String,
    pub user: UserResponse,
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All accounts.", body = [UserResponse]),
        (status = 401, description = "Missing or invalid session cookie."),
    ),
    tag = "users"
)]
pub async fn list_users(
    headers: HeaderMap,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    require_auth(&headers, &pool).await?;

    let users = fetch_user_summaries(&pool).await?;
    Ok((StatusCode::OK, Json(users)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Account detail.", body = UserResponse),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "User not found."),
    ),
    tag = "users"
)]
pub async fn get_user(
    Path(id): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    require_auth(&headers, &pool).await?;

    let user_id = parse_user_id(&id)?;
    let Some(user) = fetch_user_response(&pool, user_id).await? else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };
    Ok((StatusCode::OK, Json(user)).into_response())
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "Account updated.", body = UserUpdateResponse),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "User not found."),
    ),
    tag = "users"
)]
pub async fn update_user(
    Path(id): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    payload: Option<Json<UserUpdateRequest>>,
) -> Result<Response, ApiError> {
    require_auth(&headers, &pool).await?;

    let user_id = parse_user_id(&id)?;
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let username = normalize_optional(request.username);
    let email = normalize_optional(request.email).map(|email| email.to_lowercase());

    let Some(user) = update_user_record(&pool, user_id, username, email).await? else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    let body = UserUpdateResponse {
        message: "User updated successfully".to_string(),
        user,
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Account removed (or was already gone).", body = MessageResponse),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 404, description = "Malformed user id."),
    ),
    tag = "users"
)]
pub async fn delete_user(
    Path(id): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    require_auth(&headers, &pool).await?;

    let user_id = parse_user_id(&id)?;
    // Deletion is idempotent; removing an already-missing account still
    // reports success.
    delete_user_record(&pool, user_id).await?;

    let body = MessageResponse {
        message: "User removed".to_string(),
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}

/// Malformed ids map to 404 so probing with garbage looks the same as
/// probing with unknown ids.
fn parse_user_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id.trim()).map_err(|_| ApiError::NotFound("User not found".to_string()))
}

async fn fetch_user_summaries(pool: &PgPool) -> Result<Vec<UserResponse>, sqlx::Error> {
    let query = r#"
        SELECT
            id::text AS id,
            username,
            email,
            google_id,
            is_verified,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
            to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
        FROM users
        ORDER BY created_at DESC
    "#;
    let rows = sqlx::query(query).fetch_all(pool).await?;
    Ok(rows.into_iter().map(|row| user_from_row(&row)).collect())
}

/// Public account view for one user id. Shared with the login and
/// current-user endpoints.
pub(crate) async fn fetch_user_response(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<UserResponse>, sqlx::Error> {
    let query = r#"
        SELECT
            id::text AS id,
            username,
            email,
            google_id,
            is_verified,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
            to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
        FROM users
        WHERE id = $1
        LIMIT 1
    "#;
    let row = sqlx::query(query).bind(user_id).fetch_optional(pool).await?;
    Ok(row.map(|row| user_from_row(&row)))
}

async fn update_user_record(
    pool: &PgPool,
    user_id: Uuid,
    username: Option<String>,
    email: Option<String>,
) -> Result<Option<UserResponse>, sqlx::Error> {
    let query = r#"
        UPDATE users
        SET
            username = COALESCE($1, username),
            email = COALESCE($2, email),
            updated_at = NOW()
        WHERE id = $3
        RETURNING
            id::text AS id,
            username,
            email,
            google_id,
            is_verified,
            to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
            to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
    "#;
    let row = sqlx::query(query)
        .bind(username)
        .bind(email)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| user_from_row(&row)))
}

async fn delete_user_record(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let query = "DELETE FROM users WHERE id = $1";
    let result = sqlx::query(query).bind(user_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> UserResponse {
    UserResponse {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        google_id: row.get("google_id"),
        is_verified: row.get("is_verified"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool")
    }

    #[test]
    fn normalize_optional_trims_and_drops_empties() {
        assert_eq!(
            normalize_optional(Some("  alice  ".to_string())),
            Some("alice".to_string())
        );
        assert_eq!(normalize_optional(Some("   ".to_string())), None);
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn parse_user_id_maps_garbage_to_not_found() {
        assert!(parse_user_id("5f4c9f1e-0000-0000-0000-000000000000").is_ok());
        let err = parse_user_id("not-a-uuid").err().expect("garbage id");
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_users_requires_session() {
        let result = list_users(HeaderMap::new(), Extension(lazy_pool())).await;
        let err = result.err().expect("missing session should be rejected");
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn get_user_requires_session() {
        let result = get_user(
            Path("5f4c9f1e-0000-0000-0000-000000000000".to_string()),
            HeaderMap::new(),
            Extension(lazy_pool()),
        )
        .await;
        let err = result.err().expect("missing session should be rejected");
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn delete_user_requires_session() {
        let result = delete_user(
            Path("5f4c9f1e-0000-0000-0000-000000000000".to_string()),
            HeaderMap::new(),
            Extension(lazy_pool()),
        )
        .await;
        let err = result.err().expect("missing session should be rejected");
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }
}
