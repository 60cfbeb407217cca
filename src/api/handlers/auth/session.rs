//! Session endpoints: login, logout and the current-user lookup.

use anyhow::anyhow;
use axum::{
    Json,
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{InvalidHeaderValue, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use super::super::{error::ApiError, users::fetch_user_response};
use super::{
    credential::{AuthAttempt, Credential},
    state::AuthState,
    storage::{SessionRecord, delete_session, find_user_for_login, insert_session, lookup_session},
    types::{CurrentUserResponse, LoginRequest, LoginResponse, MessageResponse},
    utils::hash_session_token,
};

const SESSION_COOKIE_NAME: &str = "portero_session";

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set.", body = LoginResponse),
        (status = 400, description = "Missing or incorrect credentials."),
        (status = 401, description = "Account email not verified yet."),
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Response, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let username = request.username.trim();
    let password = request.password.as_str();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::Validation("Missing credentials".to_string()));
    }

    let Some(row) = find_user_for_login(&pool, username).await? else {
        return Err(ApiError::InvalidCredentials(
            "Password or username are incorrect".to_string(),
        ));
    };

    let authenticated = Credential::from_columns(row.password_hash, row.google_id)
        .is_some_and(|credential| credential.authenticate(&AuthAttempt::Password(password)));
    if !authenticated {
        return Err(ApiError::InvalidCredentials(
            "Password or username are incorrect".to_string(),
        ));
    }

    // A correct password is not enough until the email has been verified.
    if !row.is_verified {
        return Err(ApiError::Unauthenticated(
            "Please verify your email before logging in.".to_string(),
        ));
    }

    let ttl_seconds = auth_state.config().session_ttl_seconds();
    let token = insert_session(&pool, row.user_id, ttl_seconds).await?;
    let cookie = session_cookie(&auth_state, &token)
        .map_err(|err| anyhow!("failed to build session cookie: {err}"))?;

    let Some(user) = fetch_user_response(&pool, row.user_id).await? else {
        return Err(ApiError::Infrastructure(anyhow!(
            "user row missing after login"
        )));
    };

    info!("User logged in: {}", row.username);

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    let body = LoginResponse {
        message: "Logged in successfully".to_string(),
        user,
    };
    Ok((StatusCode::OK, headers, Json(body)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Session cleared.", body = MessageResponse),
        (status = 500, description = "Session store unreachable."),
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_session_token(&headers) {
        let token_hash = hash_session_token(&token);
        delete_session(&pool, &token_hash).await?;
    }

    // Always clear the cookie, even if the session record was missing.
    let mut response_headers = HeaderMap::new();
    let cookie = clear_session_cookie(auth_state.config())
        .map_err(|err| anyhow!("failed to build session cookie: {err}"))?;
    response_headers.insert(SET_COOKIE, cookie);

    let body = MessageResponse {
        message: "Logged out successfully".to_string(),
    };
    Ok((StatusCode::OK, response_headers, Json(body)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/auth/current-user",
    responses(
        (status = 200, description = "Account bound to the session cookie.", body = CurrentUserResponse),
        (status = 401, description = "No valid session."),
    ),
    tag = "auth"
)]
pub async fn current_user(
    headers: HeaderMap,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    let Some(record) = authenticate_session(&headers, &pool).await? else {
        return Err(ApiError::Unauthenticated("Not authenticated".to_string()));
    };

    let Some(user) = fetch_user_response(&pool, record.user_id).await? else {
        return Err(ApiError::Infrastructure(anyhow!(
            "user row missing for active session"
        )));
    };

    Ok((StatusCode::OK, Json(CurrentUserResponse { user })).into_response())
}

/// Resolve a session cookie into a session record, if present.
///
/// Returns `Ok(None)` when the cookie is missing or does not match an
/// unexpired session.
pub(crate) async fn authenticate_session(
    headers: &HeaderMap,
    pool: &PgPool,
) -> Result<Option<SessionRecord>, ApiError> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };
    // Only the hash is stored; never compare raw tokens against the database.
    let token_hash = hash_session_token(&token);
    Ok(lookup_session(pool, &token_hash).await?)
}

/// Build the `HttpOnly` cookie carrying the raw session token.
pub(super) fn session_cookie(
    auth_state: &AuthState,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = auth_state.config().session_ttl_seconds();
    // Only mark cookies secure when the service is served over HTTPS.
    let secure = auth_state.config().session_cookie_secure();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(
    auth_config: &super::state::AuthConfig,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = auth_config.session_cookie_secure();
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Pull the raw session token out of the request cookies.
/// Sessions travel in cookies only; there is no bearer-token surface.
pub(super) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    find_cookie(headers, SESSION_COOKIE_NAME)
}

/// Find a cookie by name in the request headers.
/// Pairs without a `=` are skipped rather than ending the scan.
pub(super) fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if let (Some(key), Some(val)) = (parts.next(), parts.next()) {
            if key.trim() == name {
                return Some(val.trim().to_string());
            }
        }
    }
    None
}
