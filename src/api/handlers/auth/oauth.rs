//! Google OAuth login endpoints.
//!
//! Flow Overview:
//! 1) `google_start` plants an anti-forgery state cookie and redirects the
//!    browser to Google's consent screen.
//! 2) `google_callback` checks the state, exchanges the code for a profile,
//!    resolves or creates the account, then redirects back to the frontend
//!    with a session cookie. Provider failures redirect to the frontend
//!    login page instead of rendering an error body.

use anyhow::anyhow;
use axum::{
    extract::{Extension, Query},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{InvalidHeaderValue, LOCATION, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::super::error::ApiError;
use super::{
    session::{find_cookie, session_cookie},
    state::{AuthConfig, AuthState},
    storage::{SignupOutcome, find_user_by_google_id, insert_google_user, insert_session},
    utils::{generate_one_time_token, normalize_email},
};

const OAUTH_STATE_COOKIE_NAME: &str = "portero_oauth_state";
const OAUTH_STATE_MAX_AGE_SECONDS: i64 = 10 * 60;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/auth/google",
    responses(
        (status = 302, description = "Redirect to the Google consent screen."),
        (status = 404, description = "Google login is not configured."),
    ),
    tag = "auth"
)]
pub async fn google_start(auth_state: Extension<Arc<AuthState>>) -> Result<Response, ApiError> {
    let Some(google) = auth_state.google() else {
        return Err(ApiError::NotFound(
            "Google login is not configured".to_string(),
        ));
    };

    let state_token = generate_one_time_token()?;
    let authorize_url = google.authorize_url(&state_token)?;

    let mut headers = HeaderMap::new();
    let cookie = oauth_state_cookie(auth_state.config(), &state_token)
        .map_err(|err| anyhow!("failed to build oauth state cookie: {err}"))?;
    headers.insert(SET_COOKIE, cookie);
    headers.insert(
        LOCATION,
        HeaderValue::from_str(&authorize_url)
            .map_err(|err| anyhow!("failed to build redirect target: {err}"))?,
    );
    Ok((StatusCode::FOUND, headers).into_response())
}

#[utoipa::path(
    get,
    path = "/api/auth/google/callback",
    params(
        ("code" = Option<String>, Query, description = "Authorization code from Google"),
        ("state" = Option<String>, Query, description = "Anti-forgery state"),
        ("error" = Option<String>, Query, description = "Provider error code, if any")
    ),
    responses(
        (status = 303, description = "Redirect to the frontend; session cookie set on success."),
        (status = 404, description = "Google login is not configured."),
    ),
    tag = "auth"
)]
pub async fn google_callback(
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Response, ApiError> {
    let Some(google) = auth_state.google() else {
        return Err(ApiError::NotFound(
            "Google login is not configured".to_string(),
        ));
    };
    let config = auth_state.config();

    if let Some(provider_error) = query.error.as_deref() {
        warn!("Google login denied: {provider_error}");
        return failure_redirect(config);
    }

    // The state param must match the cookie planted by google_start.
    let expected_state = find_cookie(&headers, OAUTH_STATE_COOKIE_NAME);
    let presented_state = query.state.as_deref().unwrap_or_default();
    if presented_state.is_empty() || expected_state.as_deref() != Some(presented_state) {
        warn!("Google login state mismatch");
        return failure_redirect(config);
    }

    let Some(code) = query.code.as_deref().filter(|code| !code.is_empty()) else {
        warn!("Google login callback without code");
        return failure_redirect(config);
    };

    let access_token = match google.exchange_code(code).await {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to exchange oauth code: {err}");
            return failure_redirect(config);
        }
    };
    let profile = match google.fetch_userinfo(&access_token).await {
        Ok(profile) => profile,
        Err(err) => {
            error!("Failed to fetch userinfo: {err}");
            return failure_redirect(config);
        }
    };

    let Some(email) = profile
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|email| !email.is_empty())
    else {
        warn!("Google profile without email");
        return failure_redirect(config);
    };

    let user_id = match find_user_by_google_id(&pool, &profile.id).await? {
        Some(user_id) => user_id,
        None => {
            let username = profile
                .name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(&email)
                .to_string();
            match insert_google_user(&pool, &username, &email, &profile.id).await? {
                SignupOutcome::Created { user_id } => {
                    info!("Google account created: {username}");
                    user_id
                }
                SignupOutcome::Conflict(_) => {
                    // An unlinked account already holds this email or
                    // username; no silent link-up is attempted.
                    warn!("Google signup conflicts with an existing account");
                    return failure_redirect(config);
                }
            }
        }
    };

    let ttl_seconds = config.session_ttl_seconds();
    let token = insert_session(&pool, user_id, ttl_seconds).await?;
    let cookie = session_cookie(&auth_state, &token)
        .map_err(|err| anyhow!("failed to build session cookie: {err}"))?;

    let mut response_headers = redirect_headers(config, "/")?;
    response_headers.append(SET_COOKIE, cookie);
    Ok((StatusCode::SEE_OTHER, response_headers).into_response())
}

/// Redirect to the frontend login page, clearing the state cookie.
fn failure_redirect(config: &AuthConfig) -> Result<Response, ApiError> {
    let headers = redirect_headers(config, "/login")?;
    Ok((StatusCode::SEE_OTHER, headers).into_response())
}

fn redirect_headers(config: &AuthConfig, path: &str) -> Result<HeaderMap, ApiError> {
    let base = config.frontend_base_url().trim_end_matches('/');
    let mut headers = HeaderMap::new();
    headers.insert(
        LOCATION,
        HeaderValue::from_str(&format!("{base}{path}"))
            .map_err(|err| anyhow!("failed to build redirect target: {err}"))?,
    );
    let cookie = clear_oauth_state_cookie(config)
        .map_err(|err| anyhow!("failed to build oauth state cookie: {err}"))?;
    headers.insert(SET_COOKIE, cookie);
    Ok(headers)
}

/// Short-lived `HttpOnly` cookie carrying the anti-forgery state.
fn oauth_state_cookie(
    config: &AuthConfig,
    state: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = config.session_cookie_secure();
    let mut cookie = format!(
        "{OAUTH_STATE_COOKIE_NAME}={state}; Path=/; HttpOnly; SameSite=Lax; \
         Max-Age={OAUTH_STATE_MAX_AGE_SECONDS}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_oauth_state_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = config.session_cookie_secure();
    let mut cookie =
        format!("{OAUTH_STATE_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}
