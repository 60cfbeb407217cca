//! Password reset: request a reset link, then redeem it.
//!
//! Flow Overview:
//! 1) `forgot_password` attaches a hashed, expiring reset token to the
//!    account and emails the raw token as a link. Delivery failure clears
//!    the token again.
//! 2) `reset_password` redeems an unexpired token, stores the new password
//!    hash and clears the token so it cannot be replayed.

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use super::super::error::ApiError;
use super::{
    password::hash_password,
    state::AuthState,
    storage::{
        clear_password_reset_token, complete_password_reset, find_user_by_reset_token,
        set_password_reset_token,
    },
    types::{ForgotPasswordRequest, MessageResponse, ResetPasswordRequest},
    utils::{
        build_password_reset_url, generate_one_time_token, hash_one_time_token, normalize_email,
    },
};
use crate::api::email::{EmailMessage, send_or_compensate};

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email sent.", body = MessageResponse),
        (status = 404, description = "No account with that email."),
        (status = 500, description = "Reset email could not be sent; token cleared again."),
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> Result<Response, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let email = normalize_email(&request.email);
    if email.is_empty() {
        return Err(ApiError::Validation("Missing required fields".to_string()));
    }

    let token = generate_one_time_token()?;
    let token_hash = hash_one_time_token(&token);
    let ttl_seconds = auth_state.config().reset_token_ttl_seconds();

    let Some(user_id) = set_password_reset_token(&pool, &email, &token_hash, ttl_seconds).await?
    else {
        return Err(ApiError::NotFound(
            "No user found with that email address.".to_string(),
        ));
    };

    let reset_url = build_password_reset_url(auth_state.config().public_base_url(), &token);
    let message = EmailMessage {
        to_email: email.clone(),
        subject: "Password Reset Request".to_string(),
        body: format!(
            "You are receiving this because you (or someone else) has requested the reset of a \
             password. Please click on this link to reset your password: {reset_url}. This link \
             will expire in {} minutes.",
            ttl_seconds / 60
        ),
    };

    // Delivery failure clears the token that was just set.
    let delivered = send_or_compensate(auth_state.email_sender(), &message, || async {
        clear_password_reset_token(&pool, user_id).await
    })
    .await;
    if delivered.is_err() {
        return Err(ApiError::Delivery(
            "Error sending password reset email. Please try again.".to_string(),
        ));
    }

    info!("Password reset email sent");
    let body = MessageResponse {
        message: "Password reset email sent successfully.".to_string(),
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password/{token}",
    params(
        ("token" = String, Path, description = "One-time reset token from the email link")
    ),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced; token cleared.", body = MessageResponse),
        (status = 400, description = "Token invalid/expired or passwords do not match."),
    ),
    tag = "auth"
)]
pub async fn reset_password(
    Path(token): Path<String>,
    pool: Extension<PgPool>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> Result<Response, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    // Token validity is checked before the passwords so a stale link fails
    // the same way regardless of the body.
    let token_hash = hash_one_time_token(token.trim());
    let Some(user_id) = find_user_by_reset_token(&pool, &token_hash).await? else {
        return Err(ApiError::Validation(
            "Invalid or expired password reset token.".to_string(),
        ));
    };

    if request.password != request.confirm_password {
        return Err(ApiError::Validation("Passwords do not match.".to_string()));
    }
    if request.password.is_empty() {
        return Err(ApiError::Validation("Missing required fields".to_string()));
    }

    let password_hash = hash_password(&request.password)?;
    complete_password_reset(&pool, user_id, &password_hash).await?;

    info!("Password reset completed");
    let body = MessageResponse {
        message: "Password has been reset successfully.".to_string(),
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogEmailSender;
    use crate::api::handlers::auth::state::AuthConfig;
    use sqlx::postgres::PgPoolOptions;

    fn auth_state() -> Arc<AuthState> {
        let config = AuthConfig::new(
            "http://localhost:5000".to_string(),
            "http://localhost:3000".to_string(),
        );
        Arc::new(AuthState::new(config, Arc::new(LogEmailSender), None))
    }

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool")
    }

    #[tokio::test]
    async fn forgot_password_without_payload_is_rejected() {
        let result = forgot_password(Extension(lazy_pool()), Extension(auth_state()), None).await;
        let err = result.err().expect("missing payload should be rejected");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn forgot_password_with_blank_email_is_rejected() {
        let payload = Json(ForgotPasswordRequest {
            email: "   ".to_string(),
        });
        let result = forgot_password(
            Extension(lazy_pool()),
            Extension(auth_state()),
            Some(payload),
        )
        .await;
        let err = result.err().expect("blank email should be rejected");
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn reset_password_without_payload_is_rejected() {
        let result = reset_password(Path("token".to_string()), Extension(lazy_pool()), None).await;
        let err = result.err().expect("missing payload should be rejected");
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
