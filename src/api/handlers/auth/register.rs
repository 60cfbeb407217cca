//! Account registration with email verification.
//!
//! Flow Overview:
//! 1) Validate and normalize the requested username/email/password.
//! 2) Create the account with a hashed one-time verification token.
//! 3) Send the verification link; if delivery fails, delete the account
//!    again and report a delivery error.

use axum::{
    Json,
    extract::Extension,
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
    storage::{ConflictField, SignupOutcome, delete_user, insert_user},
    types::{MessageResponse, RegisterRequest},
    utils::{
        build_verification_url, generate_one_time_token, hash_one_time_token, normalize_email,
        valid_email,
    },
};
use crate::api::email::{EmailMessage, send_or_compensate};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created; verification email sent.", body = MessageResponse),
        (status = 400, description = "Invalid input or email already registered."),
        (status = 500, description = "Verification email could not be sent; account rolled back."),
    ),
    tag = "auth"
)]
pub async fn register(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<Response, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::Validation("Missing payload".to_string()));
    };

    let username = request.username.trim();
    let email = normalize_email(&request.email);
    let password = request.password.as_str();

    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ApiError::Validation("Missing required fields".to_string()));
    }
    if !valid_email(&email) {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }

    let password_hash = hash_password(password)?;
    // Raw token goes into the email link; only its hash is stored.
    let token = generate_one_time_token()?;
    let token_hash = hash_one_time_token(&token);

    let user_id = match insert_user(&pool, username, &email, &password_hash, &token_hash).await? {
        SignupOutcome::Created { user_id } => user_id,
        SignupOutcome::Conflict(field) => {
            return Err(ApiError::Conflict(conflict_message(field).to_string()));
        }
    };

    let verification_url = build_verification_url(auth_state.config().public_base_url(), &token);
    let message = EmailMessage {
        to_email: email.clone(),
        subject: "Email Verification".to_string(),
        body: format!("Please verify your email by clicking on this link: {verification_url}"),
    };

    // Delivery failure rolls the freshly created account back.
    let delivered = send_or_compensate(auth_state.email_sender(), &message, || async {
        delete_user(&pool, user_id).await.map(|_| ())
    })
    .await;
    if delivered.is_err() {
        return Err(ApiError::Delivery(
            "Error sending verification email. Please try again.".to_string(),
        ));
    }

    info!("User registered: {username}");

    let body = MessageResponse {
        message: "User registered successfully. Please check your email for verification."
            .to_string(),
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// Conflict copy names the column that rejected the insert.
fn conflict_message(field: ConflictField) -> &'static str {
    match field {
        ConflictField::Username => "A user with the given username is already registered",
        ConflictField::Email => "User with that email already exists",
    }
}
