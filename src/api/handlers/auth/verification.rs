//! Email verification endpoint.

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use tracing::info;

use super::super::error::ApiError;
use super::{
    storage::consume_verification_token, types::MessageResponse, utils::hash_one_time_token,
};

#[utoipa::path(
    get,
    path = "/api/auth/verify-email/{token}",
    params(
        ("token" = String, Path, description = "One-time verification token from the email link")
    ),
    responses(
        (status = 200, description = "Email verified; login unblocked.", body = MessageResponse),
        (status = 400, description = "Token unknown or already consumed."),
    ),
    tag = "auth"
)]
pub async fn verify_email(
    Path(token): Path<String>,
    pool: Extension<PgPool>,
) -> Result<Response, ApiError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::Validation(
            "Invalid or expired verification token.".to_string(),
        ));
    }

    // The lookup runs on the hash; a token matches at most once.
    let token_hash = hash_one_time_token(token);
    if !consume_verification_token(&pool, &token_hash).await? {
        return Err(ApiError::Validation(
            "Invalid or expired verification token.".to_string(),
        ));
    }

    info!("Email verified");
    let body = MessageResponse {
        message: "Email verified successfully. You can now log in.".to_string(),
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn blank_token_is_rejected_without_touching_the_database() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool");
        let result = verify_email(Path("   ".to_string()), Extension(pool)).await;
        let err = result.err().expect("blank token should be rejected");
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
