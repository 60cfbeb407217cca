//! Error taxonomy for the HTTP surface.
//!
//! Business-rule failures carry a stable client-facing message; unexpected
//! failures are logged and collapse into a generic 500 so internals never
//! leak to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use super::auth::types::MessageResponse;

#[derive(Debug)]
pub enum ApiError {
    /// Bad or missing input.
    Validation(String),
    /// Uniqueness violation when creating an account.
    Conflict(String),
    /// Login rejected without revealing which part was wrong.
    InvalidCredentials(String),
    /// No valid session, or a login blocked on verification.
    Unauthenticated(String),
    NotFound(String),
    /// Downstream delivery failed; any state written for it was rolled back.
    Delivery(String),
    /// Store or provider unreachable.
    Infrastructure(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(message)
            | Self::Conflict(message)
            | Self::InvalidCredentials(message) => (StatusCode::BAD_REQUEST, message),
            Self::Unauthenticated(message) => (StatusCode::UNAUTHORIZED, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Delivery(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
            Self::Infrastructure(err) => {
                error!("Request failed: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server Error".to_string(),
                )
            }
        };
        (status, Json(MessageResponse { message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Infrastructure(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Infrastructure(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn statuses_match_taxonomy() {
        let cases = [
            (
                ApiError::Validation("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Conflict("dup".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::InvalidCredentials("no".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Unauthenticated("no".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::NotFound("gone".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Delivery("email".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Infrastructure(anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn sqlx_errors_become_infrastructure() {
        let err = ApiError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, ApiError::Infrastructure(_)));
    }
}
