use axum::{Json, http::StatusCode, response::IntoResponse};

use super::auth::types::MessageResponse;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service banner", body = MessageResponse),
    ),
    tag = "root"
)]
pub async fn root() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(MessageResponse {
            message: "Backend server is running".to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::body::to_bytes;
    use serde_json::Value;

    #[tokio::test]
    async fn banner_reports_the_server_is_running() -> Result<()> {
        let response = root().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let json: Value = serde_json::from_slice(&body)?;
        assert_eq!(json["message"], "Backend server is running");
        Ok(())
    }
}
