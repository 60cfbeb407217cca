//! WhatsApp send endpoint.
//!
//! Relays one message through Twilio. No retries and no delivery-status
//! tracking; the caller gets whatever outcome the provider reported.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use super::auth::principal::require_auth;
use super::error::ApiError;
use crate::twilio;

#[derive(Debug, Deserialize, ToSchema)]
pub struct WhatsAppSendRequest {
    pub to: String,
    pub body: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WhatsAppSendResponse {
    pub success: bool,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/api/whatsapp/send",
    request_body = WhatsAppSendRequest,
    responses(
        (status = 200, description = "Message handed to the provider.", body = WhatsAppSendResponse),
        (status = 400, description = "Missing recipient or body.", body = WhatsAppSendResponse),
        (status = 401, description = "Missing or invalid session cookie."),
        (status = 500, description = "Provider rejected the message.", body = WhatsAppSendResponse),
    ),
    tag = "whatsapp"
)]
pub async fn send_message(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    twilio: Extension<Arc<twilio::Client>>,
    payload: Option<Json<WhatsAppSendRequest>>,
) -> Result<Response, ApiError> {
    require_auth(&headers, &pool).await?;

    let (to, body) = match payload.as_ref() {
        Some(Json(request)) => (request.to.trim(), request.body.trim()),
        None => ("", ""),
    };
    if to.is_empty() || body.is_empty() {
        return Ok(send_outcome(
            StatusCode::BAD_REQUEST,
            false,
            "Recipient number and message body are required",
        ));
    }

    match twilio.send_whatsapp(to, body).await {
        Ok(sid) => {
            info!("WhatsApp message sent to {to}: {sid}");
            Ok(send_outcome(
                StatusCode::OK,
                true,
                "WhatsApp message sent successfully",
            ))
        }
        Err(err) => {
            error!("Error sending WhatsApp message: {err:#}");
            Ok(send_outcome(
                StatusCode::INTERNAL_SERVER_ERROR,
                false,
                "Failed to send WhatsApp message",
            ))
        }
    }
}

fn send_outcome(status: StatusCode, success: bool, message: &str) -> Response {
    let body = WhatsAppSendResponse {
        success,
        message: message.to_string(),
    };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::body::to_bytes;
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool")
    }

    fn twilio_client() -> Arc<twilio::Client> {
        Arc::new(twilio::Client::new(None).expect("client"))
    }

    #[tokio::test]
    async fn send_requires_session() {
        let payload = WhatsAppSendRequest {
            to: "+5215512345678".to_string(),
            body: "hola".to_string(),
        };
        let result = send_message(
            HeaderMap::new(),
            Extension(lazy_pool()),
            Extension(twilio_client()),
            Some(Json(payload)),
        )
        .await;
        let err = result.err().expect("missing session should be rejected");
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn bad_request_outcome_carries_success_false() -> Result<()> {
        let response = send_outcome(
            StatusCode::BAD_REQUEST,
            false,
            "Recipient number and message body are required",
        );
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let json: Value = serde_json::from_slice(&body)?;
        assert_eq!(json["success"], false);
        assert_eq!(
            json["message"],
            "Recipient number and message body are required"
        );
        Ok(())
    }

    #[tokio::test]
    async fn success_outcome_carries_success_true() -> Result<()> {
        let response = send_outcome(StatusCode::OK, true, "WhatsApp message sent successfully");
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await?;
        let json: Value = serde_json::from_slice(&body)?;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "WhatsApp message sent successfully");
        Ok(())
    }
}
