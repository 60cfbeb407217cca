//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub confirm_password: String,
}

/// Standard `{ "message": ... }` body shared by most endpoints, including
/// error responses.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

/// Public view of an account. Credential material never leaves the database.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub google_id: Option<String>,
    pub is_verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CurrentUserResponse {
    pub user: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn register_request_round_trips() -> Result<()> {
        let request = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "pw1".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let email = value
            .get("email")
            .and_then(serde_json::Value::as_str)
            .context("missing email")?;
        assert_eq!(email, "alice@example.com");
        let decoded: RegisterRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.username, "alice");
        Ok(())
    }

    #[test]
    fn reset_password_request_round_trips() -> Result<()> {
        let request = ResetPasswordRequest {
            password: "new-password".to_string(),
            confirm_password: "new-password".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let decoded: ResetPasswordRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.password, decoded.confirm_password);
        Ok(())
    }

    #[test]
    fn user_response_keeps_optional_google_id() -> Result<()> {
        let user = UserResponse {
            id: "5f4c9f1e-0000-0000-0000-000000000000".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            google_id: None,
            is_verified: true,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
        };
        let value = serde_json::to_value(&user)?;
        assert!(value.get("google_id").is_some_and(serde_json::Value::is_null));
        let decoded: UserResponse = serde_json::from_value(value)?;
        assert!(decoded.is_verified);
        Ok(())
    }
}
