//! Google OAuth 2.0 client.
//!
//! Covers the three legs the login flow needs: building the consent URL,
//! exchanging the authorization code for an access token and fetching the
//! userinfo profile.

use anyhow::{Context, Result, anyhow};
use reqwest::Client as HttpClient;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use tracing::error;
use url::Url;

use crate::APP_USER_AGENT;

const AUTHORIZE_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// OAuth application credentials and the callback this service registered.
pub struct OAuthConfig {
    client_id: String,
    client_secret: SecretString,
    redirect_url: String,
}

impl OAuthConfig {
    #[must_use]
    pub fn new(client_id: String, client_secret: SecretString, redirect_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_url,
        }
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("redirect_url", &self.redirect_url)
            .finish()
    }
}

/// Profile fields returned by the userinfo endpoint.
#[derive(Debug, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug)]
pub struct Client {
    config: OAuthConfig,
    http: HttpClient,
}

impl Client {
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .context("failed to build http client")?;
        Ok(Self { config, http })
    }

    /// Consent screen URL carrying our callback and the anti-forgery state.
    pub fn authorize_url(&self, state: &str) -> Result<String> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("response_type", "code"),
            ("scope", "profile email"),
            ("state", state),
        ];
        let url = Url::parse_with_params(AUTHORIZE_ENDPOINT, params)
            .context("failed to build authorize url")?;
        Ok(url.into())
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&params)
            .send()
            .await
            .context("failed to request oauth token")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_message = error_message_from_response(response).await;
            error!("Failed to exchange oauth code: {error_message}");
            return Err(anyhow!("{status}, {error_message}"));
        }

        let payload: TokenResponse = response
            .json()
            .await
            .context("failed to decode oauth token response")?;
        Ok(payload.access_token)
    }

    /// Fetch the Google profile behind an access token.
    pub async fn fetch_userinfo(&self, access_token: &str) -> Result<UserProfile> {
        let response = self
            .http
            .get(USERINFO_ENDPOINT)
            .bearer_auth(access_token)
            .send()
            .await
            .context("failed to request userinfo")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_message = error_message_from_response(response).await;
            error!("Failed to fetch userinfo: {error_message}");
            return Err(anyhow!("{status}, {error_message}"));
        }

        let profile: UserProfile = response
            .json()
            .await
            .context("failed to decode userinfo response")?;
        if profile.id.is_empty() {
            return Err(anyhow!("userinfo response missing subject id"));
        }
        Ok(profile)
    }
}

async fn error_message_from_response(response: reqwest::Response) -> String {
    match response.json::<Value>().await {
        Ok(value) => error_message_from_value(&value),
        Err(_) => "unknown error".to_string(),
    }
}

/// Pull `error`/`error_description` out of an OAuth error body.
fn error_message_from_value(value: &Value) -> String {
    let code = value.get("error").and_then(Value::as_str);
    let description = value.get("error_description").and_then(Value::as_str);
    match (code, description) {
        (Some(code), Some(description)) => format!("{code}: {description}"),
        (Some(code), None) => code.to_string(),
        (None, Some(description)) => description.to_string(),
        (None, None) => "unknown error".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> OAuthConfig {
        OAuthConfig::new(
            "client-id".to_string(),
            SecretString::from("client-secret".to_string()),
            "http://localhost:5000/api/auth/google/callback".to_string(),
        )
    }

    #[test]
    fn debug_masks_client_secret() {
        let debug = format!("{:?}", config());
        assert!(debug.contains("client-id"));
        assert!(debug.contains("***"));
        assert!(!debug.contains("client-secret"));
    }

    #[test]
    fn authorize_url_carries_params() {
        let client = Client::new(config()).expect("client should build");
        let url = client.authorize_url("state123").expect("url should build");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state=state123"));
        assert!(url.contains("scope=profile+email"));
        assert!(
            url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A5000%2Fapi%2Fauth%2Fgoogle%2Fcallback")
        );
    }

    #[test]
    fn error_message_prefers_code_and_description() {
        let value = json!({"error": "invalid_grant", "error_description": "Bad code"});
        assert_eq!(error_message_from_value(&value), "invalid_grant: Bad code");

        let value = json!({"error": "invalid_grant"});
        assert_eq!(error_message_from_value(&value), "invalid_grant");

        let value = json!({"unrelated": true});
        assert_eq!(error_message_from_value(&value), "unknown error");
    }

    #[test]
    fn token_response_decodes() {
        let payload: TokenResponse =
            serde_json::from_value(json!({"access_token": "ya29.token", "token_type": "Bearer"}))
                .expect("token response should decode");
        assert_eq!(payload.access_token, "ya29.token");
    }

    #[test]
    fn user_profile_tolerates_missing_optional_fields() {
        let profile: UserProfile = serde_json::from_value(json!({"id": "subject-1"}))
            .expect("profile should decode");
        assert_eq!(profile.id, "subject-1");
        assert!(profile.email.is_none());
        assert!(profile.name.is_none());
    }
}
