//! Twilio WhatsApp client.
//!
//! Thin wrapper over the Messages API. Credentials are optional; an
//! unconfigured client is still constructed so the send endpoint can report
//! the failure instead of the server refusing to start.

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Client as HttpClient;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::fmt;
use tracing::error;

use crate::APP_USER_AGENT;

const API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// Account credentials and the WhatsApp sender number (E.164, without the
/// `whatsapp:` prefix).
pub struct TwilioConfig {
    account_sid: String,
    auth_token: SecretString,
    whatsapp_number: String,
}

impl TwilioConfig {
    #[must_use]
    pub fn new(account_sid: String, auth_token: SecretString, whatsapp_number: String) -> Self {
        Self {
            account_sid,
            auth_token,
            whatsapp_number,
        }
    }
}

impl fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"***")
            .field("whatsapp_number", &self.whatsapp_number)
            .finish()
    }
}

#[derive(Debug)]
pub struct Client {
    config: Option<TwilioConfig>,
    http: HttpClient,
}

impl Client {
    pub fn new(config: Option<TwilioConfig>) -> Result<Self> {
        let http = HttpClient::builder()
            .user_agent(APP_USER_AGENT)
            .build()
            .context("failed to build http client")?;
        Ok(Self { config, http })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Send a WhatsApp message and return the Twilio message sid.
    pub async fn send_whatsapp(&self, to: &str, body: &str) -> Result<String> {
        let Some(config) = &self.config else {
            bail!("Twilio credentials are not configured");
        };

        let params = [
            ("From", whatsapp_address(&config.whatsapp_number)),
            ("To", whatsapp_address(to)),
            ("Body", body.to_string()),
        ];

        let response = self
            .http
            .post(messages_url(&config.account_sid))
            .basic_auth(&config.account_sid, Some(config.auth_token.expose_secret()))
            .form(&params)
            .send()
            .await
            .context("failed to request message send")?;

        if !response.status().is_success() {
            let status = response.status();
            let json_response: Value = response
                .json()
                .await
                .context("failed to decode twilio error response")?;
            let error_message = twilio_error_message(&json_response);
            error!("Failed to send WhatsApp message: {error_message}");
            return Err(anyhow!("{status}, {error_message}"));
        }

        let json_response: Value = response
            .json()
            .await
            .context("failed to decode twilio response")?;

        json_response
            .get("sid")
            .and_then(Value::as_str)
            .map_or_else(
                || {
                    error!("Failed to send WhatsApp message, no sid in response");
                    Err(anyhow!("Failed to send WhatsApp message"))
                },
                |sid| Ok(sid.to_string()),
            )
    }
}

fn messages_url(account_sid: &str) -> String {
    format!("{API_BASE}/Accounts/{account_sid}/Messages.json")
}

fn whatsapp_address(number: &str) -> String {
    format!("whatsapp:{number}")
}

fn twilio_error_message(json_response: &Value) -> &str {
    json_response
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
}
