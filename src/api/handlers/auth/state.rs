//! Auth state and configuration.

use std::sync::Arc;

use crate::api::email::EmailSender;
use crate::google;

const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_RESET_TOKEN_TTL_SECONDS: i64 = 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    public_base_url: String,
    frontend_base_url: String,
    session_ttl_seconds: i64,
    reset_token_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(public_base_url: String, frontend_base_url: String) -> Self {
        Self {
            public_base_url,
            frontend_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            reset_token_ttl_seconds: DEFAULT_RESET_TOKEN_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_reset_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_token_ttl_seconds = seconds;
        self
    }

    /// Base URL this service is reachable at. Verification and reset links in
    /// outbound emails point here.
    pub(crate) fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    /// Base URL of the browser frontend. Used for the CORS allow-origin and
    /// as the target of OAuth redirects.
    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(super) fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    pub(super) fn reset_token_ttl_seconds(&self) -> i64 {
        self.reset_token_ttl_seconds
    }

    pub(super) fn session_cookie_secure(&self) -> bool {
        self.public_base_url.starts_with("https://")
    }
}

pub struct AuthState {
    config: AuthConfig,
    email_sender: Arc<dyn EmailSender>,
    google: Option<google::Client>,
}

impl AuthState {
    pub fn new(
        config: AuthConfig,
        email_sender: Arc<dyn EmailSender>,
        google: Option<google::Client>,
    ) -> Self {
        Self {
            config,
            email_sender,
            google,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(super) fn email_sender(&self) -> &dyn EmailSender {
        self.email_sender.as_ref()
    }

    /// Google OAuth client, absent when the deployment has no OAuth
    /// credentials configured.
    pub(super) fn google(&self) -> Option<&google::Client> {
        self.google.as_ref()
    }
}
