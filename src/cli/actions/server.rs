use crate::{api, google, twilio};
use anyhow::Result;
use secrecy::SecretString;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub public_base_url: String,
    pub frontend_base_url: String,
    pub session_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
    pub google: Option<GoogleArgs>,
    pub twilio: Option<TwilioArgs>,
}

#[derive(Debug)]
pub struct GoogleArgs {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_url: String,
}

#[derive(Debug)]
pub struct TwilioArgs {
    pub account_sid: String,
    pub auth_token: SecretString,
    pub whatsapp_number: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if an outbound client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {args:?}");

    let auth_config =
        api::handlers::auth::AuthConfig::new(args.public_base_url, args.frontend_base_url)
            .with_session_ttl_seconds(args.session_ttl_seconds)
            .with_reset_token_ttl_seconds(args.reset_token_ttl_seconds);

    let google = match args.google {
        Some(oauth) => {
            let config = google::OAuthConfig::new(
                oauth.client_id,
                oauth.client_secret,
                oauth.redirect_url,
            );
            Some(google::Client::new(config)?)
        }
        None => None,
    };

    let twilio = twilio::Client::new(args.twilio.map(|sender| {
        twilio::TwilioConfig::new(sender.account_sid, sender.auth_token, sender.whatsapp_number)
    }))?;

    let result = api::new(args.port, args.dsn, auth_config, google, twilio).await;

    // Flush any spans still buffered by the exporter before the process exits.
    crate::cli::telemetry::shutdown_tracer();

    result
}
