use clap::{Arg, ArgGroup, Command};

pub const ARG_GOOGLE_CLIENT_ID: &str = "google-client-id";
pub const ARG_GOOGLE_CLIENT_SECRET: &str = "google-client-secret";
pub const ARG_GOOGLE_REDIRECT_URL: &str = "google-redirect-url";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_GOOGLE_CLIENT_ID)
                .long(ARG_GOOGLE_CLIENT_ID)
                .help("Google OAuth client id")
                .env("PORTERO_GOOGLE_CLIENT_ID"),
        )
        .arg(
            Arg::new(ARG_GOOGLE_CLIENT_SECRET)
                .long(ARG_GOOGLE_CLIENT_SECRET)
                .help("Google OAuth client secret")
                .env("PORTERO_GOOGLE_CLIENT_SECRET"),
        )
        .arg(
            Arg::new(ARG_GOOGLE_REDIRECT_URL)
                .long(ARG_GOOGLE_REDIRECT_URL)
                .help("Redirect URL registered for the Google OAuth client")
                .env("PORTERO_GOOGLE_REDIRECT_URL"),
        )
        .group(
            ArgGroup::new("google")
                .args([
                    ARG_GOOGLE_CLIENT_ID,
                    ARG_GOOGLE_CLIENT_SECRET,
                    ARG_GOOGLE_REDIRECT_URL,
                ])
                .multiple(true),
        )
}
