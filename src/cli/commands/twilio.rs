use clap::{Arg, ArgGroup, Command};

pub const ARG_TWILIO_ACCOUNT_SID: &str = "twilio-account-sid";
pub const ARG_TWILIO_AUTH_TOKEN: &str = "twilio-auth-token";
pub const ARG_TWILIO_WHATSAPP_NUMBER: &str = "twilio-whatsapp-number";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TWILIO_ACCOUNT_SID)
                .long(ARG_TWILIO_ACCOUNT_SID)
                .help("Twilio account SID")
                .env("PORTERO_TWILIO_ACCOUNT_SID"),
        )
        .arg(
            Arg::new(ARG_TWILIO_AUTH_TOKEN)
                .long(ARG_TWILIO_AUTH_TOKEN)
                .help("Twilio auth token")
                .env("PORTERO_TWILIO_AUTH_TOKEN"),
        )
        .arg(
            Arg::new(ARG_TWILIO_WHATSAPP_NUMBER)
                .long(ARG_TWILIO_WHATSAPP_NUMBER)
                .help("WhatsApp sender number in E.164 format, for example +14155238886")
                .env("PORTERO_TWILIO_WHATSAPP_NUMBER"),
        )
        .group(
            ArgGroup::new("twilio")
                .args([
                    ARG_TWILIO_ACCOUNT_SID,
                    ARG_TWILIO_AUTH_TOKEN,
                    ARG_TWILIO_WHATSAPP_NUMBER,
                ])
                .multiple(true),
        )
}
