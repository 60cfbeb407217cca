//! Email delivery abstraction.
//!
//! Registration and password reset send their emails inline with the request:
//! the flow writes its state, attempts delivery, and on failure runs a
//! compensating action that undoes the state it just wrote. There is no
//! outbox or retry loop; a failed delivery surfaces to the caller as a
//! delivery error after the rollback.
//!
//! The default sender for local dev is [`LogEmailSender`], which logs and
//! returns `Ok(())`. Production deployments plug in a real sender (SMTP, API)
//! behind the same trait.

use anyhow::Result;
use std::future::Future;
use tracing::{error, info};

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// Email delivery abstraction used by the auth flows.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error so the flow can compensate.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            body = %message.body,
            "email send stub"
        );
        Ok(())
    }
}

/// Attempt delivery; on failure run the compensating action, then surface the
/// delivery error. A failed compensation is logged but does not mask the
/// delivery failure.
pub(crate) async fn send_or_compensate<C, Fut>(
    sender: &dyn EmailSender,
    message: &EmailMessage,
    compensate: C,
) -> Result<()>
where
    C: FnOnce() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let Err(send_err) = sender.send(message) else {
        return Ok(());
    };
    error!("Failed to send email to {}: {send_err}", message.to_email);
    if let Err(undo_err) = compensate().await {
        error!("Failed to roll back after delivery failure: {undo_err}");
    }
    Err(send_err)
}
