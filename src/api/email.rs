//! Email delivery abstractions.
//!
//! Signup and resend flows hand a composed message to an `EmailSender` before
//! answering the request. Delivery failures are logged and surfaced as a
//! warning, never as a request failure, so account creation cannot be rolled
//! back by a mail outage.
//!
//! The default sender for local dev is `LogEmailSender`, which logs and
//! returns `Ok(())`. Real delivery (SMTP, API) plugs in behind the same trait.
use anyhow::Result;
use tracing::info;

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// Email delivery abstraction used by the signup and verification flows.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error so the caller can warn.
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

/// Compose the verification email for a freshly issued token link.
#[must_use]
pub fn verification_message(to_email: &str, verify_url: &str) -> EmailMessage {
    EmailMessage {
        to_email: to_email.to_string(),
        subject: "Verify your email address".to_string(),
        body: format!(
            "Welcome! Please confirm your email address by opening the link below.\n\n\
             {verify_url}\n\n\
             The link expires in 24 hours. If you did not create this account, \
             you can ignore this message."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{EmailSender, LogEmailSender, verification_message};

    #[test]
    fn log_sender_always_succeeds() {
        let sender = LogEmailSender;
        let message = verification_message(
            "asha@example.com",
            "http://localhost:3000/verify-email?token=abc",
        );
        assert!(sender.send(&message).is_ok());
    }

    #[test]
    fn verification_message_embeds_link() {
        let message = verification_message(
            "asha@example.com",
            "http://localhost:3000/verify-email?token=abc",
        );
        assert_eq!(message.to_email, "asha@example.com");
        assert_eq!(message.subject, "Verify your email address");
        assert!(
            message
                .body
                .contains("http://localhost:3000/verify-email?token=abc")
        );
        assert!(message.body.contains("expires in 24 hours"));
    }
}
