use std::fmt;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
    message::{Mailbox, Message, header::ContentType},
    transport::smtp::authentication::Credentials,
    transport::smtp::client::{Tls, TlsParameters},
};
use log::info;

use crate::digest::Digest;
use crate::error::GlanceError;

/// Everything needed to open one authenticated SMTP session. Lives only for a send.
#[derive(Clone)]
pub struct EmailCredentials {
    pub sender: String,
    pub password: String,
    pub receiver: String,
    pub smtp_host: String,
    pub smtp_port: u16,
}

impl fmt::Debug for EmailCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailCredentials")
            .field("sender", &self.sender)
            .field("password", &"***")
            .field("receiver", &self.receiver)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingEmail {
    pub fn new(credentials: &EmailCredentials, digest: Digest) -> Self {
        Self {
            from: credentials.sender.clone(),
            to: credentials.receiver.clone(),
            subject: digest.subject,
            body: digest.body,
        }
    }

    pub fn to_message(&self) -> Result<Message, GlanceError> {
        let from = self
            .from
            .parse::<Mailbox>()
            .map_err(|e| GlanceError::input(format!("Invalid sender email '{}': {e}", self.from)))?;
        let to = self
            .to
            .parse::<Mailbox>()
            .map_err(|e| GlanceError::input(format!("Invalid receiver email '{}': {e}", self.to)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(self.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(self.body.clone())
            .map_err(GlanceError::delivery)
    }
}

/// Delivers exactly one message per call. No retries.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        credentials: &EmailCredentials,
        email: &OutgoingEmail,
    ) -> Result<(), GlanceError>;
}

/// SMTP submission with a required STARTTLS upgrade and LOGIN/PLAIN auth.
#[derive(Debug, Clone, Default)]
pub struct SmtpMailer;

impl SmtpMailer {
    fn transport(
        credentials: &EmailCredentials,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, GlanceError> {
        let tls = TlsParameters::new(credentials.smtp_host.clone()).map_err(GlanceError::delivery)?;

        Ok(
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(credentials.smtp_host.as_str())
                .port(credentials.smtp_port)
                .tls(Tls::Required(tls))
                .credentials(Credentials::new(
                    credentials.sender.clone(),
                    credentials.password.clone(),
                ))
                .build(),
        )
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(
        &self,
        credentials: &EmailCredentials,
        email: &OutgoingEmail,
    ) -> Result<(), GlanceError> {
        let message = email.to_message()?;
        let mailer = Self::transport(credentials)?;

        mailer.send(message).await.map_err(GlanceError::delivery)?;
        info!(
            "Sent \"{}\" to {} via {}:{}",
            email.subject, email.to, credentials.smtp_host, credentials.smtp_port
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::digest::format_digest;

    fn credentials() -> EmailCredentials {
        EmailCredentials {
            sender: "me@example.com".into(),
            password: "secret".into(),
            receiver: "you@example.com".into(),
            smtp_host: "127.0.0.1".into(),
            smtp_port: 2525,
        }
    }

    fn email() -> OutgoingEmail {
        let digest = format_digest(
            "Weather in London: light rain, Temperature: 15.2°C, Humidity: 80%",
            "No news articles found.",
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        );
        OutgoingEmail::new(&credentials(), digest)
    }

    #[test]
    fn outgoing_email_addresses_follow_credentials() {
        let email = email();
        assert_eq!(email.from, "me@example.com");
        assert_eq!(email.to, "you@example.com");
        assert_eq!(email.subject, "Daily Weather & News Update - 2026-10-19");
    }

    #[test]
    fn message_carries_headers() {
        let formatted = String::from_utf8(email().to_message().unwrap().formatted()).unwrap();
        assert!(formatted.contains("From: me@example.com"));
        assert!(formatted.contains("To: you@example.com"));
        assert!(formatted.contains("Subject: Daily Weather & News Update - 2026-10-19"));
        assert!(formatted.contains("Content-Type: text/plain"));
    }

    #[test]
    fn bad_address_is_an_input_error() {
        let mut email = email();
        email.to = "not an address".into();
        let err = email.to_message().unwrap_err();
        assert!(matches!(err, GlanceError::Input(_)));
        assert!(err.to_string().contains("not an address"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_delivery_error() {
        // Nothing listens on port 1 locally, so the connect fails fast.
        let mut creds = credentials();
        creds.smtp_port = 1;

        let err = SmtpMailer.send(&creds, &email()).await.unwrap_err();

        assert!(matches!(err, GlanceError::Delivery(_)));
        assert!(err.to_string().starts_with("Failed to send email: "));
    }

    #[test]
    fn debug_output_masks_password() {
        assert!(!format!("{:?}", credentials()).contains("secret"));
    }
}
