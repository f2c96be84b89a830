//! SMTP email notifier via `lettre`.
//!
//! Port 465 uses implicit TLS, other ports use STARTTLS when TLS is enabled.
//! The sender address doubles as the SMTP login.

use std::time::Duration;

use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use hydrowatch_core::config::AlertConfig;

use crate::traits::{Notification, Notifier, NotifyError};

/// Port that speaks TLS from the first byte.
const IMPLICIT_TLS_PORT: u16 = 465;

/// Sends notifications as emails via SMTP.
#[derive(Debug)]
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Build a notifier from alert configuration.
    ///
    /// # Errors
    ///
    /// [`NotifyError::Config`] when a credential is missing, an address does
    /// not parse, or the relay host is rejected by the TLS layer.
    pub fn from_config(config: &AlertConfig) -> Result<Self, NotifyError> {
        let missing = config.missing_credentials();
        if !missing.is_empty() {
            return Err(NotifyError::Config(format!(
                "missing alert credentials: {}",
                missing.join(", ")
            )));
        }
        let sender = config.sender.as_deref().unwrap_or_default();
        let recipient = config.recipient.as_deref().unwrap_or_default();
        let password = config.password.clone().unwrap_or_default();

        let from: Mailbox = sender
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;
        let to: Mailbox = recipient
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;

        let host = config.smtp_host.as_str();
        let port = config.smtp_port;

        let builder = if config.tls && port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port)
        };

        let transport = builder
            .credentials(Credentials::new(from.email.to_string(), password))
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        Ok(Self { transport, from, to })
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    /// Send a notification email to the configured recipient.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(&notification.subject)
            .body(notification.body.clone())
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::info!(
            channel = "email",
            subject = %notification.subject,
            recipient = %self.to,
            "notification delivered"
        );

        Ok(())
    }

    /// Returns `"email"`.
    fn channel_name(&self) -> &str {
        "email"
    }
}
