//! Fail-soft alert delivery.
//!
//! The dispatcher makes exactly one delivery attempt per alert and reports
//! what happened as an [`AlertOutcome`]. Missing credentials and delivery
//! failures are logged, never returned as errors, so ingestion is never
//! blocked by alerting.

use std::time::Instant;

use serde::Serialize;

use hydrowatch_core::config::AlertConfig;

use crate::email::EmailNotifier;
use crate::traits::{Notification, Notifier};

/// Result of a single alert delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlertOutcome {
    Sent,
    /// Alerting is not configured.
    Skipped { reason: String },
    Failed { reason: String },
}

impl AlertOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            AlertOutcome::Sent => "sent",
            AlertOutcome::Skipped { .. } => "skipped",
            AlertOutcome::Failed { .. } => "failed",
        }
    }
}

enum Channel {
    Ready(Box<dyn Notifier>),
    Unconfigured { missing: Vec<&'static str> },
    /// Credentials are present but could not be turned into a transport.
    Invalid { reason: String },
}

pub struct AlertDispatcher {
    channel: Channel,
    subject: String,
}

impl AlertDispatcher {
    /// Build from configuration. Never fails: incomplete credentials make an
    /// unconfigured dispatcher, unusable ones make every send fail.
    pub fn from_config(config: &AlertConfig) -> Self {
        let missing = config.missing_credentials();
        let channel = if !missing.is_empty() {
            tracing::warn!(
                missing = %missing.join(", "),
                "alert credentials incomplete, anomaly emails will be skipped"
            );
            Channel::Unconfigured { missing }
        } else {
            match EmailNotifier::from_config(config) {
                Ok(notifier) => Channel::Ready(Box::new(notifier)),
                Err(e) => {
                    tracing::error!(error = %e, "alert channel could not be configured");
                    Channel::Invalid { reason: e.to_string() }
                }
            }
        };
        Self {
            channel,
            subject: config.subject.clone(),
        }
    }

    /// Dispatcher delivering through an arbitrary channel.
    pub fn with_notifier(notifier: Box<dyn Notifier>, subject: impl Into<String>) -> Self {
        Self {
            channel: Channel::Ready(notifier),
            subject: subject.into(),
        }
    }

    /// Dispatcher that skips every alert.
    pub fn disabled() -> Self {
        Self {
            channel: Channel::Unconfigured {
                missing: vec!["SENDER_EMAIL", "RECEIVER_EMAIL", "EMAIL_PASSWORD"],
            },
            subject: AlertConfig::default().subject,
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self.channel, Channel::Ready(_))
    }

    /// Attempt to deliver `report` once.
    pub async fn send(&self, report: &str) -> AlertOutcome {
        let notifier = match &self.channel {
            Channel::Ready(notifier) => notifier,
            Channel::Unconfigured { missing } => {
                let reason = format!("alerting unconfigured, missing {}", missing.join(", "));
                tracing::warn!(%reason, "alert skipped");
                return AlertOutcome::Skipped { reason };
            }
            Channel::Invalid { reason } => {
                tracing::warn!(%reason, "alert not sent, channel invalid");
                return AlertOutcome::Failed { reason: reason.clone() };
            }
        };

        let notification = Notification {
            subject: self.subject.clone(),
            body: report.to_string(),
        };

        let start = Instant::now();
        let result = notifier.send(&notification).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                tracing::info!(
                    channel = notifier.channel_name(),
                    duration_ms,
                    "Alert delivered"
                );
                AlertOutcome::Sent
            }
            Err(e) => {
                tracing::warn!(
                    channel = notifier.channel_name(),
                    error = %e,
                    duration_ms,
                    "Alert delivery failed"
                );
                AlertOutcome::Failed { reason: e.to_string() }
            }
        }
    }
}

impl std::fmt::Debug for AlertDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let channel = match &self.channel {
            Channel::Ready(n) => n.channel_name().to_string(),
            Channel::Unconfigured { .. } => "unconfigured".to_string(),
            Channel::Invalid { .. } => "invalid".to_string(),
        };
        f.debug_struct("AlertDispatcher")
            .field("channel", &channel)
            .field("subject", &self.subject)
            .finish()
    }
}
