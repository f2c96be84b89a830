//! Alert delivery for anomalous telemetry.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable delivery channels
//! - SMTP email notifier
//! - Minijinja rendering of the plain-text anomaly report
//! - `AlertDispatcher`, which attempts a single fail-soft delivery per alert

pub mod dispatcher;
pub mod email;
pub mod templating;
pub mod traits;

pub use dispatcher::{AlertDispatcher, AlertOutcome};
pub use templating::AlertReport;
pub use traits::{Notification, Notifier, NotifyError};
