pub(crate) mod sendgrid; // SendGrid v3 mail transport

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::config::NotificationConfig;
use crate::errors::NotifyError;

pub use sendgrid::SendGridNotifier;

pub const FAILURE_SUBJECT: &str = "Error occurred during database backup";

/// A single plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

/// Outbound alert transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &AlertMessage) -> Result<(), NotifyError>;
}

/// The failed cycle's cause, rendered once for the alert.
#[derive(Debug, Clone)]
pub struct FailureEvent {
    pub cause: String,
    pub occurred_at: DateTime<Utc>,
}

impl FailureEvent {
    pub fn new(cause: &dyn std::fmt::Display) -> Self {
        Self {
            cause: cause.to_string(),
            occurred_at: Utc::now(),
        }
    }
}

pub fn compose_failure_message(settings: &NotificationConfig, event: &FailureEvent) -> AlertMessage {
    AlertMessage {
        to: settings.to_email.clone(),
        from: settings.from_email.clone(),
        subject: FAILURE_SUBJECT.to_string(),
        body: format!(
            "An error occurred during the database backup:\n\n{}",
            event.cause
        ),
    }
}

/// Sends exactly one alert for `event`. Delivery errors are logged and swallowed.
pub async fn notify_failure(
    notifier: &dyn Notifier,
    settings: &NotificationConfig,
    event: FailureEvent,
) {
    let message = compose_failure_message(settings, &event);
    match notifier.send(&message).await {
        Ok(()) => info!("📧 Error email sent successfully to {}", message.to),
        Err(e) => error!(
            "❌ An error occurred while sending the error email (failure at {}): {}",
            event.occurred_at.to_rfc3339(),
            e
        ),
    }
}
