// dbsnapshot/src/notify/sendgrid.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use super::{AlertMessage, Notifier};
use crate::config::NotificationConfig;
use crate::errors::NotifyError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct MailSendRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    value: &'a str,
}

impl<'a> From<&'a AlertMessage> for MailSendRequest<'a> {
    fn from(message: &'a AlertMessage) -> Self {
        MailSendRequest {
            personalizations: vec![Personalization {
                to: vec![Address { email: &message.to }],
            }],
            from: Address {
                email: &message.from,
            },
            subject: &message.subject,
            content: vec![Content {
                kind: "text/plain",
                value: &message.body,
            }],
        }
    }
}

/// Delivers alerts through the SendGrid v3 `mail/send` endpoint.
pub struct SendGridNotifier {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl SendGridNotifier {
    pub fn new(settings: &NotificationConfig) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: Client, settings: &NotificationConfig) -> Self {
        Self {
            client,
            api_key: settings.api_key.clone(),
            endpoint: settings.endpoint.clone(),
        }
    }
}

#[async_trait]
impl Notifier for SendGridNotifier {
    async fn send(&self, message: &AlertMessage) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&MailSendRequest::from(message))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::testing::settings;
    use serde_json::json;

    #[test]
    fn test_request_payload_shape() -> anyhow::Result<()> {
        let message = AlertMessage {
            to: "ops@example.com".to_string(),
            from: "backups@example.com".to_string(),
            subject: "Error occurred during database backup".to_string(),
            body: "An error occurred during the database backup:\n\nboom".to_string(),
        };

        let payload = serde_json::to_value(MailSendRequest::from(&message))?;
        assert_eq!(
            payload,
            json!({
                "personalizations": [{ "to": [{ "email": "ops@example.com" }] }],
                "from": { "email": "backups@example.com" },
                "subject": "Error occurred during database backup",
                "content": [{
                    "type": "text/plain",
                    "value": "An error occurred during the database backup:\n\nboom"
                }]
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() -> anyhow::Result<()> {
        let notifier = SendGridNotifier::new(&settings())?;
        let message = AlertMessage {
            to: "ops@example.com".to_string(),
            from: "backups@example.com".to_string(),
            subject: "subject".to_string(),
            body: "body".to_string(),
        };

        let result = notifier.send(&message).await;
        assert!(matches!(result, Err(NotifyError::Http(_))));
        Ok(())
    }
}
