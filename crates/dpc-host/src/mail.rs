//! # Host Operator Notifications
//!
//! Mail transports for the donation notification. The commerce platform
//! usually owns mail delivery, so the default transport hands the message to
//! an HTTP mail relay; without one configured the message is only logged.

use async_trait::async_trait;
use dpc_core::{
    DeliveryChannel, DonationNotifier, NotificationMessage, ReconcileError, ReconcileResult,
};
use reqwest::Client;
use tracing::{error, info, instrument};

/// Posts notification messages as JSON (`{to, subject, body}`) to a relay
pub struct HttpMailRelay {
    client: Client,
    relay_url: String,
    /// Optional bearer token for the relay
    token: Option<String>,
}

impl HttpMailRelay {
    pub fn new(client: Client, relay_url: impl Into<String>) -> Self {
        Self {
            client,
            relay_url: relay_url.into(),
            token: None,
        }
    }

    /// Builder: authenticate against the relay
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Create from `DPC_MAIL_RELAY_URL` / `DPC_MAIL_RELAY_TOKEN`, if set
    pub fn from_env(client: Client) -> Option<Self> {
        let url = std::env::var("DPC_MAIL_RELAY_URL").ok()?;
        if url.trim().is_empty() {
            return None;
        }
        let relay = Self::new(client, url.trim());
        Some(match std::env::var("DPC_MAIL_RELAY_TOKEN") {
            Ok(token) if !token.is_empty() => relay.with_token(token),
            _ => relay,
        })
    }
}

#[async_trait]
impl DonationNotifier for HttpMailRelay {
    #[instrument(skip(self, message), fields(to = %message.to))]
    async fn notify(&self, message: &NotificationMessage) -> ReconcileResult<()> {
        check_recipient(message)?;

        let mut request = self.client.post(&self.relay_url).json(message);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReconcileError::delivery(DeliveryChannel::Mail, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Mail relay error: status={}, body={}", status, body);
            return Err(ReconcileError::delivery(
                DeliveryChannel::Mail,
                format!("HTTP {}: {}", status, body),
            ));
        }

        info!("Sent donation notification: subject={}", message.subject);
        Ok(())
    }
}

/// Logs notifications instead of sending them
pub struct LoggingNotifier;

#[async_trait]
impl DonationNotifier for LoggingNotifier {
    async fn notify(&self, message: &NotificationMessage) -> ReconcileResult<()> {
        check_recipient(message)?;
        info!(
            "Donation notification (not sent): to={}, subject={}\n{}",
            message.to, message.subject, message.body
        );
        Ok(())
    }
}

fn check_recipient(message: &NotificationMessage) -> ReconcileResult<()> {
    let to = message.to.trim();
    let valid = match to.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };
    if !valid {
        return Err(ReconcileError::delivery(
            DeliveryChannel::Mail,
            format!("Invalid recipient address: {:?}", message.to),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message(to: &str) -> NotificationMessage {
        NotificationMessage {
            to: to.to_string(),
            subject: "shop_example_com: Books".to_string(),
            body: "Order ID: 1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_relay_posts_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(header("Authorization", "Bearer relay-token"))
            .and(body_json(json!({
                "to": "host@host.example",
                "subject": "shop_example_com: Books",
                "body": "Order ID: 1"
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let relay = HttpMailRelay::new(Client::new(), format!("{}/send", server.uri()))
            .with_token("relay-token");
        relay.notify(&message("host@host.example")).await.unwrap();
    }

    #[tokio::test]
    async fn test_relay_failure_is_delivery_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let relay = HttpMailRelay::new(Client::new(), server.uri());
        let err = relay.notify(&message("host@host.example")).await.unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Delivery {
                channel: DeliveryChannel::Mail,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_invalid_recipient_rejected() {
        assert!(LoggingNotifier.notify(&message("")).await.is_err());
        assert!(LoggingNotifier.notify(&message("not-an-email")).await.is_err());
        assert!(LoggingNotifier.notify(&message("host@host.example")).await.is_ok());
    }
}
