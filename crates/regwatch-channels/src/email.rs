//! Email channel: transactional email provider over HTTPS.
//!
//! One `POST` per message with a bearer API key. The provider answers with
//! `{"id": "..."}` on success.

use async_trait::async_trait;
use regwatch_core::SendError;
use regwatch_core::config::EmailConfig;
use regwatch_core::traits::ChannelSender;
use regwatch_core::types::{Channel, MessageContent, ProviderReceipt};

pub struct EmailSender {
    config: EmailConfig,
    client: reqwest::Client,
}

impl EmailSender {
    pub fn new(config: EmailConfig) -> Self {
        Self { config, client: crate::http_client() }
    }

    fn required<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str, SendError> {
        field
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| SendError::InvalidContent(format!("email requires {name}")))
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn channel(&self) -> Channel { Channel::Email }

    fn is_configured(&self) -> bool { self.config.is_configured() }

    async fn send(&self, address: &str, content: &MessageContent) -> Result<ProviderReceipt, SendError> {
        if !self.is_configured() {
            return Err(SendError::NotConfigured("email".into()));
        }
        let (Some(api_key), Some(from)) = (&self.config.api_key, &self.config.from) else {
            return Err(SendError::NotConfigured("email".into()));
        };

        let to = address.trim();
        if to.is_empty() {
            return Err(SendError::InvalidAddress("empty email address".into()));
        }
        let subject = Self::required(&content.subject, "a subject")?;
        let html = Self::required(&content.html, "an HTML body")?;
        let text = Self::required(&content.text, "a plain-text body")?;

        let body = serde_json::json!({
            "from": from,
            "to": [to],
            "subject": subject,
            "html": html,
            "text": text,
        });

        let response = self.client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SendError::Network(format!("Email send failed: {e}")))?;

        if !response.status().is_success() {
            return Err(crate::rejection(response).await);
        }

        let json: serde_json::Value = response.json().await.unwrap_or_default();
        let provider_message_id = json["id"].as_str().map(String::from);
        tracing::debug!("Email accepted for {to} (id={provider_message_id:?})");

        Ok(ProviderReceipt { channel: Channel::Email, provider_message_id })
    }
}
