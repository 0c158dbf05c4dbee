//! WhatsApp Business channel: Cloud API text messages.
//!
//! `POST {api_url}/{phone_number_id}/messages` with the access token as
//! bearer and the account API key as `X-API-Key`. Numbers go out in
//! international form without the leading `+`.

use async_trait::async_trait;
use regwatch_core::SendError;
use regwatch_core::config::WhatsAppConfig;
use regwatch_core::traits::ChannelSender;
use regwatch_core::types::{Channel, MessageContent, ProviderReceipt};

pub struct WhatsAppSender {
    config: WhatsAppConfig,
    client: reqwest::Client,
}

impl WhatsAppSender {
    pub fn new(config: WhatsAppConfig) -> Self {
        Self { config, client: crate::http_client() }
    }

    fn messages_url(&self, phone_number_id: &str) -> String {
        format!("{}/{}/messages", self.config.api_url.trim_end_matches('/'), phone_number_id)
    }
}

/// Strip the leading `+` and common separators from a phone number.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect()
}

#[async_trait]
impl ChannelSender for WhatsAppSender {
    fn channel(&self) -> Channel { Channel::WhatsApp }

    fn is_configured(&self) -> bool { self.config.is_configured() }

    async fn send(&self, address: &str, content: &MessageContent) -> Result<ProviderReceipt, SendError> {
        if !self.is_configured() {
            return Err(SendError::NotConfigured("whatsapp".into()));
        }
        let (Some(api_key), Some(phone_number_id), Some(token)) = (
            &self.config.api_key,
            &self.config.phone_number_id,
            &self.config.access_token,
        ) else {
            return Err(SendError::NotConfigured("whatsapp".into()));
        };

        let text = content
            .text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| SendError::InvalidContent("whatsapp requires a text body".into()))?;

        let to = normalize_phone(address);
        if to.is_empty() || !to.chars().all(|c| c.is_ascii_digit()) {
            return Err(SendError::InvalidAddress(format!("not a phone number: {address}")));
        }

        let body = serde_json::json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "text",
            "text": { "preview_url": false, "body": text },
        });

        let response = self.client
            .post(self.messages_url(phone_number_id))
            .bearer_auth(token)
            .header("X-API-Key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SendError::Network(format!("WhatsApp send failed: {e}")))?;

        if !response.status().is_success() {
            return Err(crate::rejection(response).await);
        }

        let json: serde_json::Value = response.json().await.unwrap_or_default();
        let provider_message_id = json["messages"][0]["id"].as_str().map(String::from);
        tracing::debug!("WhatsApp accepted for {to} (id={provider_message_id:?})");

        Ok(ProviderReceipt { channel: Channel::WhatsApp, provider_message_id })
    }
}
