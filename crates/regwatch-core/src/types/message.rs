//! Rendered message content and provider receipts.

use serde::{Deserialize, Serialize};

use super::subscription::Channel;

/// Channel-ready content. Email needs all three fields, WhatsApp needs `text`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl MessageContent {
    pub fn email(subject: impl Into<String>, html: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            html: Some(html.into()),
            text: Some(text.into()),
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self {
            subject: None,
            html: None,
            text: Some(body.into()),
        }
    }
}

/// Acknowledgement returned by a provider for an accepted message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderReceipt {
    pub channel: Channel,
    pub provider_message_id: Option<String>,
}
