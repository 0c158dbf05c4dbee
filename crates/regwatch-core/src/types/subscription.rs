//! Channels, per-channel subscriptions and unit membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outbound notification medium.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    WhatsApp,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::WhatsApp => "whatsapp",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "email" => Some(Channel::Email),
            "whatsapp" => Some(Channel::WhatsApp),
            _ => None,
        }
    }

    /// Whether a member with no subscription row may still be notified.
    /// Email is opt-out, WhatsApp is opt-in.
    pub fn default_subscribed(&self) -> bool {
        match self {
            Channel::Email => true,
            Channel::WhatsApp => false,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's subscription to one channel for one unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subscription {
    pub user_id: String,
    pub unit_id: String,
    pub channel: Channel,
    pub is_subscribed: bool,
    /// Email address or phone number, depending on `channel`.
    pub address: Option<String>,
    pub subscribed_at: Option<DateTime<Utc>>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

/// A user belonging to a unit, with their profile fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub user_id: String,
    pub unit_id: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// A resolved (user, address) pair for one channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipient {
    pub user_id: String,
    pub name: Option<String>,
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_defaults_differ() {
        assert!(Channel::Email.default_subscribed());
        assert!(!Channel::WhatsApp.default_subscribed());
    }

    #[test]
    fn test_channel_parse_and_display() {
        assert_eq!(Channel::parse("WhatsApp"), Some(Channel::WhatsApp));
        assert_eq!(Channel::parse("sms"), None);
        assert_eq!(Channel::Email.to_string(), "email");
        assert_eq!(serde_json::to_string(&Channel::WhatsApp).unwrap(), "\"whatsapp\"");
    }
}
