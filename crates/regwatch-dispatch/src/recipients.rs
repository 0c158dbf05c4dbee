//! Recipient resolution: unit members entitled to a channel's notifications.
//!
//! A missing subscription row means subscribed for email and unsubscribed
//! for WhatsApp. Members without a usable address are skipped silently.

use regwatch_core::error::Result;
use regwatch_core::traits::ComplianceStore;
use regwatch_core::types::{Channel, Member, Recipient, Subscription};
use std::sync::Arc;

/// `local@domain` with exactly one `@`, no whitespace, and a dotted domain.
pub fn is_valid_email(raw: &str) -> bool {
    let addr = raw.trim();
    let mut parts = addr.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !addr.chars().any(char::is_whitespace)
}

/// 8 to 15 digits once `+`, spaces, dashes and parentheses are removed.
pub fn is_valid_phone(raw: &str) -> bool {
    let digits = regwatch_channels::whatsapp::normalize_phone(raw);
    (8..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

fn usable(channel: Channel, address: &str) -> bool {
    match channel {
        Channel::Email => is_valid_email(address),
        Channel::WhatsApp => is_valid_phone(address),
    }
}

/// Pick the address for one member given their (optional) subscription row.
pub fn address_for(channel: Channel, member: &Member, subscription: Option<&Subscription>) -> Option<String> {
    let candidate = match subscription {
        Some(sub) if !sub.is_subscribed => return None,
        Some(sub) => {
            let own = sub.address.as_deref().map(str::trim).filter(|a| !a.is_empty());
            match channel {
                Channel::Email => own.or(member.email.as_deref()),
                Channel::WhatsApp => own,
            }
        }
        None if channel.default_subscribed() => match channel {
            Channel::Email => member.email.as_deref(),
            Channel::WhatsApp => None,
        },
        None => return None,
    }?;

    let candidate = candidate.trim();
    usable(channel, candidate).then(|| candidate.to_string())
}

pub struct RecipientResolver {
    store: Arc<dyn ComplianceStore>,
}

impl RecipientResolver {
    pub fn new(store: Arc<dyn ComplianceStore>) -> Self {
        Self { store }
    }

    /// Members of `unit_id` who should receive `channel` notifications, in
    /// membership order. Fails only when membership itself cannot be read.
    pub async fn resolve(&self, unit_id: &str, channel: Channel) -> Result<Vec<Recipient>> {
        let members = self.store.unit_members(unit_id).await?;
        let mut recipients = Vec::with_capacity(members.len());

        for member in &members {
            let subscription = match self.store.subscription(&member.user_id, unit_id, channel).await {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("Skipping {} on {channel}: subscription lookup failed: {e}", member.user_id);
                    continue;
                }
            };

            match address_for(channel, member, subscription.as_ref()) {
                Some(address) => recipients.push(Recipient {
                    user_id: member.user_id.clone(),
                    name: member.full_name.clone(),
                    address,
                }),
                None => tracing::debug!("{} not reachable on {channel} for unit {unit_id}", member.user_id),
            }
        }

        tracing::debug!("{} of {} member(s) of {unit_id} reachable on {channel}", recipients.len(), members.len());
        Ok(recipients)
    }
}
