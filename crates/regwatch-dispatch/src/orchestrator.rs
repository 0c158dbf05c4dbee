//! Dispatch orchestration: the per-event send loop.
//!
//! Per event: resolve recipients on each routed channel, then send to them
//! one at a time with a fixed gap, logging every attempt. A due reminder is
//! marked sent only if at least one delivery succeeded. Failures never
//! leave the event: they become log rows and counters.

use chrono::{NaiveDate, Utc};
use regwatch_channels::{SendThrottle, SenderMap};
use regwatch_core::SendError;
use regwatch_core::config::RoutingConfig;
use regwatch_core::traits::ComplianceStore;
use regwatch_core::types::{
    Channel, DeliveryLog, DeliveryStatus, EventKind, NotificationEvent, ProviderReceipt, Recipient,
};
use std::sync::Arc;
use std::time::Duration;

use crate::composer;
use crate::recipients::RecipientResolver;
use crate::summary::{EventOutcome, EventStatus};

pub struct Dispatcher {
    store: Arc<dyn ComplianceStore>,
    recipients: RecipientResolver,
    senders: SenderMap,
    routing: RoutingConfig,
    send_interval: Duration,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn ComplianceStore>,
        senders: SenderMap,
        routing: RoutingConfig,
        send_interval: Duration,
    ) -> Self {
        Self {
            recipients: RecipientResolver::new(store.clone()),
            store,
            senders,
            routing,
            send_interval,
        }
    }

    /// Dispatch every event in order. Events do not share a throttle.
    pub async fn dispatch_all(&self, events: &[NotificationEvent], today: NaiveDate) -> Vec<EventOutcome> {
        let mut outcomes = Vec::with_capacity(events.len());
        for event in events {
            outcomes.push(self.dispatch(event, today).await);
        }
        outcomes
    }

    pub async fn dispatch(&self, event: &NotificationEvent, today: NaiveDate) -> EventOutcome {
        let event_ref = event.event_ref();
        let unit_id = event.unit_id().to_string();
        let mut outcome = EventOutcome::new(event_ref.clone(), unit_id.clone());

        // Resolve every routed channel first so the "no recipients" decision
        // sees the whole event.
        let mut targets: Vec<(Channel, Recipient)> = Vec::new();
        for &channel in self.routing.channels_for(event.kind) {
            match self.recipients.resolve(&unit_id, channel).await {
                Ok(list) => targets.extend(list.into_iter().map(|r| (channel, r))),
                Err(e) => {
                    tracing::warn!("{} {}: recipient lookup on {channel} failed: {e}", event_ref.kind, event_ref.source_id);
                    outcome.errors.push(format!("{channel} recipients: {e}"));
                }
            }
        }
        outcome.recipients = targets.len();

        if targets.is_empty() {
            outcome.status = if outcome.errors.is_empty() {
                tracing::info!("{} {}: no recipients in unit {unit_id}", event_ref.kind, event_ref.source_id);
                EventStatus::NoRecipients
            } else {
                EventStatus::Failed
            };
            return outcome;
        }

        let mut throttle = SendThrottle::new(self.send_interval);
        for (channel, recipient) in &targets {
            throttle.acquire().await;
            let content = composer::compose(event, recipient, *channel, today);
            let result = self.send(*channel, &recipient.address, &content).await;
            outcome.attempts += 1;

            let log = match result {
                Ok(receipt) => {
                    outcome.delivered += 1;
                    tracing::info!(
                        "{} {} → {channel} {} delivered",
                        event_ref.kind, event_ref.source_id, recipient.user_id
                    );
                    self.log_row(event, *channel, recipient, Ok(receipt))
                }
                Err(e) => {
                    outcome.failed += 1;
                    tracing::warn!(
                        "{} {} → {channel} {} failed: {e}",
                        event_ref.kind, event_ref.source_id, recipient.user_id
                    );
                    self.log_row(event, *channel, recipient, Err(e))
                }
            };

            if let Err(e) = self.store.record_delivery(&log).await {
                tracing::warn!("Could not record delivery {}: {e}", log.id);
                outcome.errors.push(format!("delivery log: {e}"));
            }
        }

        outcome.status = if outcome.delivered > 0 { EventStatus::Sent } else { EventStatus::Failed };

        if event.kind == EventKind::DueReminder && outcome.delivered > 0 {
            if let Some(reminder) = &event.reminder {
                match self.store.mark_reminder_sent(&reminder.id).await {
                    Ok(()) => outcome.marked_sent = true,
                    Err(e) => {
                        tracing::warn!("Could not mark reminder {} sent: {e}", reminder.id);
                        outcome.errors.push(format!("mark sent: {e}"));
                    }
                }
            }
        }

        outcome
    }

    async fn send(
        &self,
        channel: Channel,
        address: &str,
        content: &regwatch_core::types::MessageContent,
    ) -> Result<ProviderReceipt, SendError> {
        match self.senders.get(&channel) {
            Some(sender) => sender.send(address, content).await,
            None => Err(SendError::NotConfigured(channel.to_string())),
        }
    }

    fn log_row(
        &self,
        event: &NotificationEvent,
        channel: Channel,
        recipient: &Recipient,
        result: Result<ProviderReceipt, SendError>,
    ) -> DeliveryLog {
        let (status, error, provider_message_id) = match result {
            Ok(receipt) => (DeliveryStatus::Sent, None, receipt.provider_message_id),
            Err(e) => (DeliveryStatus::Failed, Some(e.to_string()), None),
        };
        DeliveryLog {
            id: uuid::Uuid::new_v4().to_string(),
            event: event.event_ref(),
            channel,
            recipient: recipient.address.clone(),
            status,
            error,
            provider_message_id,
            created_at: Utc::now(),
        }
    }
}
