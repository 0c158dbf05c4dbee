//! Shared fixtures for dispatch integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use regwatch_channels::SenderMap;
use regwatch_core::error::{RegWatchError, Result};
use regwatch_core::traits::{ChannelSender, ComplianceStore};
use regwatch_core::types::{
    Channel, ComplianceParameter, DeliveryLog, DueReminder, Member, MessageContent,
    ProviderReceipt, Reminder, Subscription,
};
use regwatch_core::{FixedClock, RegWatchConfig, SendError};
use regwatch_dispatch::RunCoordinator;
use regwatch_store::SqliteStore;

/// 09:00 IST on 2026-03-10.
pub fn run_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 3, 30, 0).unwrap()
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

pub fn day(offset: i64) -> NaiveDate {
    today() + chrono::TimeDelta::days(offset)
}

pub fn parameter(id: &str, unit: &str, category: &str, expiry: NaiveDate) -> ComplianceParameter {
    ComplianceParameter {
        id: id.into(),
        unit_id: unit.into(),
        category: category.into(),
        description: format!("{id} document"),
        issue_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        expiry_date: expiry,
    }
}

pub fn reminder(id: &str, parameter: &ComplianceParameter, scheduled: NaiveDate, sent: bool) -> Reminder {
    Reminder {
        id: id.into(),
        parameter_id: parameter.id.clone(),
        unit_id: parameter.unit_id.clone(),
        scheduled_date: scheduled,
        scheduled_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        message: None,
        sent,
    }
}

pub fn member(user: &str, unit: &str, email: Option<&str>) -> Member {
    Member {
        user_id: user.into(),
        unit_id: unit.into(),
        full_name: Some(format!("{user} name")),
        email: email.map(String::from),
    }
}

pub fn subscription(user: &str, unit: &str, channel: Channel, subscribed: bool, address: Option<&str>) -> Subscription {
    Subscription {
        user_id: user.into(),
        unit_id: unit.into(),
        channel,
        is_subscribed: subscribed,
        address: address.map(String::from),
        subscribed_at: None,
        unsubscribed_at: None,
    }
}

/// One captured send.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub address: String,
    pub content: MessageContent,
}

/// Fake provider that records every call and rejects configured addresses.
pub struct RecordingSender {
    channel: Channel,
    failing: HashSet<String>,
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingSender {
    pub fn new(channel: Channel) -> Arc<Self> {
        Self::failing_for(channel, &[])
    }

    pub fn failing_for(channel: Channel, addresses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            channel,
            failing: addresses.iter().map(|a| a.to_string()).collect(),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.calls().into_iter().map(|m| m.address).collect()
    }
}

#[async_trait]
impl ChannelSender for RecordingSender {
    fn channel(&self) -> Channel {
        self.channel
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn send(&self, address: &str, content: &MessageContent) -> std::result::Result<ProviderReceipt, SendError> {
        let n = {
            let mut sent = self.sent.lock().unwrap();
            sent.push(SentMessage { address: address.to_string(), content: content.clone() });
            sent.len()
        };
        if self.failing.contains(address) {
            return Err(SendError::Rejected { status: 500, body: "provider down".into() });
        }
        Ok(ProviderReceipt {
            channel: self.channel,
            provider_message_id: Some(format!("{}-{n}", self.channel)),
        })
    }
}

/// SQLite store with switchable failures on selected operations.
pub struct FlakyStore {
    pub inner: SqliteStore,
    pub fail_ping: AtomicBool,
    pub fail_upcoming: AtomicBool,
    pub fail_members: AtomicBool,
    pub fail_record_delivery: AtomicBool,
    /// Reminder ids whose deletion fails.
    pub fail_delete: Mutex<HashSet<String>>,
}

impl FlakyStore {
    pub fn new(inner: SqliteStore) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_ping: AtomicBool::new(false),
            fail_upcoming: AtomicBool::new(false),
            fail_members: AtomicBool::new(false),
            fail_record_delivery: AtomicBool::new(false),
            fail_delete: Mutex::new(HashSet::new()),
        })
    }

    pub fn fail_delete_of(&self, reminder_id: &str) {
        self.fail_delete.lock().unwrap().insert(reminder_id.to_string());
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(RegWatchError::query(format!("injected {what} failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl ComplianceStore for FlakyStore {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn ping(&self) -> Result<()> {
        if self.fail_ping.load(Ordering::SeqCst) {
            return Err(RegWatchError::StoreUnavailable("connection refused".into()));
        }
        self.inner.ping().await
    }

    async fn reminders_scheduled_on(&self, date: NaiveDate, include_sent: bool) -> Result<Vec<DueReminder>> {
        self.inner.reminders_scheduled_on(date, include_sent).await
    }

    async fn parameters_expiring_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ComplianceParameter>> {
        Self::check(&self.fail_upcoming, "upcoming")?;
        self.inner.parameters_expiring_between(from, to).await
    }

    async fn parameters_expired_before(&self, date: NaiveDate) -> Result<Vec<ComplianceParameter>> {
        self.inner.parameters_expired_before(date).await
    }

    async fn unit_members(&self, unit_id: &str) -> Result<Vec<Member>> {
        Self::check(&self.fail_members, "members")?;
        self.inner.unit_members(unit_id).await
    }

    async fn subscription(&self, user_id: &str, unit_id: &str, channel: Channel) -> Result<Option<Subscription>> {
        self.inner.subscription(user_id, unit_id, channel).await
    }

    async fn record_delivery(&self, log: &DeliveryLog) -> Result<()> {
        Self::check(&self.fail_record_delivery, "delivery log")?;
        self.inner.record_delivery(log).await
    }

    async fn mark_reminder_sent(&self, reminder_id: &str) -> Result<()> {
        self.inner.mark_reminder_sent(reminder_id).await
    }

    async fn reminders_with_expired_parameter(&self, date: NaiveDate) -> Result<Vec<String>> {
        self.inner.reminders_with_expired_parameter(date).await
    }

    async fn reminders_scheduled_before(&self, date: NaiveDate) -> Result<Vec<String>> {
        self.inner.reminders_scheduled_before(date).await
    }

    async fn delete_reminder(&self, reminder_id: &str) -> Result<()> {
        if self.fail_delete.lock().unwrap().contains(reminder_id) {
            return Err(RegWatchError::query(format!("injected delete failure for {reminder_id}")));
        }
        self.inner.delete_reminder(reminder_id).await
    }

    async fn recent_deliveries(&self, limit: usize) -> Result<Vec<DeliveryLog>> {
        self.inner.recent_deliveries(limit).await
    }
}

/// Config with no send gap so tests do not sleep.
pub fn test_config() -> RegWatchConfig {
    let mut config = RegWatchConfig::default();
    config.dispatch.send_interval_ms = 0;
    config
}

pub struct Harness {
    pub store: Arc<FlakyStore>,
    pub email: Arc<RecordingSender>,
    pub whatsapp: Arc<RecordingSender>,
    pub coordinator: RunCoordinator,
}

impl Harness {
    pub fn new(store: SqliteStore) -> Self {
        Self::with_senders(store, RecordingSender::new(Channel::Email), RecordingSender::new(Channel::WhatsApp))
    }

    pub fn with_senders(store: SqliteStore, email: Arc<RecordingSender>, whatsapp: Arc<RecordingSender>) -> Self {
        let store = FlakyStore::new(store);
        let mut senders = SenderMap::new();
        senders.insert(Channel::Email, email.clone() as Arc<dyn ChannelSender>);
        senders.insert(Channel::WhatsApp, whatsapp.clone() as Arc<dyn ChannelSender>);
        let coordinator = RunCoordinator::new(test_config(), store.clone(), senders)
            .with_clock(Arc::new(FixedClock(run_instant())));
        Self { store, email, whatsapp, coordinator }
    }

    pub async fn deliveries(&self) -> Vec<DeliveryLog> {
        self.store.inner.recent_deliveries(1000).await.unwrap()
    }

    pub fn total_sends(&self) -> usize {
        self.email.calls().len() + self.whatsapp.calls().len()
    }
}
