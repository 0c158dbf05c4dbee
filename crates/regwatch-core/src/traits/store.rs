//! Data-store trait: the query/command surface the engine consumes.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::types::{Channel, ComplianceParameter, DeliveryLog, DueReminder, Member, Subscription};

/// Reads and writes the engine needs from the relational store.
///
/// Record-keeping CRUD lives elsewhere; this is only what dispatch,
/// retention and audit touch.
#[async_trait]
pub trait ComplianceStore: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap round-trip used to detect a totally unreachable store.
    async fn ping(&self) -> Result<()>;

    /// Reminders scheduled on `date`, joined with their parameter.
    /// With `include_sent == false`, rows already marked sent are skipped.
    async fn reminders_scheduled_on(&self, date: NaiveDate, include_sent: bool) -> Result<Vec<DueReminder>>;

    /// Parameters whose expiry date lies in `[from, to]` inclusive.
    async fn parameters_expiring_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<ComplianceParameter>>;

    /// Parameters whose expiry date is strictly before `date`.
    async fn parameters_expired_before(&self, date: NaiveDate) -> Result<Vec<ComplianceParameter>>;

    /// Members of a unit, in stable order.
    async fn unit_members(&self, unit_id: &str) -> Result<Vec<Member>>;

    /// The member's subscription row for `channel`, if one exists.
    async fn subscription(&self, user_id: &str, unit_id: &str, channel: Channel) -> Result<Option<Subscription>>;

    /// Append one delivery attempt.
    async fn record_delivery(&self, log: &DeliveryLog) -> Result<()>;

    /// Set `sent = true` on a reminder.
    async fn mark_reminder_sent(&self, reminder_id: &str) -> Result<()>;

    /// Ids of reminders whose parameter expired before `date`.
    async fn reminders_with_expired_parameter(&self, date: NaiveDate) -> Result<Vec<String>>;

    /// Ids of reminders scheduled strictly before `date`.
    async fn reminders_scheduled_before(&self, date: NaiveDate) -> Result<Vec<String>>;

    async fn delete_reminder(&self, reminder_id: &str) -> Result<()>;

    /// Most recent delivery rows, newest first. Audit only.
    async fn recent_deliveries(&self, limit: usize) -> Result<Vec<DeliveryLog>>;
}
