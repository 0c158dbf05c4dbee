//! Structured run summary returned to the trigger.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use regwatch_core::types::{EventKind, EventRef};

use crate::trigger::TriggerSource;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// At least one recipient accepted the message.
    Sent,
    /// Recipients existed (or could not be resolved) but nothing was delivered.
    Failed,
    /// Nobody to notify. Not an error.
    NoRecipients,
}

/// Result of dispatching one event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventOutcome {
    pub event: EventRef,
    pub unit_id: String,
    pub status: EventStatus,
    pub recipients: usize,
    pub attempts: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Whether the reminder's `sent` flag was set by this run.
    pub marked_sent: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl EventOutcome {
    pub fn new(event: EventRef, unit_id: impl Into<String>) -> Self {
        Self {
            event,
            unit_id: unit_id.into(),
            status: EventStatus::NoRecipients,
            recipients: 0,
            attempts: 0,
            delivered: 0,
            failed: 0,
            marked_sent: false,
            errors: Vec::new(),
        }
    }
}

/// Counters for one event set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetSummary {
    /// Events handled.
    pub processed: usize,
    /// Events with at least one delivery.
    pub sent: usize,
    /// Events with no delivery despite recipients or errors.
    pub failed: usize,
    pub no_recipients: usize,
    /// Individual send attempts.
    pub attempts: usize,
    /// Failed sends plus per-event query errors.
    pub errors: usize,
}

impl SetSummary {
    pub fn record(&mut self, outcome: &EventOutcome) {
        self.processed += 1;
        match outcome.status {
            EventStatus::Sent => self.sent += 1,
            EventStatus::Failed => self.failed += 1,
            EventStatus::NoRecipients => self.no_recipients += 1,
        }
        self.attempts += outcome.attempts;
        self.errors += outcome.failed + outcome.errors.len();
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CleanupSummary {
    pub expired_parameter_deleted: usize,
    pub stale_deleted: usize,
    pub errors: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_details: Vec<String>,
}

impl CleanupSummary {
    pub fn deleted(&self) -> usize {
        self.expired_parameter_deleted + self.stale_deleted
    }

    pub(crate) fn error(&mut self, detail: String) {
        self.errors += 1;
        self.error_details.push(detail);
    }
}

/// An event set whose query failed; its events were not dispatched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AbortedSet {
    pub set: EventKind,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    pub reference_date: NaiveDate,
    pub source: TriggerSource,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub due_reminders: SetSummary,
    pub upcoming_expiry: SetSummary,
    pub overdue: SetSummary,
    pub cleanup: CleanupSummary,
    pub aborted_sets: Vec<AbortedSet>,
    pub events: Vec<EventOutcome>,
}

impl RunSummary {
    pub fn new(reference_date: NaiveDate, source: TriggerSource, started_at: DateTime<Utc>) -> Self {
        Self {
            reference_date,
            source,
            started_at,
            finished_at: started_at,
            due_reminders: SetSummary::default(),
            upcoming_expiry: SetSummary::default(),
            overdue: SetSummary::default(),
            cleanup: CleanupSummary::default(),
            aborted_sets: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn set_mut(&mut self, kind: EventKind) -> &mut SetSummary {
        match kind {
            EventKind::DueReminder => &mut self.due_reminders,
            EventKind::UpcomingExpiry => &mut self.upcoming_expiry,
            EventKind::Overdue => &mut self.overdue,
        }
    }

    pub fn record(&mut self, outcome: EventOutcome) {
        self.set_mut(outcome.event.kind).record(&outcome);
        self.events.push(outcome);
    }

    pub fn total_attempts(&self) -> usize {
        self.due_reminders.attempts + self.upcoming_expiry.attempts + self.overdue.attempts
    }

    /// True when anything at all went wrong during the run.
    pub fn is_degraded(&self) -> bool {
        !self.aborted_sets.is_empty()
            || self.cleanup.errors > 0
            || [&self.due_reminders, &self.upcoming_expiry, &self.overdue]
                .iter()
                .any(|s| s.errors > 0)
    }
}
