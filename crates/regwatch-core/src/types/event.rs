//! Notification events produced by eligibility resolution.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::parameter::ComplianceParameter;
use super::reminder::{DueReminder, Reminder};

/// The three disjoint event sets of one run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DueReminder,
    UpcomingExpiry,
    Overdue,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::DueReminder => "due_reminder",
            EventKind::UpcomingExpiry => "upcoming_expiry",
            EventKind::Overdue => "overdue",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "due_reminder" => Some(EventKind::DueReminder),
            "upcoming_expiry" => Some(EventKind::UpcomingExpiry),
            "overdue" => Some(EventKind::Overdue),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points a delivery back at the row that caused it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRef {
    pub kind: EventKind,
    /// Reminder id for due reminders, parameter id otherwise.
    pub source_id: String,
}

/// One eligible notification, scoped to the parameter's unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationEvent {
    pub kind: EventKind,
    pub parameter: ComplianceParameter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder: Option<Reminder>,
}

impl NotificationEvent {
    pub fn due_reminder(due: DueReminder) -> Self {
        Self {
            kind: EventKind::DueReminder,
            parameter: due.parameter,
            reminder: Some(due.reminder),
        }
    }

    pub fn upcoming(parameter: ComplianceParameter) -> Self {
        Self { kind: EventKind::UpcomingExpiry, parameter, reminder: None }
    }

    pub fn overdue(parameter: ComplianceParameter) -> Self {
        Self { kind: EventKind::Overdue, parameter, reminder: None }
    }

    pub fn unit_id(&self) -> &str {
        match &self.reminder {
            Some(r) => &r.unit_id,
            None => &self.parameter.unit_id,
        }
    }

    pub fn event_ref(&self) -> EventRef {
        let source_id = match &self.reminder {
            Some(r) => r.id.clone(),
            None => self.parameter.id.clone(),
        };
        EventRef { kind: self.kind, source_id }
    }

    pub fn days_until_expiry(&self, today: NaiveDate) -> i64 {
        self.parameter.days_until_expiry(today)
    }
}
